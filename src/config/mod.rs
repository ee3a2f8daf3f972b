//! Plugin configuration loading.
//!
//! The CI platform hands the plugin a document of the form
//!
//! ```json
//! { "workspace": { "path": "/drone/src" }, "vargs": { "username": "...", "artifacts": [] } }
//! ```
//!
//! either on stdin or in a file. A bare settings document (the `vargs` object
//! on its own) is accepted as well. The result is an immutable [`Session`]
//! that is passed by reference to every upload component.

use crate::artifact::UploadTarget;
use crate::error::{ConfigError, Result};
use crate::transport::TransportKind;
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Service endpoint used when `host` is not configured.
pub const DEFAULT_HOST: &str = "https://api.bintray.com";

/// Encoding of the plugin document.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DocumentFormat {
    /// JSON (what CI platforms pass on stdin)
    #[default]
    Json,
    /// TOML, for documents kept in the repository
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Where to read the plugin document from, plus command line overrides.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Plugin document path; stdin when `None` or `-`
    pub config: Option<PathBuf>,
    /// Workspace root overriding `workspace.path`
    pub workspace: Option<PathBuf>,
    /// Force debug output on
    pub debug: bool,
}

/// Settings as written in the plugin document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionSettings {
    username: String,
    api_key: String,
    branch: Option<String>,
    host: Option<String>,
    debug: bool,
    insecure: bool,
    transport: TransportKind,
    ca_bundle: Option<PathBuf>,
    artifacts: Vec<UploadTarget>,
}

/// Immutable settings for one plugin run.
#[derive(Clone)]
pub struct Session {
    /// Account used for basic authentication
    pub username: String,
    api_key: String,
    /// Branch being built; `None` publishes to the production channel
    pub branch: Option<String>,
    /// Service base URL without trailing slash
    pub host: String,
    /// Skip certificate verification
    pub insecure: bool,
    /// Verbose diagnostic output
    pub debug: bool,
    /// How requests are sent
    pub transport: TransportKind,
    /// Supplementary CA bundle overriding the system location
    pub ca_bundle: Option<PathBuf>,
    /// Artifacts in upload order
    pub artifacts: Vec<UploadTarget>,
    /// Directory artifact paths are relative to
    pub workspace_root: PathBuf,
}

impl Session {
    fn from_settings(settings: SessionSettings, workspace_root: PathBuf) -> Result<Self> {
        if settings.username.is_empty() {
            return Err(ConfigError::MissingSetting { setting: "username" }.into());
        }
        if settings.api_key.is_empty() {
            return Err(ConfigError::MissingSetting { setting: "api_key" }.into());
        }

        let host = normalize_host(settings.host.as_deref())?;
        let branch = settings.branch.filter(|branch| !branch.is_empty());

        Ok(Self {
            username: settings.username,
            api_key: settings.api_key,
            branch,
            host,
            insecure: settings.insecure,
            debug: settings.debug,
            transport: settings.transport,
            ca_bundle: settings.ca_bundle,
            artifacts: settings.artifacts,
            workspace_root,
        })
    }

    /// API key for basic authentication. Never print this.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Local path of an artifact's file.
    pub fn source_path(&self, target: &UploadTarget) -> PathBuf {
        self.workspace_root
            .join(target.file.trim_start_matches('/'))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("api_key", &"******")
            .field("branch", &self.branch)
            .field("host", &self.host)
            .field("insecure", &self.insecure)
            .field("debug", &self.debug)
            .field("transport", &self.transport)
            .field("ca_bundle", &self.ca_bundle)
            .field("artifacts", &self.artifacts)
            .field("workspace_root", &self.workspace_root)
            .finish()
    }
}

/// Trim the trailing slash and check the host is an http(s) URL.
fn normalize_host(host: Option<&str>) -> Result<String> {
    let host = match host.map(str::trim) {
        Some(host) if !host.is_empty() => host.trim_end_matches('/'),
        _ => DEFAULT_HOST,
    };

    let parsed = url::Url::parse(host).map_err(|e| ConfigError::InvalidHost {
        host: host.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidHost {
            host: host.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        }
        .into());
    }

    Ok(host.to_string())
}

/// Parse a plugin document into a [`Session`].
///
/// `workspace` overrides the document's `workspace.path`; when neither is
/// present the current directory is the workspace root.
pub fn parse(text: &str, format: DocumentFormat, workspace: Option<PathBuf>) -> Result<Session> {
    let document: serde_json::Value = match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(ConfigError::from)?,
        DocumentFormat::Toml => toml::from_str(text).map_err(ConfigError::from)?,
    };

    let (document_workspace, settings) = split_document(document);
    let settings: SessionSettings =
        serde_json::from_value(settings).map_err(ConfigError::from)?;

    let workspace_root = workspace
        .or(document_workspace)
        .unwrap_or_else(|| PathBuf::from("."));
    log::debug!("workspace root: {}", workspace_root.display());

    Session::from_settings(settings, workspace_root)
}

/// Separate `workspace.path` from the settings object.
fn split_document(mut document: serde_json::Value) -> (Option<PathBuf>, serde_json::Value) {
    let workspace = document
        .get("workspace")
        .and_then(|workspace| workspace.get("path"))
        .and_then(serde_json::Value::as_str)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);

    let settings = document
        .as_object_mut()
        .and_then(|object| object.remove("vargs"))
        .unwrap_or(document);

    (workspace, settings)
}

/// Read and parse the plugin document described by `options`.
pub fn load(options: &LoadOptions) -> Result<Session> {
    let (text, format) = match options.config.as_deref() {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            (text, DocumentFormat::from_path(path))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| ConfigError::Read {
                    path: PathBuf::from("-"),
                    source,
                })?;
            (text, DocumentFormat::Json)
        }
    };

    let mut session = parse(&text, format, options.workspace.clone())?;
    session.debug |= options.debug;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::PackageType;

    const PLUGIN_DOCUMENT: &str = r#"{
        "workspace": { "path": "/drone/src/github.com/acme/app" },
        "vargs": {
            "username": "ci-bot",
            "api_key": "s3cr3t",
            "branch": "master",
            "artifacts": [
                { "file": "dist/app.deb", "type": "Debian", "owner": "acme", "repository": "deb",
                  "package": "app", "target": "app_1.0.deb", "version": 1.0,
                  "distr": "trusty", "component": "main", "arch": ["amd64"], "publish": true }
            ]
        }
    }"#;

    #[test]
    fn test_parse_plugin_document() {
        let session = parse(PLUGIN_DOCUMENT, DocumentFormat::Json, None).unwrap();
        assert_eq!(session.username, "ci-bot");
        assert_eq!(session.api_key(), "s3cr3t");
        assert_eq!(session.host, DEFAULT_HOST);
        assert_eq!(session.branch.as_deref(), Some("master"));
        assert_eq!(
            session.workspace_root,
            PathBuf::from("/drone/src/github.com/acme/app")
        );
        assert_eq!(session.transport, TransportKind::Http);

        let artifact = &session.artifacts[0];
        assert_eq!(artifact.package_type, PackageType::Debian);
        assert_eq!(artifact.version, "1.0");
        assert!(artifact.publish);
        assert!(!artifact.override_existing);
    }

    #[test]
    fn test_workspace_override_wins() {
        let session = parse(
            PLUGIN_DOCUMENT,
            DocumentFormat::Json,
            Some(PathBuf::from("/tmp/ws")),
        )
        .unwrap();
        assert_eq!(session.workspace_root, PathBuf::from("/tmp/ws"));
    }

    #[test]
    fn test_bare_settings_document() {
        let text = r#"{ "username": "u", "api_key": "k", "host": "https://bintray.internal/api/", "branch": "" }"#;
        let session = parse(text, DocumentFormat::Json, None).unwrap();
        assert_eq!(session.host, "https://bintray.internal/api");
        assert_eq!(session.branch, None);
        assert_eq!(session.workspace_root, PathBuf::from("."));
        assert!(session.artifacts.is_empty());
    }

    #[test]
    fn test_toml_document() {
        let text = r#"
            username = "u"
            api_key = "k"
            insecure = true
            transport = "curl"

            [[artifacts]]
            file = "target/app.jar"
            type = "Maven"
            owner = "acme"
            repository = "maven"
            package = "app"
            target = "com/acme/app/1.0/app-1.0.jar"
        "#;
        let session = parse(text, DocumentFormat::Toml, None).unwrap();
        assert!(session.insecure);
        assert_eq!(session.transport, TransportKind::Curl);
        assert_eq!(session.artifacts[0].package_type, PackageType::Maven);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = parse(r#"{ "username": "u" }"#, DocumentFormat::Json, None).unwrap_err();
        assert!(err.to_string().contains("api_key"));

        let err = parse(r#"{ "api_key": "k" }"#, DocumentFormat::Json, None).unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let text = r#"{ "username": "u", "api_key": "k", "host": "ftp://example.com" }"#;
        let err = parse(text, DocumentFormat::Json, None).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));

        let text = r#"{ "username": "u", "api_key": "k", "host": "not a url" }"#;
        assert!(parse(text, DocumentFormat::Json, None).is_err());
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let err = parse("{ not json", DocumentFormat::Json, None).unwrap_err();
        assert!(matches!(err, crate::UploadError::Config(ConfigError::Json(_))));
    }

    #[test]
    fn test_debug_output_masks_api_key() {
        let session = parse(PLUGIN_DOCUMENT, DocumentFormat::Json, None).unwrap();
        let printed = format!("{:?} {:#?}", session, session);
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("******"));
    }

    #[test]
    fn test_source_path_is_under_workspace() {
        let session = parse(PLUGIN_DOCUMENT, DocumentFormat::Json, None).unwrap();
        let mut artifact = session.artifacts[0].clone();
        assert_eq!(
            session.source_path(&artifact),
            PathBuf::from("/drone/src/github.com/acme/app/dist/app.deb")
        );
        artifact.file = "/dist/app.deb".to_string();
        assert_eq!(
            session.source_path(&artifact),
            PathBuf::from("/drone/src/github.com/acme/app/dist/app.deb")
        );
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("ci.toml")), DocumentFormat::Toml);
        assert_eq!(DocumentFormat::from_path(Path::new("ci.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("-")), DocumentFormat::Json);
    }
}
