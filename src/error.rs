//! Error types for bintray_upload operations.
//!
//! Every fatal condition of a run is a variant of [`UploadError`]. Library code
//! only ever returns these; the CLI layer is the single place that prints them
//! and turns them into a process exit status.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::artifact::ValidationError;
pub use crate::response::ServiceFailure;

/// Result type alias for bintray_upload operations
pub type Result<T> = std::result::Result<T, UploadError>;

/// Main error type for all upload operations
#[derive(Error, Debug)]
pub enum UploadError {
    /// Malformed or incomplete plugin configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Required artifact fields are missing
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The local artifact file could not be opened or read
    #[error("Unable to open input file {}: {source}", path.display())]
    Io {
        /// Path of the artifact file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Network or TLS failure while talking to the service
    #[error("Upload request failed: {reason}")]
    Transport {
        /// Reason for the error
        reason: String,
    },

    /// The service answered, but not with an accepted result
    #[error("{0}")]
    Service(#[from] ServiceFailure),
}

/// Plugin configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The plugin document could not be read
    #[error("Can't read plugin config {}: {source}", path.display())]
    Read {
        /// Source of the document (`-` for stdin)
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The plugin document is not valid JSON or does not match the schema
    #[error("Can't parse plugin config: {0}")]
    Json(#[from] serde_json::Error),

    /// The plugin document is not valid TOML
    #[error("Can't parse plugin config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A session setting that every upload needs is empty
    #[error("Missing required setting: {setting}")]
    MissingSetting {
        /// Setting name as written in the plugin document
        setting: &'static str,
    },

    /// The service host is not an absolute http(s) URL
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost {
        /// Host as configured
        host: String,
        /// Reason for the error
        reason: String,
    },

    /// An explicitly configured CA bundle could not be read
    #[error("Unable to read CA bundle {}: {source}", path.display())]
    CaBundle {
        /// Configured bundle path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            UploadError::Config(ConfigError::MissingSetting { setting }) => vec![format!(
                "Add '{}' to the plugin settings (or the matching secret)",
                setting
            )],
            UploadError::Config(ConfigError::InvalidHost { .. }) => vec![
                "Use an absolute URL such as https://api.bintray.com for 'host'".to_string(),
                "Remove 'host' to use the default service endpoint".to_string(),
            ],
            UploadError::Validation(_) => vec![
                "Fill in every field listed above for the artifact in the plugin settings"
                    .to_string(),
            ],
            UploadError::Io { .. } => vec![
                "Check that the artifact was built before the upload step".to_string(),
                "Artifact paths are relative to the workspace root".to_string(),
            ],
            UploadError::Transport { .. } => vec![
                "Verify the service host is reachable from the CI runner".to_string(),
                "Set 'insecure: true' only if the service uses a self-signed certificate"
                    .to_string(),
            ],
            UploadError::Service(failure) if failure.status == 401 || failure.status == 403 => {
                vec!["Verify the username and API key have publish rights".to_string()]
            }
            UploadError::Service(failure) if failure.is_conflict() => vec![
                "Set 'override: true' to replace an existing file".to_string(),
                "Bump the artifact version to publish a new file".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether the error came out of a request exchange. The uploader prints
    /// these itself, followed by the request that failed.
    pub fn has_request_context(&self) -> bool {
        matches!(self, UploadError::Transport { .. } | UploadError::Service(_))
    }
}
