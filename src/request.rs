//! Outbound upload request construction.
//!
//! An [`UploadRequest`] is transport-neutral: it carries the URL, the local
//! file to stream and every header, and is turned into a real exchange by a
//! [`Transport`](crate::transport::Transport). The file is not opened here.

use crate::artifact::UploadTarget;
use crate::config::Session;
use crate::endpoint::build_endpoint;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::PathBuf;

/// Replace an already uploaded file (`1`) or keep it (`0`).
pub const OVERRIDE_HEADER: &str = "X-Bintray-Override";
/// Publish the version immediately after the upload.
pub const PUBLISH_HEADER: &str = "X-Bintray-Publish";
/// Debian distribution, e.g. `trusty`.
pub const DEBIAN_DISTRIBUTION_HEADER: &str = "X-Bintray-Debian-Distribution";
/// Debian component, e.g. `main`.
pub const DEBIAN_COMPONENT_HEADER: &str = "X-Bintray-Debian-Component";
/// Comma-separated Debian architectures.
pub const DEBIAN_ARCHITECTURE_HEADER: &str = "X-Bintray-Debian-Architecture";

/// Value printed instead of the real credential.
pub const REDACTED_AUTHORIZATION: &str = "Basic xxxxxxxxxx";

/// User agent sent with every upload.
pub const USER_AGENT: &str = concat!("bintray_upload/", env!("CARGO_PKG_VERSION"));

/// HTTP method used for uploads.
pub const UPLOAD_METHOD: &str = "PUT";

/// A fully assembled upload request.
#[derive(Clone)]
pub struct UploadRequest {
    /// Target URL
    pub url: String,
    /// Local file streamed as the body
    pub file: PathBuf,
    /// Whether the artifact asked to replace existing files
    pub override_requested: bool,
    authorization: String,
    headers: Vec<(&'static str, String)>,
}

impl UploadRequest {
    /// Assemble the request for a validated artifact.
    pub fn build(target: &UploadTarget, session: &Session) -> Self {
        let url = build_endpoint(target, session.branch.as_deref(), &session.host);

        let mut headers = vec![
            (OVERRIDE_HEADER, flag(target.override_existing).to_string()),
            (PUBLISH_HEADER, flag(target.publish).to_string()),
        ];
        headers.extend(target.package_type.headers(target));

        Self {
            url,
            file: session.source_path(target),
            override_requested: target.override_existing,
            authorization: basic_authorization(&session.username, session.api_key()),
            headers,
        }
    }

    /// `Authorization` header value. Only transports may read this.
    pub(crate) fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Service headers in the order they are sent.
    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// Value of a service header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request line and headers for diagnostics, credential redacted.
    pub fn dump(&self) -> Vec<String> {
        let (host, path) = match url::Url::parse(&self.url) {
            Ok(parsed) => {
                let host = match (parsed.host_str(), parsed.port()) {
                    (Some(host), Some(port)) => format!("{}:{}", host, port),
                    (Some(host), None) => host.to_string(),
                    (None, _) => String::new(),
                };
                (host, parsed.path().to_string())
            }
            Err(_) => (String::new(), self.url.clone()),
        };

        let mut lines = vec![format!("{} {} HTTP/1.1", UPLOAD_METHOD, path)];
        if !host.is_empty() {
            lines.push(format!("Host: {}", host));
        }
        lines.push(format!("User-Agent: {}", USER_AGENT));
        lines.push(format!("Authorization: {}", REDACTED_AUTHORIZATION));
        lines.extend(
            self.headers
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value)),
        );
        lines
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("url", &self.url)
            .field("file", &self.file)
            .field("override_requested", &self.override_requested)
            .field("authorization", &REDACTED_AUTHORIZATION)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Serialize a flag the way the service expects it.
pub fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn basic_authorization(username: &str, api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, api_key)))
}
