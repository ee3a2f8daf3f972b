//! Execution of upload requests.
//!
//! [`Transport`] turns an [`UploadRequest`] into a [`RawResponse`]. Requests go
//! out either through the built-in HTTP client ([`HttpTransport`]) or through
//! the `curl` binary ([`CurlTransport`]). Both make exactly one attempt with no
//! timeout, and both open the artifact file only for the duration of the
//! exchange.

mod curl;
mod http;
mod tls;

pub use curl::CurlTransport;
pub use http::HttpTransport;
pub use tls::{CaBundle, SYSTEM_CA_BUNDLE, TrustPolicy};

use crate::config::Session;
use crate::error::{Result, UploadError};
use crate::request::UploadRequest;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::path::Path;

/// Status and body of a completed exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Full response body
    pub body: Vec<u8>,
}

/// Sends one upload request.
#[allow(async_fn_in_trait)] // only driven from the single-threaded upload loop
pub trait Transport {
    /// Perform the exchange. Fails with `Io` when the artifact cannot be
    /// opened and `Transport` on network or TLS errors.
    async fn send(&self, request: &UploadRequest) -> Result<RawResponse>;
}

/// Which client performs the uploads (`transport` in the settings).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Built-in HTTPS client
    #[default]
    Http,
    /// Delegate to the `curl` command line client
    Curl,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Http => f.write_str("http"),
            TransportKind::Curl => f.write_str("curl"),
        }
    }
}

/// Open the artifact at `path` and return it with its length.
///
/// Anything but a regular file is an `Io` error, so no request is started for
/// a directory or a missing path.
pub(crate) async fn open_artifact(path: &Path) -> Result<(tokio::fs::File, u64)> {
    let io_error = |source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(io_error)?;
    let metadata = file.metadata().await.map_err(io_error)?;
    if !metadata.is_file() {
        return Err(io_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok((file, metadata.len()))
}

/// The transport selected by a session.
#[derive(Debug)]
pub enum SessionTransport {
    /// Built-in HTTPS client
    Http(HttpTransport),
    /// `curl` command line client
    Curl(CurlTransport),
}

impl SessionTransport {
    /// Build the transport configured for `session`, loading its trust policy.
    pub fn for_session(session: &Session) -> Result<Self> {
        let policy = TrustPolicy::load(session)?;
        log::debug!("using {} transport", session.transport);

        match session.transport {
            TransportKind::Http => Ok(SessionTransport::Http(HttpTransport::new(&policy)?)),
            TransportKind::Curl => Ok(SessionTransport::Curl(CurlTransport::new(policy)?)),
        }
    }
}

impl Transport for SessionTransport {
    async fn send(&self, request: &UploadRequest) -> Result<RawResponse> {
        match self {
            SessionTransport::Http(transport) => transport.send(request).await,
            SessionTransport::Curl(transport) => transport.send(request).await,
        }
    }
}
