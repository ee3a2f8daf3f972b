//! # Bintray Upload
//!
//! Continuous-integration plugin that uploads build artifacts to Bintray.
//!
//! Each configured artifact is validated, turned into an HTTPS `PUT` with the
//! service's metadata headers, sent, and checked against the service's answer.
//! Artifacts are uploaded strictly in order and the first failure ends the run.
//!
//! ## Features
//!
//! - **Generic, Maven and Debian uploads**: per-type URL layout, required
//!   fields and headers
//! - **Branch channels**: non-default branches publish under `test/{branch}/`
//! - **Trust configuration**: supplementary CA bundle, optional verification bypass
//! - **Two transports**: built-in rustls client or the `curl` binary
//! - **Idempotent re-runs**: files that already exist are not an error
//!   unless an override was requested
//!
//! ## Usage
//!
//! ```bash
//! bintray_upload < plugin.json          # settings from the CI platform
//! bintray_upload --config bintray.toml  # settings from a file
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifact;
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;
pub mod uploader;

// Re-export main types for public API
pub use artifact::{MissingField, PackageType, UploadTarget, ValidationError};
pub use config::{DocumentFormat, LoadOptions, Session};
pub use error::{ConfigError, Result, UploadError};
pub use request::UploadRequest;
pub use response::ServiceFailure;
pub use transport::{
    CurlTransport, HttpTransport, RawResponse, SessionTransport, Transport, TransportKind,
    TrustPolicy,
};
pub use uploader::{UploadReport, UploadState, Uploader};
