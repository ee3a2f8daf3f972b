//! TLS trust configuration shared by both transports.
//!
//! Minimal CI images often ship without a usable system trust store, so a
//! supplementary CA bundle is loaded from the conventional location and added
//! to the client's built-in roots.

use crate::config::Session;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Conventional location of the system CA bundle.
pub const SYSTEM_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";

/// PEM bundle read from disk.
#[derive(Debug, Clone)]
pub struct CaBundle {
    /// Where the bundle was read from
    pub path: PathBuf,
    /// PEM contents
    pub pem: Vec<u8>,
}

/// Roots to trust and whether to verify at all.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    /// Supplementary roots, if a bundle was found
    pub bundle: Option<CaBundle>,
    /// Skip certificate and hostname verification entirely
    pub insecure: bool,
}

impl TrustPolicy {
    /// Build the policy for a session.
    ///
    /// An explicitly configured `ca_bundle` must be readable. The system
    /// bundle is optional; without it only the built-in roots are trusted.
    pub fn load(session: &Session) -> Result<Self> {
        let bundle = match &session.ca_bundle {
            Some(path) => Some(read_bundle(path).map_err(|source| ConfigError::CaBundle {
                path: path.clone(),
                source,
            })?),
            None => match read_bundle(Path::new(SYSTEM_CA_BUNDLE)) {
                Ok(bundle) => Some(bundle),
                Err(e) => {
                    log::warn!(
                        "Unable to read {}: {}; using built-in roots only",
                        SYSTEM_CA_BUNDLE,
                        e
                    );
                    None
                }
            },
        };

        if session.insecure {
            log::warn!("TLS certificate verification is disabled");
        }

        Ok(Self {
            bundle,
            insecure: session.insecure,
        })
    }

    /// Path of the loaded bundle, for clients that read it themselves.
    pub fn bundle_path(&self) -> Option<&Path> {
        self.bundle.as_ref().map(|bundle| bundle.path.as_path())
    }

    /// Certificates of the loaded bundle.
    ///
    /// A bundle that does not parse is skipped with a warning rather than
    /// failing the run.
    pub fn certificates(&self) -> Vec<reqwest::Certificate> {
        let Some(bundle) = &self.bundle else {
            return Vec::new();
        };

        match reqwest::Certificate::from_pem_bundle(&bundle.pem) {
            Ok(certificates) => {
                log::debug!(
                    "loaded {} supplementary root(s) from {}",
                    certificates.len(),
                    bundle.path.display()
                );
                certificates
            }
            Err(e) => {
                log::warn!(
                    "Ignoring unparsable CA bundle {}: {}",
                    bundle.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}

fn read_bundle(path: &Path) -> std::io::Result<CaBundle> {
    Ok(CaBundle {
        path: path.to_path_buf(),
        pem: std::fs::read(path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DocumentFormat, parse};

    fn session_with_bundle(bundle: &Path, insecure: bool) -> Session {
        let text = serde_json::json!({
            "username": "u",
            "api_key": "k",
            "insecure": insecure,
            "ca_bundle": bundle,
        })
        .to_string();
        parse(&text, DocumentFormat::Json, None).unwrap()
    }

    #[test]
    fn test_explicit_bundle_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.pem");
        std::fs::write(&path, b"").unwrap();

        let policy = TrustPolicy::load(&session_with_bundle(&path, true)).unwrap();
        assert_eq!(policy.bundle_path(), Some(path.as_path()));
        assert!(policy.insecure);
        assert!(policy.certificates().is_empty());
    }

    #[test]
    fn test_missing_explicit_bundle_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.pem");

        let err = TrustPolicy::load(&session_with_bundle(&path, false)).unwrap_err();
        assert!(err.to_string().contains("absent.pem"));
    }

    #[test]
    fn test_garbage_bundle_is_skipped() {
        let policy = TrustPolicy {
            bundle: Some(CaBundle {
                path: PathBuf::from("/tmp/garbage.pem"),
                pem: b"-----BEGIN CERTIFICATE-----\nnot base64 at all!\n-----END CERTIFICATE-----\n"
                    .to_vec(),
            }),
            insecure: false,
        };
        assert!(policy.certificates().is_empty());
    }

    #[test]
    fn test_default_policy_verifies() {
        let policy = TrustPolicy::default();
        assert!(!policy.insecure);
        assert!(policy.bundle_path().is_none());
    }
}
