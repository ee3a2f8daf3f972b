//! Transport delegating to the `curl` command line client.
//!
//! Headers, including the credential, are written to curl's stdin as a config
//! file (`--config -`) so they never show up in the process list.

use super::{RawResponse, Transport, TrustPolicy, open_artifact};
use crate::error::{Result, UploadError};
use crate::request::{USER_AGENT, UploadRequest};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Marker separating the body from the status code in curl's output.
const STATUS_MARKER: &str = "\n__BINTRAY_UPLOAD_STATUS__:";

/// curl exit code for a failed read of a local file.
const READ_ERROR_EXIT: i32 = 26;

/// Uploads by running `curl`.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    program: PathBuf,
    policy: TrustPolicy,
}

impl CurlTransport {
    /// Locate `curl` on `PATH`.
    pub fn new(policy: TrustPolicy) -> Result<Self> {
        let program = which::which("curl").map_err(|e| UploadError::Transport {
            reason: format!("curl not found on PATH: {}", e),
        })?;
        log::debug!("delegating uploads to {}", program.display());
        Ok(Self::with_program(program, policy))
    }

    /// Use a specific curl binary.
    pub fn with_program(program: PathBuf, policy: TrustPolicy) -> Self {
        Self { program, policy }
    }

    /// Command line arguments. Contains no credentials.
    fn args(&self, request: &UploadRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--silent".into(),
            "--show-error".into(),
            "--request".into(),
            "PUT".into(),
            "--upload-file".into(),
            request.file.clone().into(),
            "--config".into(),
            "-".into(),
            "--write-out".into(),
            format!("{}%{{http_code}}", STATUS_MARKER).into(),
        ];

        if self.policy.insecure {
            args.push("--insecure".into());
        } else if let Some(bundle) = self.policy.bundle_path() {
            args.push("--cacert".into());
            args.push(bundle.into());
        }

        args.push(request.url.clone().into());
        args
    }

    /// Config file fed to curl on stdin.
    fn config(&self, request: &UploadRequest) -> Result<String> {
        let mut config = format!("user-agent = \"{}\"\n", quote("User-Agent", USER_AGENT)?);
        config.push_str(&format!(
            "header = \"Authorization: {}\"\n",
            quote("Authorization", request.authorization())?
        ));
        for (name, value) in request.headers() {
            config.push_str(&format!("header = \"{}: {}\"\n", name, quote(name, value)?));
        }
        Ok(config)
    }
}

/// Escape a value for a double-quoted curl config parameter.
///
/// Control characters would end the config line, so they are refused.
fn quote(name: &str, value: &str) -> Result<String> {
    if value.chars().any(char::is_control) {
        return Err(UploadError::Transport {
            reason: format!("Header {} contains control characters", name),
        });
    }
    Ok(value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Split curl's stdout into status code and body.
fn parse_output(stdout: &[u8]) -> Option<RawResponse> {
    let text = String::from_utf8_lossy(stdout);
    let (body, status) = text.rsplit_once(STATUS_MARKER)?;
    let status = status.trim().parse::<u16>().ok()?;
    Some(RawResponse {
        status,
        body: body.as_bytes().to_vec(),
    })
}

impl Transport for CurlTransport {
    async fn send(&self, request: &UploadRequest) -> Result<RawResponse> {
        // curl opens the file itself; check it first so a missing artifact
        // is reported as an IO error, not as a curl failure.
        open_artifact(&request.file).await?;
        let config = self.config(request)?;

        let mut child = Command::new(&self.program)
            .args(self.args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| UploadError::Transport {
                reason: format!("Unable to run {}: {}", self.program.display(), e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(config.as_bytes())
                .await
                .map_err(|e| UploadError::Transport {
                    reason: format!("Unable to pass request to curl: {}", e),
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| UploadError::Transport {
                reason: format!("curl did not complete: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if output.status.code() == Some(READ_ERROR_EXIT) {
                return Err(UploadError::Io {
                    path: request.file.clone(),
                    source: io::Error::other(stderr.trim().to_string()),
                });
            }
            return Err(UploadError::Transport {
                reason: format!("curl exited with {}: {}", output.status, stderr.trim()),
            });
        }

        parse_output(&output.stdout).ok_or_else(|| UploadError::Transport {
            reason: "curl output did not include a status code".to_string(),
        })
    }
}
