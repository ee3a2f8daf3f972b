//! The upload run loop.
//!
//! Artifacts are processed strictly in order. Each goes through
//! `Pending -> Validated -> Requested -> Succeeded | Failed`, and the first
//! failure ends the run: no later artifact is attempted.

use crate::artifact::UploadTarget;
use crate::cli::OutputManager;
use crate::config::Session;
use crate::endpoint::is_default_branch;
use crate::error::{Result, UploadError};
use crate::request::UploadRequest;
use crate::response;
use crate::transport::Transport;

/// Progress of one artifact through the upload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UploadState {
    /// Not yet looked at
    Pending,
    /// Required fields present
    Validated,
    /// Request handed to the transport
    Requested,
    /// Service accepted the upload
    Succeeded,
    /// Upload failed; the run stops here
    Failed,
}

/// Outcome of one successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// 1-based position in the artifact list
    pub index: usize,
    /// URL the file was uploaded to
    pub url: String,
    /// Message returned by the service
    pub message: String,
}

/// Uploads the artifacts of one session.
pub struct Uploader<'a, T: Transport> {
    session: &'a Session,
    transport: T,
    output: &'a OutputManager,
}

impl<'a, T: Transport> Uploader<'a, T> {
    /// Create an uploader over `transport`.
    pub fn new(session: &'a Session, transport: T, output: &'a OutputManager) -> Self {
        Self {
            session,
            transport,
            output,
        }
    }

    /// Upload every artifact in order, stopping at the first failure.
    pub async fn run(&self) -> Result<Vec<UploadReport>> {
        let count = self.session.artifacts.len();
        match self.session.branch.as_deref() {
            branch if is_default_branch(branch) => self.output.println(&format!(
                "\nPublishing {} artifacts to Bintray for user {}",
                count, self.session.username
            )),
            branch => self.output.println(&format!(
                "\nPublishing {} artifacts on branch {} to Bintray for user {}",
                count,
                branch.unwrap_or_default(),
                self.session.username
            )),
        }

        let mut reports = Vec::with_capacity(count);
        for (position, target) in self.session.artifacts.iter().enumerate() {
            reports.push(self.upload(position + 1, target).await?);
        }

        log::info!("uploaded {} artifact(s)", reports.len());
        Ok(reports)
    }

    /// Upload a single artifact.
    pub async fn upload(&self, index: usize, target: &UploadTarget) -> Result<UploadReport> {
        let mut state = UploadState::Pending;
        let mut advance = |next: UploadState| {
            log::debug!("artifact {}: {:?} -> {:?}", index, state, next);
            state = next;
        };

        if let Err(e) = target.validate() {
            advance(UploadState::Failed);
            return Err(e.into());
        }
        advance(UploadState::Validated);

        let request = UploadRequest::build(target, self.session);
        self.output.println(&format!(
            "\nUploading file {} {} to {}",
            index, target.file, request.url
        ));
        if self.session.debug {
            self.dump_request("DEBUG HTTP Request", &request);
        }

        advance(UploadState::Requested);
        let outcome = match self.transport.send(&request).await {
            Ok(raw) => response::interpret(&raw, request.override_requested)
                .map_err(UploadError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(message) => {
                advance(UploadState::Succeeded);
                self.output.println(&format!("Result: {}", message));
                Ok(UploadReport {
                    index,
                    url: request.url,
                    message,
                })
            }
            Err(e) => {
                advance(UploadState::Failed);
                match &e {
                    UploadError::Service(failure) if failure.is_unexpected_message() => {
                        self.output.println(&format!(
                            "Result: {}",
                            failure.message.as_deref().unwrap_or_default()
                        ));
                        self.dump_request("Request was", &request);
                    }
                    e if e.has_request_context() => {
                        self.output.error(&e.to_string());
                        self.dump_request("Failing request", &request);
                    }
                    _ => {}
                }
                Err(e)
            }
        }
    }

    fn dump_request(&self, prefix: &str, request: &UploadRequest) {
        self.output.println(&format!("{}:", prefix));
        for line in request.dump() {
            self.output.indent(&line);
        }
    }
}
