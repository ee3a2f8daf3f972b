//! Interpretation of service responses.
//!
//! The service answers uploads with `{"message": "success"}` or a plain text
//! body. Whether an answer counts as a successful upload is decided by
//! [`is_accepted`] alone.

use crate::transport::RawResponse;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Message the service sends for a completed upload.
pub const SUCCESS_MESSAGE: &str = "success";

/// Fragment of the message the service sends when the file is already there.
pub const ALREADY_EXISTS_FRAGMENT: &str = "already exists";

/// Status the service uses for an upload that collides with an existing file.
pub const CONFLICT_STATUS: u16 = 409;

#[derive(Debug, Default, Deserialize)]
struct MessageText {
    #[serde(default)]
    message: String,
}

/// An answer from the service that does not count as a successful upload.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub struct ServiceFailure {
    /// HTTP status code
    pub status: u16,
    /// Standard reason phrase for `status`, when there is one
    pub reason: Option<&'static str>,
    /// Message extracted from the body
    pub message: Option<String>,
}

impl ServiceFailure {
    /// Whether the service answered 2xx but with a message that is not
    /// accepted.
    pub fn is_unexpected_message(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Whether the service reported a collision with an existing file.
    pub fn is_conflict(&self) -> bool {
        self.status == CONFLICT_STATUS
            || self
                .message
                .as_deref()
                .is_some_and(|message| message.contains(ALREADY_EXISTS_FRAGMENT))
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}", self.status)?;
        if let Some(reason) = self.reason {
            write!(f, " {}", reason)?;
        }
        if let Some(message) = &self.message {
            write!(f, " - {}", message)?;
        }
        Ok(())
    }
}

/// Status message of a response body.
///
/// Uses the JSON `message` field when present, otherwise the trimmed body
/// text. Returns `None` for an empty body.
pub fn extract_message(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice::<MessageText>(body) {
        Ok(text) if !text.message.is_empty() => Some(text.message),
        _ => {
            let raw = String::from_utf8_lossy(body).trim().to_string();
            (!raw.is_empty()).then_some(raw)
        }
    }
}

/// Acceptance policy for upload answers.
///
/// A 2xx answer with message `success` is accepted. A message saying the
/// file already exists is accepted on 2xx or 409 as long as the upload did not
/// ask to override, so re-running a build does not fail on files it already
/// published.
pub fn is_accepted(status: u16, message: &str, override_requested: bool) -> bool {
    let ok_status = status <= 299;
    if message == SUCCESS_MESSAGE {
        return ok_status;
    }

    !override_requested
        && message.contains(ALREADY_EXISTS_FRAGMENT)
        && (ok_status || status == CONFLICT_STATUS)
}

/// Decide whether `response` completes the upload.
///
/// Returns the service message on success.
pub fn interpret(
    response: &RawResponse,
    override_requested: bool,
) -> Result<String, ServiceFailure> {
    let message = extract_message(&response.body);
    log::debug!(
        "service answered {} with message {:?}",
        response.status,
        message
    );

    match message {
        Some(message) if is_accepted(response.status, &message, override_requested) => {
            Ok(message)
        }
        message => Err(ServiceFailure {
            status: response.status,
            reason: reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|status| status.canonical_reason()),
            message,
        }),
    }
}
