//! Built-in HTTPS transport on reqwest + rustls.

use super::{RawResponse, Transport, TrustPolicy, open_artifact};
use crate::error::{Result, UploadError};
use crate::request::{USER_AGENT, UploadRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderValue};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::ReaderStream;

/// One-time initialization guard for the rustls crypto provider.
static RUSTLS_INITIALIZED: OnceLock<()> = OnceLock::new();

fn install_crypto_provider() {
    RUSTLS_INITIALIZED.get_or_init(|| {
        // Fails only if another provider was installed first, which is fine.
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            log::debug!("rustls crypto provider already installed");
        }
    });
}

/// Reader that keeps the first error of the wrapped reader.
///
/// The body stream is consumed inside reqwest, which reports a failed read as
/// a send error. The recorded error lets the transport report it as `Io`.
struct TrackedReader<R> {
    inner: R,
    failure: Arc<Mutex<Option<io::Error>>>,
}

impl<R> TrackedReader<R> {
    fn new(inner: R) -> (Self, Arc<Mutex<Option<io::Error>>>) {
        let failure = Arc::new(Mutex::new(None));
        (
            Self {
                inner,
                failure: Arc::clone(&failure),
            },
            failure,
        )
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for TrackedReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Err(e)) = &poll {
            if let Ok(mut failure) = this.failure.lock() {
                failure.get_or_insert_with(|| io::Error::new(e.kind(), e.to_string()));
            }
        }
        poll
    }
}

fn take_failure(failure: &Mutex<Option<io::Error>>) -> Option<io::Error> {
    failure.lock().ok().and_then(|mut failure| failure.take())
}

/// Uploads with a reqwest client built once per run.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the client for `policy`.
    pub fn new(policy: &TrustPolicy) -> Result<Self> {
        install_crypto_provider();

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .tls_built_in_root_certs(true)
            .danger_accept_invalid_certs(policy.insecure);
        for certificate in policy.certificates() {
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder.build().map_err(|e| UploadError::Transport {
            reason: format!("Unable to build HTTP client: {}", e),
        })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &UploadRequest) -> Result<RawResponse> {
        let (file, length) = open_artifact(&request.file).await?;
        let (reader, read_failure) = TrackedReader::new(file);

        let mut authorization =
            HeaderValue::from_str(request.authorization()).map_err(|_| UploadError::Transport {
                reason: "Credentials contain characters not allowed in a header".to_string(),
            })?;
        authorization.set_sensitive(true);

        let mut builder = self
            .client
            .put(&request.url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_LENGTH, length);
        for (name, value) in request.headers() {
            builder = builder.header(*name, value.as_str());
        }

        log::debug!("PUT {} ({} bytes)", request.url, length);
        let response = builder
            .body(reqwest::Body::wrap_stream(ReaderStream::new(reader)))
            .send()
            .await
            .map_err(|e| match take_failure(&read_failure) {
                Some(source) => UploadError::Io {
                    path: request.file.clone(),
                    source,
                },
                None => UploadError::Transport {
                    reason: error_chain(&e),
                },
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| UploadError::Transport {
            reason: format!("Unable to read request response: {}", error_chain(&e)),
        })?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Render an error with all of its causes, `outer: inner: root`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
