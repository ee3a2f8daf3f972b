//! Command line interface for bintray_upload.
//!
//! [`run`] is the single place that turns the outcome of an upload run into
//! user-facing diagnostics and a process exit code.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::config;
use crate::error::Result;
use crate::transport::SessionTransport;
use crate::uploader::Uploader;

/// Commit the binary was built from, injected by the release build.
pub const BUILD_COMMIT: &str = match option_env!("BUILD_COMMIT") {
    Some(commit) => commit,
    None => "an unknown commit",
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(&args).await
}

/// Load the session described by `args` and upload its artifacts.
pub async fn execute(args: &Args) -> Result<i32> {
    let banner = OutputManager::new(false, false);
    banner.println(&format!(
        "Bintray upload plugin {} built from {}",
        env!("CARGO_PKG_VERSION"),
        BUILD_COMMIT
    ));

    let session = config::load(&args.load_options())?;
    let output = OutputManager::new(session.debug, false);
    if output.is_verbose() {
        output.verbose(&format!("DEBUG plugin input:\n{:#?}", session));
    }
    if session.artifacts.is_empty() {
        output.warn("No artifacts configured; nothing to upload");
    }

    let transport = SessionTransport::for_session(&session)?;
    let reports = Uploader::new(&session, transport, &output).run().await?;

    output.success(&format!("Uploaded {} artifact(s)", reports.len()));
    Ok(0)
}
