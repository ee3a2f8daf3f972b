//! Bintray upload plugin - uploads CI build artifacts to Bintray.
//!
//! Reads the plugin document, uploads each artifact in order and exits
//! non-zero at the first failure.

use bintray_upload::cli;
use bintray_upload::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false, false);
            if !e.has_request_context() {
                output.error(&e.to_string());
            }

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
