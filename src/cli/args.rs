//! Command line argument parsing.
//!
//! The plugin is normally started by the CI platform with its settings on
//! stdin, so every argument is optional.

use crate::config::LoadOptions;
use clap::Parser;
use std::path::PathBuf;

/// Upload build artifacts to Bintray
#[derive(Parser, Debug, Default)]
#[command(
    name = "bintray_upload",
    version,
    about = "Upload build artifacts to Bintray",
    long_about = "Upload build artifacts to Bintray.

Reads the plugin document ({\"workspace\": {...}, \"vargs\": {...}}) from stdin
unless --config is given, then uploads every configured artifact in order.
The first failure stops the run with a non-zero exit status."
)]
pub struct Args {
    /// Plugin document (JSON, or TOML by extension); `-` reads stdin
    #[arg(short, long, value_name = "FILE", env = "PLUGIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace root the artifact paths are relative to
    #[arg(short, long, value_name = "DIR", env = "DRONE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Print the plugin input and each request before sending it
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Options for the config loader
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config: self.config.clone(),
            workspace: self.workspace.clone(),
            debug: self.debug,
        }
    }
}
