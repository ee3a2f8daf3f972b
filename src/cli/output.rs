//! Colored terminal output for upload runs
//!
//! CI logs capture stdout, so every message (errors included) goes there.
//! Writes are best effort: a broken stdout must not turn a successful upload
//! into a failure.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    fn emit(&self, marker: Option<(&str, ColorSpec)>, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        if let Some((symbol, spec)) = marker {
            let _ = buffer.set_color(&spec);
            let _ = write!(&mut buffer, "{} ", symbol);
            let _ = buffer.reset();
        }
        let _ = writeln!(&mut buffer, "{}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Green)).set_bold(true);
        self.emit(Some(("✓", spec)), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Yellow)).set_bold(true);
        self.emit(Some(("⚠", spec)), message);
    }

    /// Print an error message (always shown)
    pub fn error(&self, message: &str) {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Red)).set_bold(true);
        self.emit(Some(("✗", spec)), message);
    }

    /// Print a debug message (only in verbose mode)
    pub fn verbose(&self, message: &str) {
        if !self.verbose || self.quiet {
            return;
        }
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Blue));
        self.emit(Some(("→", spec)), message);
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.emit(None, &format!("    {}", message));
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.emit(None, message);
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
