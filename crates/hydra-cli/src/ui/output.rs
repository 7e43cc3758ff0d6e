//! Progress output for the terminal.
//!
//! Everything is written to stderr so stdout stays usable for manifests
//! and JSON.

use crossterm::style::Stylize;
use hydra_core::Reporter;

use super::theme::{Theme, format_size};

/// Terminal reporter shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
    verbose: bool,
}

impl Output {
    /// `quiet` suppresses everything but errors; `verbose` adds a line as
    /// each file starts.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            verbose,
        }
    }

    /// Log a success message.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            eprintln!(
                "{} {}",
                self.theme.icons.success.with(self.theme.colors.success),
                msg.with(self.theme.colors.success)
            );
        }
    }

    /// Log an error message. Shown even when quiet.
    pub fn error(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }

    fn started(&self, name: &str, detail: &str) {
        if self.verbose && !self.quiet {
            eprintln!(
                "  {} {} {}",
                self.theme.icons.pending.dark_grey(),
                name,
                detail.dark_grey()
            );
        }
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if !self.quiet {
            eprintln!();
            eprintln!("{}", title.bold());
        }
    }

    fn fetching(&self, name: &str, size: u64) {
        self.started(name, &format!("fetching {}", format_size(size)));
    }

    fn extracting(&self, name: &str) {
        self.started(name, "extracting");
    }

    fn bundling(&self, name: &str, size: u64) {
        self.started(name, &format!("adding {}", format_size(size)));
    }

    fn done(&self, name: &str, detail: &str, size: Option<u64>) {
        if self.quiet {
            return;
        }
        let size = size.map(format_size).unwrap_or_default();
        eprintln!(
            "  {} {} {} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            name.with(self.theme.colors.name),
            detail,
            size.with(self.theme.colors.secondary)
        );
    }

    fn failed(&self, name: &str, reason: &str) {
        eprintln!(
            "  {} {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            name.with(self.theme.colors.name),
            reason.with(self.theme.colors.error)
        );
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{} {msg}", self.theme.icons.info.dark_grey());
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        if self.quiet {
            return;
        }
        let noun = if count == 1 { "file" } else { "files" };
        eprintln!();
        eprintln!(
            "{} {count} {noun} {action} in {elapsed_secs:.1}s",
            self.theme.icons.success.with(self.theme.colors.success)
        );
    }
}
