//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl OutputFormat {
    /// Serialize `value` in a machine format; `None` for text
    pub fn render<T: Serialize>(self, value: &T) -> crate::CliResult<Option<String>> {
        match self {
            Self::Text => Ok(None),
            Self::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
            Self::Yaml => Ok(Some(serde_yaml_ng::to_string(value)?)),
        }
    }
}

/// Progress reporter for long runs.
///
/// Status lines go to stderr so that stdout carries only the report.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.write_line("");
        self.write_line(&styled);
    }

    /// Print the run summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let total = passed + failed;
        let secs = duration.as_secs_f64();
        self.write_line("");

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            self.write_line(&format!(
                "{} {} tests in {:.2}s ({} passed, {} failed, {} not applicable)",
                status,
                total,
                secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                Style::new().yellow().apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.write_line(&format!(
                "{status} {total} tests in {secs:.2}s ({passed} passed, {failed} failed, {skipped} not applicable)"
            ));
        }
    }

    fn write_line(&self, line: &str) {
        let write = || self.term.write_line(line);
        // Keep status lines from tearing the bar
        let _ = match self.progress_bar {
            Some(ref pb) => pb.suspend(write),
            None => write(),
        };
    }
}
