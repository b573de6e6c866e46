//! Report formatting.
//!
//! Human-readable rendering of run reports with verbosity levels and ANSI
//! colors when stdout is a terminal.

use std::time::Duration;

use crate::cli::VerbosityLevel;
use crate::validator::{FileFailure, RunReport};

/// Output formatter for run reports.
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &RunReport) -> String {
        if self.verbosity == VerbosityLevel::Quiet {
            return if report.is_success() {
                String::new()
            } else {
                format!("Invalid files: {}\n", report.failures.len())
            };
        }

        let mut output = String::new();
        if report.is_success() {
            output.push_str(&format!(
                "{} All claim files are valid.\n",
                self.colorize("✓", "32")
            ));
        } else {
            output.push_str(&format!(
                "{} Found {} invalid file{}:\n\n",
                self.colorize("✗", "31"),
                report.failures.len(),
                if report.failures.len() == 1 { "" } else { "s" }
            ));
            for failure in &report.failures {
                output.push_str(&self.format_failure(failure));
            }
        }
        output.push_str(&self.format_summary(report));
        output
    }

    pub fn format_failure(&self, failure: &FileFailure) -> String {
        let mut output = format!(
            "{} {}\n",
            self.colorize("✗", "31"),
            failure.path.display()
        );
        for message in &failure.messages {
            output.push_str(&format!("    {message}\n"));
        }
        output
    }

    fn format_summary(&self, report: &RunReport) -> String {
        let mut output = String::new();
        output.push_str("\nValidation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", report.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            report.valid_files
        ));
        if !report.failures.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                report.failures.len()
            ));
        }
        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!(
                "  Identifiers resolved: {}\n",
                report.identifiers_resolved
            ));
        }
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(report.total_duration)
        ));
        output
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
