//! Smoke report output
//!
//! # Output Formats
//!
//! - **Console**: the progress and SUCCESS/FAILURE lines a person reads
//! - **JSON**: machine-readable format for CI integration
//!
//! # Example
//!
//! ```no_run
//! use listing_smoke::reporter::{Reporter, OutputFormat};
//! use listing_smoke::runner::SmokeReport;
//!
//! # fn example(report: SmokeReport) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! Reporter::new(OutputFormat::JsonPretty).write_to_file(&report, "smoke.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::runner::SmokeReport;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// Output format for smoke reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress and verdict
    #[default]
    Console,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

/// Reporter for smoke results
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report results to stdout
    pub fn report(&self, report: &SmokeReport) -> Result<()> {
        let output = self.format_results(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Write results to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, report: &SmokeReport, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_results(report)?;
        fs::write(path, output)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Format results as a string
    pub fn format_results(&self, report: &SmokeReport) -> Result<String> {
        match self.format {
            OutputFormat::Console => ConsoleReporter::format(report),
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::runner::{CheckSummary, PageResult, SmokeReport};
    use crate::scan::ScanOutcome;

    pub fn passing_report() -> SmokeReport {
        SmokeReport {
            suite_name: "Listing cards".to_string(),
            base_url: "http://localhost:8080/".to_string(),
            check_summary: CheckSummary {
                card_selector: ".group".to_string(),
                price_marker: "R$".to_string(),
                control_selector: "button".to_string(),
            },
            pages: vec![PageResult {
                name: "Home".to_string(),
                url: "http://localhost:8080/".to_string(),
                outcome: Some(ScanOutcome {
                    scanned: 12,
                    priced: 2,
                    qualifying: vec![4, 7],
                    min_cards: 1,
                    passed: true,
                }),
                duration_ms: 3200,
                passed: true,
                error: None,
            }],
            total_duration_ms: 3500,
            passed: true,
            failures: Vec::new(),
            started_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    pub fn failing_report() -> SmokeReport {
        let mut report = passing_report();
        let page = &mut report.pages[0];
        page.passed = false;
        if let Some(outcome) = page.outcome.as_mut() {
            outcome.qualifying.clear();
            outcome.passed = false;
        }
        report.passed = false;
        report.failures =
            vec!["Home: found 0 listing card(s) with Favorite buttons, expected at least 1".into()];
        report
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{failing_report, passing_report};
    use super::*;

    #[test]
    fn test_reporter_json_format() {
        let output = Reporter::new(OutputFormat::Json)
            .format_results(&passing_report())
            .unwrap();

        assert!(output.contains("Listing cards"));
        assert!(output.contains("http://localhost:8080/"));
    }

    #[test]
    fn test_reporter_console_format() {
        let output = Reporter::new(OutputFormat::Console)
            .format_results(&passing_report())
            .unwrap();

        assert!(output.contains("Visiting Home..."));
        assert!(output.contains("SUCCESS"));
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join(format!("listing-smoke-report-{}.json", std::process::id()));
        Reporter::new(OutputFormat::JsonPretty)
            .write_to_file(&passing_report(), &path)
            .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(written.contains("\"passed\": true"));
    }

    #[test]
    fn test_verdict_of_passing_report() {
        assert_eq!(passing_report().verdict(), Ok(()));
    }

    #[test]
    fn test_verdict_of_failing_report_exits_one() {
        let err = failing_report()
            .verdict()
            .expect_err("Failing report should not pass");

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("Home: found 0 listing card(s)"));

        let err: anyhow::Error = err.into();
        let smoke = err
            .downcast_ref::<crate::SmokeError>()
            .expect("Verdict error should stay a SmokeError");
        assert_eq!(smoke.exit_code(), 1);
    }

    #[test]
    fn test_default_format() {
        assert_eq!(Reporter::default().format, OutputFormat::Console);
    }
}
