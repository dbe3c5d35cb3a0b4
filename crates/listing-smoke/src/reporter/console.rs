//! Console reporter for smoke results
//!
//! Prints, per page, the visit and scan progress followed by a SUCCESS or
//! FAILURE verdict, then an overall status block.

use anyhow::Result;
use std::fmt::Write;

use crate::runner::{PageResult, SmokeReport};

/// Console format reporter
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Format a smoke report for console output
    pub fn format(report: &SmokeReport) -> Result<String> {
        let mut output = String::new();

        for page in &report.pages {
            Self::format_page(&mut output, report, page)?;
        }

        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        let status = if report.passed { "PASSED" } else { "FAILED" };
        let status_symbol = if report.passed { "✓" } else { "✗" };
        writeln!(output, "{}: {} {}", report.suite_name, status_symbol, status)?;
        writeln!(
            output,
            "  {} page(s), {} qualifying card(s), {}ms",
            report.pages.len(),
            report.total_qualifying(),
            report.total_duration_ms
        )?;

        if !report.failures.is_empty() {
            writeln!(output)?;
            writeln!(output, "Failures:")?;
            for failure in &report.failures {
                writeln!(output, "  • {}", failure)?;
            }
        }

        Ok(output)
    }

    fn format_page(output: &mut String, report: &SmokeReport, page: &PageResult) -> Result<()> {
        writeln!(output, "Visiting {}... ({})", page.name, page.url)?;

        let Some(outcome) = &page.outcome else {
            let error = page.error.as_deref().unwrap_or("page was not scanned");
            writeln!(output, "ERROR: {}", error)?;
            writeln!(output)?;
            return Ok(());
        };

        writeln!(
            output,
            "Scanning {} '{}' elements...",
            outcome.scanned, report.check_summary.card_selector
        )?;
        for index in &outcome.qualifying {
            writeln!(
                output,
                "Found valid listing card at index {} with Favorite button.",
                index
            )?;
        }

        let found = outcome.qualifying_count();
        if page.passed {
            writeln!(
                output,
                "SUCCESS: Verified {} listing cards with Favorite buttons.",
                found
            )?;
        } else if found == 0 {
            writeln!(output, "FAILURE: No listing cards with Favorite buttons found.")?;
        } else {
            writeln!(
                output,
                "FAILURE: Found {} listing cards with Favorite buttons, expected at least {}.",
                found, outcome.min_cards
            )?;
        }
        writeln!(output)?;
        Ok(())
    }
}
