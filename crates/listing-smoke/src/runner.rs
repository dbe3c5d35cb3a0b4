//! Smoke check orchestration
//!
//! The runner launches one browser per run and visits each configured page in
//! a fresh tab:
//!
//! ```text
//! navigate -> wait -> snapshot cards -> evaluate -> close tab
//! ```
//!
//! A page that fails to load or scan is recorded as failed and the run moves
//! on to the next page; the overall verdict passes only when every page does.
//!
//! # Example
//!
//! ```no_run
//! use listing_smoke::{Config, runner::SmokeRunner};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let runner = SmokeRunner::new(&config.browser).await?;
//! let report = runner.run(&config).await?;
//! runner.close().await?;
//!
//! for page in &report.pages {
//!     println!("{}: {}", page.name, if page.passed { "ok" } else { "failed" });
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::browser::SmokeBrowser;
use crate::config::{BrowserSettings, Config, PageTarget, WaitCondition};
use crate::error::SmokeError;
use crate::scan::{evaluate, snapshot_cards, Expectation, ScanOutcome};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Results from a complete smoke run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeReport {
    /// Name of the check
    pub suite_name: String,
    /// Base URL that was tested
    pub base_url: String,
    /// Selectors and marker used for the run
    pub check_summary: CheckSummary,
    /// Results for each page, in visit order
    pub pages: Vec<PageResult>,
    /// Total duration of the run
    pub total_duration_ms: u64,
    /// Whether every page passed
    pub passed: bool,
    /// One line per failed page
    pub failures: Vec<String>,
    /// Timestamp when the run started
    pub started_at: String,
}

impl SmokeReport {
    /// Qualifying cards across all pages
    pub fn total_qualifying(&self) -> usize {
        self.pages
            .iter()
            .filter_map(|p| p.outcome.as_ref())
            .map(ScanOutcome::qualifying_count)
            .sum()
    }

    /// Turn the report into the run's verdict
    ///
    /// # Errors
    ///
    /// Returns [`SmokeError::VerificationFailed`] listing every page failure
    /// when any page fell short.
    pub fn verdict(&self) -> Result<(), SmokeError> {
        if self.passed {
            Ok(())
        } else {
            Err(SmokeError::VerificationFailed(self.failures.join("; ")))
        }
    }
}

/// Summary of what was looked for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub card_selector: String,
    pub price_marker: String,
    pub control_selector: String,
}

/// Result for a single page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Page name from the configuration
    pub name: String,
    /// Resolved URL that was visited
    pub url: String,
    /// Card evaluation, absent if the page could not be scanned
    pub outcome: Option<ScanOutcome>,
    /// Time spent on this page in milliseconds
    pub duration_ms: u64,
    /// Whether the page met its minimum
    pub passed: bool,
    /// Navigation or scan error, if any
    pub error: Option<String>,
}

impl PageResult {
    fn failed(target: &PageTarget, url: String, started: Instant, error: String) -> Self {
        Self {
            name: target.name.clone(),
            url,
            outcome: None,
            duration_ms: started.elapsed().as_millis() as u64,
            passed: false,
            error: Some(error),
        }
    }

    fn failure_message(&self) -> String {
        match (&self.error, &self.outcome) {
            (Some(e), _) => format!("{}: {}", self.name, e),
            (None, Some(o)) => format!(
                "{}: found {} listing card(s) with Favorite buttons, expected at least {}",
                self.name,
                o.qualifying_count(),
                o.min_cards
            ),
            (None, None) => format!("{}: not scanned", self.name),
        }
    }
}

/// The smoke runner
pub struct SmokeRunner {
    browser: SmokeBrowser,
}

impl SmokeRunner {
    /// Launch a browser for the run
    pub async fn new(settings: &BrowserSettings) -> Result<Self> {
        Ok(Self::with_browser(SmokeBrowser::launch(settings).await?))
    }

    /// Use an already launched browser
    pub fn with_browser(browser: SmokeBrowser) -> Self {
        Self { browser }
    }

    /// Visit and scan every configured page
    ///
    /// # Errors
    ///
    /// Returns an error only if the configuration is invalid; per-page
    /// failures are reported in the returned [`SmokeReport`].
    #[instrument(skip(self, config), fields(suite = %config.check.name))]
    pub async fn run(&self, config: &Config) -> Result<SmokeReport> {
        config.validate()?;

        let start_time = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();

        info!(
            "Starting check '{}' with {} page(s)",
            config.check.name,
            config.pages.len()
        );

        let mut pages = Vec::with_capacity(config.pages.len());
        for target in &config.pages {
            pages.push(self.run_page(config, target).await);
        }

        let failures: Vec<String> = pages
            .iter()
            .filter(|p| !p.passed)
            .map(PageResult::failure_message)
            .collect();
        let passed = failures.is_empty();

        let report = SmokeReport {
            suite_name: config.check.name.clone(),
            base_url: config.check.base_url.clone(),
            check_summary: CheckSummary {
                card_selector: config.check.card_selector.clone(),
                price_marker: config.check.price_marker.clone(),
                control_selector: config.check.control_selector.clone(),
            },
            pages,
            total_duration_ms: start_time.elapsed().as_millis() as u64,
            passed,
            failures,
            started_at,
        };

        if passed {
            info!(
                "Check '{}' passed: {} qualifying card(s) in {}ms",
                report.suite_name,
                report.total_qualifying(),
                report.total_duration_ms
            );
        } else {
            warn!(
                "Check '{}' failed on {} page(s)",
                report.suite_name,
                report.failures.len()
            );
        }

        Ok(report)
    }

    /// Visit a single page in its own tab
    #[instrument(skip(self, config, target), fields(page = %target.name))]
    async fn run_page(&self, config: &Config, target: &PageTarget) -> PageResult {
        let started = Instant::now();
        let url = config.page_url(target);

        let page = match self.browser.new_page().await {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to create page: {:#}", e);
                return PageResult::failed(target, url, started, format!("{:#}", e));
            }
        };

        let result = Self::visit(config, target, &page, &url).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        match result {
            Ok(outcome) => PageResult {
                name: target.name.clone(),
                url,
                passed: outcome.passed,
                outcome: Some(outcome),
                duration_ms: started.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => {
                warn!("Page '{}' failed: {:#}", target.name, e);
                PageResult::failed(target, url, started, format!("{:#}", e))
            }
        }
    }

    async fn visit(
        config: &Config,
        target: &PageTarget,
        page: &Page,
        url: &str,
    ) -> Result<ScanOutcome> {
        info!("Visiting {}...", target.name);
        page.goto(url)
            .await
            .with_context(|| format!("Navigation to {} failed", url))?;

        Self::wait(page, &target.wait).await?;

        let cards = snapshot_cards(
            page,
            &config.check.card_selector,
            &config.check.control_selector,
        )
        .await?;
        info!(
            "Scanning {} '{}' elements...",
            cards.len(),
            config.check.card_selector
        );

        let expectation = Expectation::new(
            config.check.price_marker.clone(),
            config.min_cards_for(target),
        );
        let outcome = evaluate(&cards, &expectation);

        for index in &outcome.qualifying {
            info!("Found valid listing card at index {} with Favorite button.", index);
        }

        Ok(outcome)
    }

    /// Let the page settle before scanning
    async fn wait(page: &Page, condition: &WaitCondition) -> Result<()> {
        match condition {
            WaitCondition::Timeout { duration } => {
                debug!("Waiting for {:?}", duration);
                tokio::time::sleep(*duration).await;
            }
            WaitCondition::NetworkIdle => {
                debug!("Waiting for navigation to settle");
                page.wait_for_navigation()
                    .await
                    .context("Wait for navigation failed")?;
            }
            WaitCondition::Selector {
                selector,
                timeout: limit,
            } => {
                debug!("Waiting for selector: {}", selector);
                let found = timeout(*limit, async {
                    while page.find_element(selector.as_str()).await.is_err() {
                        tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
                    }
                })
                .await;

                if found.is_err() {
                    anyhow::bail!(
                        "Timeout waiting for selector '{}' after {:?}",
                        selector,
                        limit
                    );
                }
            }
        }
        Ok(())
    }

    /// Close the browser and clean up resources
    pub async fn close(self) -> Result<()> {
        self.browser.close().await
    }
}
