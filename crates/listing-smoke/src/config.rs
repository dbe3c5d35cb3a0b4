//! Configuration parsing for listing smoke checks
//!
//! This module provides TOML-based configuration describing which pages to
//! visit, how long to let them settle, and what a qualifying listing card looks
//! like. Every field has a default, so an empty file (or no file at all)
//! reproduces the stock check against `http://localhost:8080/`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SmokeError;

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// What counts as a qualifying listing card
    #[serde(default)]
    pub check: CheckConfig,
    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserSettings,
    /// Pages to scan, in order
    #[serde(default = "default_pages")]
    pub pages: Vec<PageTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check: CheckConfig::default(),
            browser: BrowserSettings::default(),
            pages: default_pages(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is malformed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use listing_smoke::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("smoke.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use listing_smoke::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [check]
    ///     base_url = "http://localhost:5173"
    ///
    ///     [[pages]]
    ///     name = "Search"
    ///     path = "/search"
    /// "#;
    /// let config = Config::from_str(toml)?;
    /// assert_eq!(config.pages[0].path, "/search");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Apply command-line overrides on top of file or default values
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.base_url {
            self.check.base_url = url.clone();
        }
        if let Some(settle) = overrides.settle {
            for page in &mut self.pages {
                page.wait = WaitCondition::Timeout { duration: settle };
            }
        }
        if let Some(selector) = &overrides.card_selector {
            self.check.card_selector = selector.clone();
        }
        if let Some(marker) = &overrides.price_marker {
            self.check.price_marker = marker.clone();
        }
        if let Some(selector) = &overrides.control_selector {
            self.check.control_selector = selector.clone();
        }
        if let Some(min) = overrides.min_cards {
            self.check.min_cards = min;
            for page in &mut self.pages {
                page.min_cards = None;
            }
        }
        if overrides.headed {
            self.browser.headless = false;
        }
        if overrides.no_sandbox {
            self.browser.no_sandbox = true;
        }
        if let Some(path) = &overrides.chrome_executable {
            self.browser.chrome_executable = Some(path.clone());
        }
    }

    /// Reject configurations that could never produce a meaningful verdict
    pub fn validate(&self) -> Result<(), SmokeError> {
        let check = &self.check;
        if check.card_selector.trim().is_empty() {
            return Err(SmokeError::InvalidConfig(
                "card_selector must not be empty".into(),
            ));
        }
        if check.control_selector.trim().is_empty() {
            return Err(SmokeError::InvalidConfig(
                "control_selector must not be empty".into(),
            ));
        }
        if check.price_marker.is_empty() {
            return Err(SmokeError::InvalidConfig(
                "price_marker must not be empty".into(),
            ));
        }
        if check.min_cards == 0 {
            return Err(SmokeError::InvalidConfig(
                "min_cards must be at least 1".into(),
            ));
        }
        if !has_location(&check.base_url) {
            return Err(SmokeError::InvalidConfig(format!(
                "base_url must be an http(s) URL with a host or a file URL with a path (got '{}')",
                check.base_url
            )));
        }
        if self.pages.is_empty() {
            return Err(SmokeError::InvalidConfig(
                "at least one page must be configured".into(),
            ));
        }
        for page in &self.pages {
            if page.min_cards == Some(0) {
                return Err(SmokeError::InvalidConfig(format!(
                    "page '{}': min_cards must be at least 1",
                    page.name
                )));
            }
            if let WaitCondition::Selector { selector, .. } = &page.wait {
                if selector.trim().is_empty() {
                    return Err(SmokeError::InvalidConfig(format!(
                        "page '{}': wait selector must not be empty",
                        page.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Full URL for a page target
    pub fn page_url(&self, page: &PageTarget) -> String {
        resolve_url(&self.check.base_url, &page.path)
    }

    /// Minimum qualifying cards a page needs to pass
    pub fn min_cards_for(&self, page: &PageTarget) -> u32 {
        page.min_cards.unwrap_or(self.check.min_cards)
    }
}

/// Whether `url` names a host (http/https) or a filesystem path (file)
fn has_location(url: &str) -> bool {
    for scheme in ["http://", "https://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            return rest
                .split(['/', '?', '#'])
                .next()
                .is_some_and(|host| !host.is_empty());
        }
    }
    url.strip_prefix("file://")
        .is_some_and(|path| !path.trim_matches('/').is_empty())
}

/// Join a page path onto the base URL
///
/// Absolute `http(s)://` paths are returned unchanged; anything else is joined
/// with exactly one `/` between base and path.
///
/// A `file://` base names a document rather than a server root. An empty or
/// `/` path yields the base itself, and other paths resolve next to it, so
/// `file:///site/index.html` + `/search.html` is `file:///site/search.html`.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if base_url.starts_with("file://") {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return base_url.to_string();
        }
        let dir_end = base_url.rfind('/').map_or(base_url.len(), |i| i + 1);
        return format!("{}{}", &base_url[..dir_end], relative);
    }
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// What a qualifying listing card looks like
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Name shown in reports (default: "Listing cards")
    #[serde(default = "default_name")]
    pub name: String,
    /// Base URL of the application under test
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// CSS selector for candidate card elements
    #[serde(default = "default_card_selector")]
    pub card_selector: String,
    /// Substring that marks a card as displaying a price
    #[serde(default = "default_price_marker")]
    pub price_marker: String,
    /// CSS selector for the favorite control inside a card
    #[serde(default = "default_control_selector")]
    pub control_selector: String,
    /// Minimum qualifying cards per page (default: 1)
    #[serde(default = "default_min_cards")]
    pub min_cards: u32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_url: default_base_url(),
            card_selector: default_card_selector(),
            price_marker: default_price_marker(),
            control_selector: default_control_selector(),
            min_cards: default_min_cards(),
        }
    }
}

fn default_name() -> String {
    "Listing cards".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_card_selector() -> String {
    ".group".to_string()
}

fn default_price_marker() -> String {
    "R$".to_string()
}

fn default_control_selector() -> String {
    "button".to_string()
}

fn default_min_cards() -> u32 {
    1
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run without a visible window (default: true)
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when absent
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Pass `--no-sandbox` to Chromium (needed when running as root in containers)
    #[serde(default)]
    pub no_sandbox: bool,
    /// Per-request CDP timeout in milliseconds (default: 30000)
    #[serde(default = "default_navigation_timeout", with = "duration_ms")]
    pub navigation_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_executable: None,
            no_sandbox: false,
            navigation_timeout: default_navigation_timeout(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_navigation_timeout() -> Duration {
    Duration::from_secs(30)
}

/// A page to visit and scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTarget {
    /// Name used in logs and reports
    pub name: String,
    /// Path relative to base_url, or an absolute URL
    pub path: String,
    /// How to let the page settle before scanning
    #[serde(default)]
    pub wait: WaitCondition,
    /// Overrides `check.min_cards` for this page
    #[serde(default)]
    pub min_cards: Option<u32>,
}

fn default_pages() -> Vec<PageTarget> {
    vec![PageTarget {
        name: "Home".to_string(),
        path: "/".to_string(),
        wait: WaitCondition::default(),
        min_cards: None,
    }]
}

/// Conditions to wait for before scanning a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "wait_for", rename_all = "snake_case")]
pub enum WaitCondition {
    /// Wait for navigation to settle
    NetworkIdle,
    /// Poll until a CSS selector matches
    Selector {
        /// CSS selector to wait for
        selector: String,
        /// Give up after this many milliseconds (default: 10000)
        #[serde(default = "default_selector_timeout", with = "duration_ms")]
        timeout: Duration,
    },
    /// Wait for a fixed duration
    Timeout {
        /// Duration in milliseconds
        #[serde(with = "duration_ms")]
        duration: Duration,
    },
}

impl Default for WaitCondition {
    fn default() -> Self {
        WaitCondition::Timeout {
            duration: Duration::from_millis(3000),
        }
    }
}

fn default_selector_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Command-line overrides layered over the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    /// Replaces every page's wait with a fixed timeout
    pub settle: Option<Duration>,
    pub card_selector: Option<String>,
    pub price_marker: Option<String>,
    pub control_selector: Option<String>,
    /// Replaces the global minimum and clears per-page minimums
    pub min_cards: Option<u32>,
    pub headed: bool,
    pub no_sandbox: bool,
    pub chrome_executable: Option<PathBuf>,
}

/// Serde module for serializing/deserializing Duration as milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
