//! Browser helpers for integration tests

use listing_smoke::browser::SmokeBrowser;
use listing_smoke::config::BrowserSettings;
use listing_smoke::SmokeRunner;

/// Check if browser tests should be skipped (when Chrome isn't available)
pub fn should_skip() -> bool {
    std::env::var("SKIP_BROWSER_TESTS").is_ok()
}

/// Macro to skip test if Chrome isn't available
#[macro_export]
macro_rules! skip_if_no_chrome {
    () => {
        if browser::should_skip() {
            eprintln!("Skipping test: SKIP_BROWSER_TESTS is set");
            return;
        }
    };
}

/// Settings used by every browser test
pub fn test_settings() -> BrowserSettings {
    BrowserSettings {
        // CI containers run as root
        no_sandbox: true,
        ..BrowserSettings::default()
    }
}

/// Try to launch a runner, skip test if Chrome is missing or cannot start
pub async fn require_runner() -> Option<SmokeRunner> {
    match SmokeBrowser::launch(&test_settings()).await {
        Ok(browser) => Some(SmokeRunner::with_browser(browser)),
        Err(e) => {
            let message = format!("{:#}", e);
            if message.contains("Could not auto detect") {
                eprintln!("Skipping: Chrome not installed ({})", message);
            } else {
                eprintln!("Skipping: Chrome failed to launch ({})", message);
            }
            None
        }
    }
}
