//! Chromium launch and teardown
//!
//! A [`SmokeBrowser`] owns the chromiumoxide [`Browser`] together with the task
//! that drives its CDP event handler. Each launch gets its own throwaway
//! profile directory so concurrent runs never share state.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::BrowserSettings;

static BROWSER_ID: AtomicU64 = AtomicU64::new(0);

/// A launched browser plus its event-loop task
pub struct SmokeBrowser {
    browser: Browser,
    handle: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl SmokeBrowser {
    /// Launch Chromium according to `settings`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use listing_smoke::browser::SmokeBrowser;
    /// use listing_smoke::config::BrowserSettings;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let browser = SmokeBrowser::launch(&BrowserSettings::default()).await?;
    /// let page = browser.new_page().await?;
    /// page.goto("http://localhost:8080/").await?;
    /// browser.close().await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(settings), fields(headless = settings.headless))]
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        Self::launch_with_profile(settings, unique_user_data_dir()).await
    }

    /// Launch with a given profile directory, removing it if the launch fails
    async fn launch_with_profile(
        settings: &BrowserSettings,
        user_data_dir: PathBuf,
    ) -> Result<Self> {
        let launched = async {
            let config = browser_config(settings, &user_data_dir)?;
            info!("Launching browser");
            Browser::launch(config)
                .await
                .context("Failed to launch browser")
        }
        .await;
        let (browser, mut handler) = match launched {
            Ok(pair) => pair,
            Err(e) => {
                remove_profile_dir(&user_data_dir);
                return Err(e);
            }
        };

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        info!("Browser launched successfully");
        Ok(Self {
            browser,
            handle,
            user_data_dir,
        })
    }

    /// Open a fresh blank tab
    pub async fn new_page(&self) -> Result<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")
    }

    /// Close the browser, stop the handler task and remove the profile directory
    ///
    /// The profile is only removed once the browser process has exited, since
    /// Chromium keeps writing to it until then.
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");
        let closed = self.browser.close().await.context("Failed to close browser");
        match self.browser.wait().await {
            Ok(status) => debug!("Browser exited: {:?}", status),
            Err(e) => debug!("Failed to wait for browser exit: {}", e),
        }
        self.handle.abort();
        remove_profile_dir(&self.user_data_dir);
        closed.map(|_| ())
    }
}

/// Best-effort removal of a profile directory
fn remove_profile_dir(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dir) {
        debug!("Could not remove profile dir {}: {}", dir.display(), e);
    }
}

/// Build the chromiumoxide launch configuration
fn browser_config(settings: &BrowserSettings, user_data_dir: &Path) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(settings.navigation_timeout)
        .user_data_dir(user_data_dir);

    if !settings.headless {
        builder = builder.with_head();
    }
    if settings.no_sandbox {
        builder = builder.no_sandbox();
    }

    match settings
        .chrome_executable
        .clone()
        .or_else(find_chrome_for_testing)
    {
        Some(path) => {
            debug!("Using Chrome executable: {}", path.display());
            builder = builder.chrome_executable(path);
        }
        None => debug!("No explicit Chrome executable, relying on auto-detection"),
    }

    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))
}

/// Find Chrome for Testing installed by Puppeteer
///
/// Looks under `$HOME/.cache/puppeteer/chrome`, newest version first.
pub fn find_chrome_for_testing() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    find_chrome_in(&Path::new(&home).join(".cache/puppeteer/chrome"))
}

fn find_chrome_in(cache_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(cache_dir).ok()?;
    let mut versions: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));

    const CANDIDATES: [&str; 3] = [
        "chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
        "chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
        "chrome-linux64/chrome",
    ];

    versions.iter().find_map(|version_dir| {
        CANDIDATES
            .iter()
            .map(|candidate| version_dir.join(candidate))
            .find(|path| path.exists())
    })
}

/// Temp-dir profile path unique across processes and launches
fn unique_user_data_dir() -> PathBuf {
    let browser_id = BROWSER_ID.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id();
    let timestamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let dir = std::env::temp_dir().join(format!(
        "listing-smoke-{}-{}-{}",
        pid, browser_id, timestamp
    ));

    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            warn!("Failed to clear stale profile dir {}: {}", dir.display(), e);
        }
    }
    dir
}
