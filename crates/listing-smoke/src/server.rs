//! Preflight reachability check for the application under test

use tracing::{debug, instrument};

/// Check if a server answers `url` with a 2xx status
#[instrument]
pub async fn is_server_available(url: &str) -> bool {
    match reqwest::get(url).await {
        Ok(resp) => {
            debug!("Preflight {} -> {}", url, resp.status());
            resp.status().is_success()
        }
        Err(e) => {
            debug!("Preflight {} failed: {}", url, e);
            false
        }
    }
}
