//! Headless-browser smoke check for listing cards
//!
//! Loads pages of a locally served marketplace front end in Chromium, lets them
//! settle, and verifies that the rendered listing cards show a price and carry
//! a favorite control.
//!
//! # Example
//!
//! ```no_run
//! use listing_smoke::{Config, OutputFormat, Reporter, SmokeRunner};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("smoke.toml")?;
//!
//! let runner = SmokeRunner::new(&config.browser).await?;
//! let report = runner.run(&config).await?;
//! runner.close().await?;
//!
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Every field is optional; the defaults check `.group` cards on
//! `http://localhost:8080/` for an `R$` price and a `button`:
//!
//! ```toml
//! [check]
//! base_url = "http://localhost:8080/"
//! card_selector = ".group"
//! price_marker = "R$"
//! control_selector = "button"
//! min_cards = 1
//!
//! [[pages]]
//! name = "Home"
//! path = "/"
//! wait = { wait_for = "timeout", duration = 3000 }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod reporter;
pub mod runner;
pub mod scan;
pub mod server;

pub use config::Config;
pub use error::SmokeError;
pub use reporter::{OutputFormat, Reporter};
pub use runner::{PageResult, SmokeReport, SmokeRunner};
