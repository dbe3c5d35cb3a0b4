//! listing-smoke binary
//!
//! Exit status: 0 when every page passed, 1 when verification failed, 2 for
//! configuration, preflight or browser errors.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use listing_smoke::config::Overrides;
use listing_smoke::server::is_server_available;
use listing_smoke::{Config, OutputFormat, Reporter, SmokeError, SmokeRunner};

#[derive(Parser, Debug)]
#[command(name = "listing-smoke")]
#[command(
    version,
    about = "Verify that rendered listing cards show a price and a favorite button"
)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the application under test
    #[arg(long)]
    url: Option<String>,

    /// Fixed wait after navigation, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    /// CSS selector for candidate cards
    #[arg(long)]
    card_selector: Option<String>,

    /// Text that marks a card as showing a price
    #[arg(long)]
    price_marker: Option<String>,

    /// CSS selector for the favorite control inside a card
    #[arg(long)]
    control_selector: Option<String>,

    /// Minimum qualifying cards per page
    #[arg(long)]
    min_cards: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Launch Chromium with --no-sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Chrome or Chromium executable
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Fail fast if the base URL does not answer before launching a browser
    #[arg(long)]
    require_server: bool,

    /// Report format on stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    format: OutputFormat,

    /// Also write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.url.clone(),
            settle: self.settle_ms.map(Duration::from_millis),
            card_selector: self.card_selector.clone(),
            price_marker: self.price_marker.clone(),
            control_selector: self.control_selector.clone(),
            min_cards: self.min_cards,
            headed: self.headed,
            no_sandbox: self.no_sandbox,
            chrome_executable: self.chrome.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report
    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<SmokeError>()
                .map(SmokeError::exit_code)
                .unwrap_or(2);
            ExitCode::from(code)
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    config.apply_overrides(&args.overrides());
    config.validate()?;

    if args.require_server && !is_server_available(&config.check.base_url).await {
        return Err(SmokeError::ServerUnavailable(config.check.base_url.clone()).into());
    }

    let runner = SmokeRunner::new(&config.browser).await?;
    let report = runner.run(&config).await;
    if let Err(e) = runner.close().await {
        warn!("{:#}", e);
    }
    let report = report?;

    let reporter = Reporter::new(args.format);
    reporter.report(&report)?;
    if let Some(path) = &args.output {
        reporter.write_to_file(&report, path)?;
        info!("Report written to {}", path.display());
    }

    report.verdict()?;
    Ok(())
}
