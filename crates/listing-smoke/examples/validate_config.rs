//! Parse and validate a smoke config without launching a browser
//!
//! Usage: cargo run -p listing-smoke --example validate_config -- [config.toml]

use listing_smoke::config::{Config, WaitCondition};
use std::env;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/listing-smoke/smoke.toml"));

    println!("Validating config file: {}", config_path.display());

    let config = Config::from_file(&config_path)?;
    config.validate()?;

    println!("\n✓ Successfully parsed configuration!");
    println!("\nCheck: {}", config.check.name);
    println!("Base URL: {}", config.check.base_url);
    println!("Card selector: {}", config.check.card_selector);
    println!("Price marker: {}", config.check.price_marker);
    println!("Control selector: {}", config.check.control_selector);

    println!("\nPages ({}):", config.pages.len());
    for (i, page) in config.pages.iter().enumerate() {
        let wait = match &page.wait {
            WaitCondition::Timeout { duration } => format!("sleep {:?}", duration),
            WaitCondition::Selector { selector, timeout } => {
                format!("selector '{}' (up to {:?})", selector, timeout)
            }
            WaitCondition::NetworkIdle => "network idle".to_string(),
        };
        println!(
            "  {}. {} -> {} [{}; min {} card(s)]",
            i + 1,
            page.name,
            config.page_url(page),
            wait,
            config.min_cards_for(page)
        );
    }

    println!("\n✓ All validations passed!");

    Ok(())
}
