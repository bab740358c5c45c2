use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hoverscout_common::observability::{init_logging, LogConfig};
use hoverscout_common::Viewport;
use hoverscout_explore::{explore, ExploreOptions};

/// Explore a page for hover-revealed UI and popups, then print the
/// synthesized behavioral scenarios.
#[derive(Debug, Parser)]
#[command(name = "hoverscout", version)]
struct Cli {
    /// Page to explore.
    url: String,

    /// Run with a visible browser window instead of headless.
    #[arg(long)]
    headed: bool,

    /// Viewport width in pixels.
    #[arg(long, env = "SCOUT_VIEWPORT_WIDTH", default_value_t = 1280)]
    width: u32,

    /// Viewport height in pixels.
    #[arg(long, env = "SCOUT_VIEWPORT_HEIGHT", default_value_t = 800)]
    height: u32,

    /// Exploration budget in seconds.
    #[arg(long, env = "SCOUT_BUDGET_SECS", default_value_t = 6.0)]
    budget_secs: f64,

    /// Open revealed links in an isolated session to confirm they navigate.
    #[arg(long)]
    click_verify: bool,

    /// Per-link navigation timeout for click verification, in seconds.
    #[arg(long, default_value_t = 3.0)]
    verify_timeout_secs: f64,

    /// Print the full structured result as JSON instead of scenario text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig::default())?;

    let options = ExploreOptions {
        headless: !cli.headed,
        viewport: Viewport {
            width: cli.width,
            height: cli.height,
        },
        budget: Duration::from_secs_f64(cli.budget_secs),
        click_verify: cli.click_verify,
        verify_timeout: Duration::from_secs_f64(cli.verify_timeout_secs),
    };

    let result = explore(&cli.url, &options).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for note in &result.errors {
            eprintln!("note: {note}");
        }
        println!("{}", result.feature_text);
    }
    Ok(())
}
