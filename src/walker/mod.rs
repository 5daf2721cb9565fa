//! Browser-driven verification walk of the POS frontend.

pub mod driver;
pub mod flow;
pub mod selector;

pub use driver::{WalkerError, WebDriver};
pub use selector::Selector;

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::report::RunReport;

/// Launch a browser, run the product flow, and return its report. The
/// flow releases the browser on every exit path, success or failure.
pub async fn run_ui_flow(config: &Config) -> Result<RunReport> {
    println!(
        "{} Running UI flow against: {}",
        "▶".green().bold(),
        config.web_base_url.cyan()
    );
    let driver = WebDriver::launch(config.headless).await?;
    Ok(flow::ProductFlow::new(driver, config).run().await)
}
