use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use pos_tester::config::Config;
use pos_tester::report::{RunReport, Verdict};
use pos_tester::{sequencer, walker};

#[derive(Parser)]
#[command(name = "pos-tester")]
#[command(version = "0.1.0")]
#[command(about = "POS web application verification CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API check sequence
    Api {
        /// Backend base URL
        #[arg(long, default_value = "http://localhost:8001")]
        base_url: String,

        /// Output directory for reports and artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Run the browser UI flow
    Ui {
        /// Frontend base URL
        #[arg(long, default_value = "http://localhost:5173")]
        base_url: String,

        /// Output directory for reports and artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Run with a visible browser window
        #[arg(long, default_value = "false")]
        headed: bool,
    },

    /// Run the API sequence, then the UI flow
    All {
        /// Backend base URL
        #[arg(long, default_value = "http://localhost:8001")]
        api_base_url: String,

        /// Frontend base URL
        #[arg(long, default_value = "http://localhost:5173")]
        web_base_url: String,

        /// Output directory for reports and artifacts
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Run with a visible browser window
        #[arg(long, default_value = "false")]
        headed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Api { base_url, output } => {
            let mut config = Config::default();
            config.api_base_url = base_url;
            config.artifact_dir = output;

            let report = sequencer::run_api_checks(&config).await?;
            finish(&config, &report, "api-report.json")?
        }

        Commands::Ui {
            base_url,
            output,
            headed,
        } => {
            let mut config = Config::default();
            config.web_base_url = base_url;
            config.artifact_dir = output;
            if headed {
                config.headless = false;
            }

            let report = walker::run_ui_flow(&config).await?;
            finish(&config, &report, "ui-report.json")?
        }

        Commands::All {
            api_base_url,
            web_base_url,
            output,
            headed,
        } => {
            let mut config = Config::default();
            config.api_base_url = api_base_url;
            config.web_base_url = web_base_url;
            config.artifact_dir = output;
            if headed {
                config.headless = false;
            }

            let api_report = sequencer::run_api_checks(&config).await?;
            let api_code = finish(&config, &api_report, "api-report.json")?;

            let ui_report = walker::run_ui_flow(&config).await?;
            let ui_code = finish(&config, &ui_report, "ui-report.json")?;

            api_code.max(ui_code)
        }
    };

    std::process::exit(exit_code);
}

/// Print the summary, write the JSON artifact, and map the verdict to the
/// process exit code.
fn finish(config: &Config, report: &RunReport, file_name: &str) -> anyhow::Result<i32> {
    report.print_summary();
    report.write_json(&config.artifact_dir.join(file_name))?;
    Ok(match report.verdict() {
        Verdict::AllPassed => 0,
        Verdict::SomeFailed => 1,
    })
}
