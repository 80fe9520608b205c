use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::error;

use costing_automation::models::load_submission;
use costing_automation::{logger, App, Config};

const USAGE: &str = "usage: costing-automation <submission.json|submission.toml>";

async fn run() -> Result<bool> {
    let path = std::env::args_os().nth(1).map(PathBuf::from).context(USAGE)?;

    let config = Config::load()?;
    logger::init(config.verbose_logging);

    let submission = load_submission(&path).await?;
    let app = App::initialize(config)?;
    let response = app.run(submission).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.is_success())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            logger::init(false);
            error!("❌ {:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
