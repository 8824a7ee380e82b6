use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use advice_core::config::{CONFIG_PATH_ENV, load_config};
use advice_core::telemetry::init_tracing;
use advice_core::{AdviceHandler, InvocationEvent};

/// Runs the advice handler once against an invocation event, outside Lambda.
///
/// The event is the same API-Gateway-style JSON Lambda would deliver, e.g.
/// `{"httpMethod": "POST", "body": "{\"situation\": \"...\"}"}`.
#[derive(Debug, Parser)]
#[command(name = "advice-local", version)]
struct Args {
    /// Event JSON file; stdin when omitted.
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// YAML config file.
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<String>,

    /// Correlation id echoed back as `timestamp`.
    #[arg(long)]
    request_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let raw = match &args.event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    let event: InvocationEvent =
        serde_json::from_str(&raw).context("Event is not a valid invocation event")?;

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let handler = AdviceHandler::from_config(&config)?;

    let request_id = args
        .request_id
        .unwrap_or_else(|| format!("local-{}", chrono::Utc::now().timestamp_millis()));

    let response = handler.handle(event, &request_id).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
