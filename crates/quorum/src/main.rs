use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use quorum_models::briefing::MarketBriefing;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quorum", about = "Panel consensus for prediction markets")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/quorum.toml")]
    config: String,

    /// Read MarketBriefing JSON from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Ask the configured remote endpoint to analyze this market
    #[arg(long, value_name = "MARKET_ID", conflicts_with_all = ["input", "history"])]
    remote: Option<String>,

    /// Print the latest stored report for this market
    #[arg(long, value_name = "MARKET_ID", conflicts_with = "input")]
    history: Option<String>,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

fn read_briefing(input: Option<&str>) -> Result<MarketBriefing> {
    let json = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&json).context("Failed to parse MarketBriefing JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable (respects RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = quorum::load_config(&cli.config)?;

    if let Some(market_id) = &cli.remote {
        let analysis = quorum::analyze_remote(&config, market_id)
            .await
            .context("Remote analysis failed")?;
        return print_json(&analysis, cli.pretty);
    }

    if let Some(market_id) = &cli.history {
        let report = quorum::latest_report(&config, market_id)
            .await?
            .with_context(|| format!("No stored analysis for market {market_id}"))?;
        return print_json(report.as_ref(), cli.pretty);
    }

    let briefing = read_briefing(cli.input.as_deref())?;
    let orchestrator =
        quorum::build_orchestrator(&config).context("Failed to build orchestrator")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, canceling analysis");
            on_signal.cancel();
        }
    });

    let report = quorum::analyze(&orchestrator, &briefing, cancel)
        .await
        .context("Analysis failed")?;
    info!(run_id = %report.run_id, outcome = report.outcome.label(), "Done");

    print_json(&report, cli.pretty)
}
