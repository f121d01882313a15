//! RatePair Simulator
//!
//! Drives the converter widget against a simulated bank, either from a
//! scripted scenario or from commands typed on stdin.

use std::sync::Arc;

use clap::Parser;
use ratepair_common::{ConverterError, Currency};
use ratepair_fx::JsonFileRateProvider;
use ratepair_widget::{StalenessMode, WidgetConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bank;
mod controller;
mod metrics;
mod scenario;

use bank::SimulatedBank;
use controller::{parse_quote, SessionController};
use scenario::Scenario;

/// RatePair Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "RatePair converter widget simulation environment")]
struct Args {
    /// Bank buy rate (quote units per base unit)
    #[arg(long, default_value = "2.5")]
    buy_rate: String,

    /// Bank sell rate (quote units per base unit)
    #[arg(long, default_value = "2.4")]
    sell_rate: String,

    /// Serve rates from a JSON file instead of the fixed quote
    #[arg(long)]
    rates_file: Option<String>,

    /// Scenario to run (built-in name or path to a .json file)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Base currency code
    #[arg(long)]
    base: Option<String>,

    /// Quote currency code
    #[arg(long)]
    quote: Option<String>,

    /// Use the 18 minute staleness threshold
    #[arg(long)]
    legacy_staleness: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = WidgetConfig::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Some(base) = &args.base {
        config.pair.base = Currency::new(base.as_str());
    }
    if let Some(quote) = &args.quote {
        config.pair.quote = Currency::new(quote.as_str());
    }
    if args.legacy_staleness {
        config.staleness = StalenessMode::Legacy;
    }
    config.validate().map_err(ConverterError::Configuration)?;

    info!("Starting RatePair Simulator");
    info!("Pair: {}", config.pair);
    info!("Staleness threshold: {:?}", config.staleness_policy().threshold());

    let bank = match &args.rates_file {
        Some(path) => {
            info!("Serving rates from {}", path);
            let upstream = JsonFileRateProvider::new(path.as_str()).with_pair(config.pair.clone());
            Arc::new(SimulatedBank::with_upstream("FILE", Arc::new(upstream)))
        }
        None => {
            let quote = parse_quote(&args.buy_rate, &args.sell_rate)?;
            info!("Bank rates: buy {} / sell {}", quote.buy_rate, quote.sell_rate);
            Arc::new(SimulatedBank::with_quote("BANK", quote))
        }
    };

    let mut controller = SessionController::start(&config, bank).await?;

    let mut failed = 0;
    if let Some(scenario_name) = &args.scenario {
        let scenario = Scenario::load(scenario_name)?;
        failed = controller.run_scenario(&scenario).await?;
    } else {
        info!("Running in interactive mode");
        info!(
            "Commands: sell <amount>, buy <amount>, toggle, advance <minutes>, \
             cross <amount> <from> <to>, status, quit"
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match controller.command(&line).await {
                Ok(true) => {
                    let view = controller.view();
                    println!(
                        "[{:?}] sell {} {:>12} | buy {} {:>12}{}",
                        view.status,
                        view.sell_currency,
                        view.fields.sell,
                        view.buy_currency,
                        view.fields.buy,
                        view.warning
                            .map(|w| format!("  ({w})"))
                            .unwrap_or_default(),
                    );
                }
                Ok(false) => break,
                Err(e) => println!("error: {e:#}"),
            }
        }
    }

    // Print metrics
    let metrics = controller.metrics();
    info!("Simulation complete");
    for line in metrics.summary() {
        info!("{}", line);
    }
    info!("Bank fetches: {}", controller.bank_fetches());

    if failed > 0 {
        anyhow::bail!("{} assertion(s) failed", failed);
    }

    Ok(())
}
