//! Signal Sorcerer CLI
//!
//! Parses a trading signal and prices it against a quote given on the
//! command line, printing the same report the chat bot sends.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use signal_sorcerer::broker::FixedQuoteBroker;
use signal_sorcerer::report::{format_config_summary, format_trade_report, FORMAT_HELP};
use signal_sorcerer::signals::{received_at_from_unix, SignalParser};
use signal_sorcerer::trading::{plan_orders, ExecutionConfig, RiskConfig, RiskEngine};
use signal_sorcerer::{ParseError, Quote};

/// Trading-signal parser and position-size calculator.
#[derive(Parser)]
#[command(name = "sigsorc")]
#[command(about = "Parse trading signals and size positions per take-profit", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a signal and print the trade intent as JSON
    Parse {
        /// File holding the signal text (stdin when omitted)
        file: Option<PathBuf>,

        /// Receive time as Unix seconds (now when omitted)
        #[arg(long)]
        received_at: Option<i64>,
    },

    /// Parse and price a signal, then print the trade report
    Calculate {
        /// File holding the signal text (stdin when omitted)
        file: Option<PathBuf>,

        /// Account balance in account currency
        #[arg(short, long, env = "ACCOUNT_BALANCE")]
        balance: Decimal,

        /// Current bid
        #[arg(long)]
        bid: Decimal,

        /// Current ask
        #[arg(long)]
        ask: Decimal,

        /// Units per lot used for the margin estimate
        #[arg(long, default_value = "100000")]
        contract_size: Decimal,

        /// Margin rate used for the margin estimate (0.0333 = 1:30 leverage)
        #[arg(long, default_value = "0.0333")]
        margin_rate: Decimal,

        /// Receive time as Unix seconds (now when omitted)
        #[arg(long)]
        received_at: Option<i64>,

        /// Also print the per-TP order plan
        #[arg(long)]
        orders: bool,

        /// Print the priced trade as JSON instead of the report
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config,

    /// Show the accepted signal format
    FormatHelp,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    dotenvy::dotenv().ok();

    // Malformed configuration stops here, before any message is handled
    let risk_config = RiskConfig::from_env().context("Invalid risk configuration")?;
    let exec_config = ExecutionConfig::from_env().context("Invalid execution configuration")?;

    match cli.command {
        Commands::Parse { file, received_at } => {
            let text = read_signal(file.as_ref())?;
            let parser = SignalParser::new(risk_config);

            match parser.parse(&text, resolve_received_at(received_at)?) {
                Ok(intent) => println!("{}", serde_json::to_string_pretty(&intent)?),
                Err(e) => reject_signal(e),
            }
        }

        Commands::Calculate {
            file,
            balance,
            bid,
            ask,
            contract_size,
            margin_rate,
            received_at,
            orders,
            json,
        } => {
            let text = read_signal(file.as_ref())?;
            let parser = SignalParser::new(risk_config.clone());

            let intent = match parser.parse(&text, resolve_received_at(received_at)?) {
                Ok(intent) => intent,
                Err(e) => reject_signal(e),
            };

            let broker = FixedQuoteBroker::new(Quote { bid, ask }, contract_size, margin_rate);
            let engine = RiskEngine::new(risk_config.clone());
            let priced = engine.price(&intent, balance, &broker, &broker).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&priced)?);
            } else {
                println!("{}", format_trade_report(&priced, balance, &risk_config));
                println!();
                if priced.is_favourable() {
                    println!("Potential profit exceeds potential loss.");
                } else {
                    println!("Potential profit does not exceed potential loss.");
                }
            }

            if orders {
                let plan = plan_orders(&priced, &exec_config);
                info!(orders = plan.len(), "Built order plan");
                println!("\n{}", serde_json::to_string_pretty(&plan)?);
                if !exec_config.enable_trade_execution {
                    println!("Trade execution is currently disabled. No trades have been placed.");
                }
            }
        }

        Commands::Config => {
            println!("{}", format_config_summary(&risk_config, &exec_config));
        }

        Commands::FormatHelp => {
            println!("{}", FORMAT_HELP);
        }
    }

    Ok(())
}

/// Explain the accepted format and exit with a non-zero status.
fn reject_signal(error: ParseError) -> ! {
    warn!(error = %error, "Signal rejected");
    println!("Invalid trade format. Please use the correct format.\n");
    println!("{}", FORMAT_HELP);
    std::process::exit(2);
}

/// Read the signal from `file`, or from stdin when no file is given.
fn read_signal(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signal from {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read signal from stdin")?;
            Ok(text)
        }
    }
}

fn resolve_received_at(secs: Option<i64>) -> Result<DateTime<Utc>> {
    match secs {
        Some(secs) => received_at_from_unix(secs)
            .ok_or_else(|| anyhow::anyhow!("Receive time {} is out of range", secs)),
        None => Ok(Utc::now()),
    }
}
