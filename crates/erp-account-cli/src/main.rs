mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::fixed_asset::{DepreciationArgs, DisposeArgs};
use commands::payment::{AllocateArgs, PaymentAmountArgs};

/// Accounting rules for invoice payments and fixed assets
#[derive(Parser)]
#[command(
    name = "acct",
    version,
    about = "Accounting rules for invoice payments and fixed assets",
    long_about = "A CLI running ERP accounting rules with decimal precision: allocation \
                  of payments across invoice terms with financial discounts, payment \
                  amount recomputation, and economic/fiscal/IFRS depreciation plans \
                  with disposal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML configuration file (scales, today, locale)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate an amount across invoice terms
    Allocate(AllocateArgs),
    /// Recompute a payment's amount from its allocation records
    PaymentAmount(PaymentAmountArgs),
    /// Generate a depreciation plan for a fixed asset
    Depreciation(DepreciationArgs),
    /// Dispose of a fixed asset at a date
    Dispose(DisposeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = match input::file::read_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Allocate(args) => commands::payment::run_allocate(args, &config),
        Commands::PaymentAmount(args) => commands::payment::run_payment_amount(args, &config),
        Commands::Depreciation(args) => commands::fixed_asset::run_depreciation(args, &config),
        Commands::Dispose(args) => commands::fixed_asset::run_dispose(args, &config),
        Commands::Version => {
            println!("acct {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
