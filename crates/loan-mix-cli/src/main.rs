mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::cost::{CostArgs, StatsArgs};
use commands::intake::IntakeArgs;
use commands::optimize::{ExplainPayloadArgs, OptimizeArgs};

/// Compare education-loan offers and plan how much to borrow from each
#[derive(Parser)]
#[command(
    name = "loanmix",
    version,
    about = "Compare education-loan offers and plan how much to borrow from each",
    long_about = "Ranks loan offers by estimated cost per dollar borrowed and fills a \
                  funding target cheapest-first up to each offer's cap, with decimal \
                  precision. Reports fees, in-school accrual, optional repayment figures \
                  and any shortfall."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log allocation steps to stderr (overrides RUST_LOG default)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a funding target across loan offers
    Optimize(OptimizeArgs),
    /// Rank offers by cost per dollar without allocating
    Cost(CostArgs),
    /// Fees, accrual and repayment for one amount drawn from one offer
    Stats(StatsArgs),
    /// Coerce raw form or extraction output into a loan application
    Intake(IntakeArgs),
    /// Optimize and emit the payload for the explanation service
    ExplainPayload(ExplainPayloadArgs),
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

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Optimize(args) => commands::optimize::run_optimize(args),
        Commands::Cost(args) => commands::cost::run_cost(args),
        Commands::Stats(args) => commands::cost::run_stats(args),
        Commands::Intake(args) => commands::intake::run_intake(args),
        Commands::ExplainPayload(args) => commands::optimize::run_explain_payload(args),
        Commands::Version => {
            println!("loanmix {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
