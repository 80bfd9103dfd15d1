use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_mix_core::allocation::cost_model::{self, CostComparisonInput};
use loan_mix_core::allocation::offer::LoanOffer;
use loan_mix_core::allocation::stats::{self, LoanStatsInput};

use crate::commands::optimize::parse_offer_spec;
use crate::input;

/// Arguments for the cost-per-dollar ranking
#[derive(Args)]
pub struct CostArgs {
    /// Path to JSON/YAML input file with an `offers` list
    #[arg(long)]
    pub input: Option<String>,

    /// Offer as name:rate[:fee[:cap[:term[:months]]]], repeatable
    #[arg(long = "offer", value_parser = parse_offer_spec)]
    pub offers: Vec<LoanOffer>,
}

/// Arguments for single-loan stats
#[derive(Args)]
pub struct StatsArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Offer as name:rate[:fee[:cap[:term[:months]]]]
    #[arg(long, value_parser = parse_offer_spec)]
    pub offer: Option<LoanOffer>,

    /// Principal drawn from the offer
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Attach level-payment repayment figures
    #[arg(long)]
    pub amortize: bool,
}

pub fn run_cost(args: CostArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cost_input: CostComparisonInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else if !args.offers.is_empty() {
        CostComparisonInput { offers: args.offers }
    } else {
        return Err("--input <file>, stdin or at least one --offer required".into());
    };
    let result = cost_model::compare_costs(&cost_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stats(args: StatsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stats_input: LoanStatsInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanStatsInput {
            offer: args.offer.ok_or("--offer is required (or provide --input)")?,
            principal_used: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            include_amortization: args.amortize,
        }
    };
    let result = stats::calculate_loan_stats(&stats_input)?;
    Ok(serde_json::to_value(result)?)
}
