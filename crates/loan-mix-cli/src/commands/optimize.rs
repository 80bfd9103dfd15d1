use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_mix_core::allocation::offer::LoanOffer;
use loan_mix_core::allocation::optimizer::TargetBasis;
use loan_mix_core::allocation::plan::{self, AllocationInput};
use loan_mix_core::explain;
use loan_mix_core::intake::coerce::{coerce_str, Coerced};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasisArg {
    /// Target is principal to borrow
    Gross,
    /// Target is cash needed after fees
    Net,
}

impl From<BasisArg> for TargetBasis {
    fn from(b: BasisArg) -> Self {
        match b {
            BasisArg::Gross => TargetBasis::GrossPrincipal,
            BasisArg::Net => TargetBasis::NetCash,
        }
    }
}

/// Arguments for loan-mix optimization
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct OptimizeArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount to finance
    #[arg(long)]
    pub target: Option<Decimal>,

    /// What the target measures
    #[arg(long, value_enum, default_value = "gross")]
    pub basis: BasisArg,

    /// Attach level-payment repayment figures
    #[arg(long)]
    pub amortize: bool,

    /// Offer as name:rate[:fee[:cap[:term[:months]]]], repeatable. Append
    /// ":sub" to mark in-school interest as subsidized.
    #[arg(long = "offer", value_parser = parse_offer_spec)]
    pub offers: Vec<LoanOffer>,
}

/// Arguments for the explanation payload
#[derive(Args)]
pub struct ExplainPayloadArgs {
    #[command(flatten)]
    pub plan: OptimizeArgs,
}

pub fn run_optimize(args: OptimizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let allocation_input = read_allocation_input(args)?;
    let result = plan::optimize(&allocation_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_explain_payload(args: ExplainPayloadArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let allocation_input = read_allocation_input(args.plan)?;
    let result = explain::prepare_explanation(&allocation_input)?;
    Ok(serde_json::to_value(result)?)
}

fn read_allocation_input(args: OptimizeArgs) -> Result<AllocationInput, Box<dyn std::error::Error>> {
    let allocation_input: AllocationInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        if args.offers.is_empty() {
            return Err("at least one --offer is required (or provide --input)".into());
        }
        AllocationInput {
            target: args
                .target
                .ok_or("--target is required (or provide --input)")?,
            target_basis: args.basis.into(),
            include_amortization: args.amortize,
            offers: args.offers,
        }
    };
    log::debug!(
        "optimizing {} offers for target {}",
        allocation_input.offers.len(),
        allocation_input.target
    );
    Ok(allocation_input)
}

/// Parse `name:rate[:fee[:cap[:term[:months]]]][:sub]`. Empty segments take
/// the usual defaults; an empty cap means uncapped.
pub fn parse_offer_spec(spec: &str) -> Result<LoanOffer, String> {
    let mut parts: Vec<&str> = spec.split(':').collect();
    let subsidized = parts
        .last()
        .is_some_and(|p| p.trim().eq_ignore_ascii_case("sub"));
    if subsidized {
        parts.pop();
    }
    if parts.len() < 2 || parts.len() > 6 {
        return Err(format!(
            "expected name:rate[:fee[:cap[:term[:months]]]], got '{spec}'"
        ));
    }

    let field = |idx: usize, label: &str| -> Result<Option<Decimal>, String> {
        match parts.get(idx).map(|p| coerce_str(p)) {
            None | Some(Coerced::Missing) => Ok(None),
            Some(Coerced::Number(d)) => Ok(Some(d)),
            Some(Coerced::Invalid(text)) => Err(format!("{label} '{text}' is not a number")),
        }
    };

    let rate = field(1, "rate")?.ok_or_else(|| format!("rate is required in '{spec}'"))?;
    let mut offer = LoanOffer::new(parts[0].trim(), rate);
    offer.origination_fee_pct = field(2, "fee")?.unwrap_or(Decimal::ZERO);
    offer.borrowing_cap = field(3, "cap")?;
    offer.term_years = field(4, "term")?;
    offer.in_school_months = field(5, "months")?;
    offer.subsidized_in_school = subsidized;
    Ok(offer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_offer_spec_full() {
        let offer = parse_offer_spec("Federal:6.53:1.057:5500:10:48:sub").unwrap();
        assert_eq!(offer.name, "Federal");
        assert_eq!(offer.interest_rate_pct, dec!(6.53));
        assert_eq!(offer.origination_fee_pct, dec!(1.057));
        assert_eq!(offer.borrowing_cap, Some(dec!(5500)));
        assert_eq!(offer.term_years, Some(dec!(10)));
        assert_eq!(offer.in_school_months, Some(dec!(48)));
        assert!(offer.subsidized_in_school);
    }

    #[test]
    fn test_parse_offer_spec_minimal_and_blank_cap() {
        let offer = parse_offer_spec("Bank:8.9").unwrap();
        assert!(offer.borrowing_cap.is_none());
        let offer = parse_offer_spec("Bank:8.9:2::15").unwrap();
        assert!(offer.borrowing_cap.is_none());
        assert_eq!(offer.term_years, Some(dec!(15)));
    }

    #[test]
    fn test_parse_offer_spec_errors() {
        assert!(parse_offer_spec("JustAName").is_err());
        assert!(parse_offer_spec("Bank:cheap").is_err());
        assert!(parse_offer_spec("Bank:").is_err());
    }
}
