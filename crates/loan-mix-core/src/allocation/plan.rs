use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::cost_model::AMORTIZATION_WEIGHT;
use crate::allocation::offer::{validate_amount, validate_offers, LoanOffer};
use crate::allocation::optimizer::{allocate, AllocationEntry, TargetBasis, UnusedOffer, UnusedReason};
use crate::allocation::stats::{loan_stats, share_of_principal_pct, summarize_plan, LoanStats, PlanSummary};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::LoanMixResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One optimization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    /// Amount to finance, measured per `target_basis`.
    pub target: Money,
    #[serde(default)]
    pub target_basis: TargetBasis,
    /// Attach level-payment repayment figures to every loan.
    #[serde(default)]
    pub include_amortization: bool,
    pub offers: Vec<LoanOffer>,
}

/// An allocation entry with its derived figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedLoan {
    pub allocation: AllocationEntry,
    pub stats: LoanStats,
    pub share_of_principal_pct: Percent,
}

/// The result of one optimization run. Recomputed from scratch every time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub target: Money,
    pub target_basis: TargetBasis,
    /// Loans in selection order (ascending cost per dollar).
    pub loans: Vec<PlannedLoan>,
    /// Uncovered part of the target; zero when fully funded.
    pub shortfall: Money,
    pub unused_offers: Vec<UnusedOffer>,
    pub summary: PlanSummary,
}

impl Plan {
    pub fn is_feasible(&self) -> bool {
        self.shortfall <= Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Rank offers by cost per dollar, fill the target greedily and attach
/// per-loan and plan-level figures.
pub fn optimize(input: &AllocationInput) -> LoanMixResult<ComputationOutput<Plan>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_allocation_input(input)?;

    let allocation = allocate(input.target, input.target_basis, &input.offers);

    let total_principal: Money = allocation.entries.iter().map(|e| e.principal_used).sum();
    let loans: Vec<PlannedLoan> = allocation
        .entries
        .into_iter()
        .map(|entry| {
            let stats = loan_stats(&entry, input.include_amortization, &mut warnings);
            let share_of_principal_pct = share_of_principal_pct(entry.principal_used, total_principal);
            PlannedLoan {
                allocation: entry,
                stats,
                share_of_principal_pct,
            }
        })
        .collect();

    for skipped in &allocation.unused {
        if skipped.reason == UnusedReason::NoCapacity {
            log::warn!("{} skipped: no usable capacity", skipped.name);
            warnings.push(format!(
                "{} was skipped: no usable capacity (origination fee ≥ 100%, borrowing cap ≤ 0, \
                 or a fee so close to 100% that the principal needed is out of range)",
                skipped.name
            ));
        }
    }

    if allocation.shortfall > Decimal::ZERO {
        warnings.push(format!(
            "Target not fully covered: {} remains after exhausting all loan caps",
            allocation.shortfall
        ));
    }

    let summary = summarize_plan(&loans, allocation.shortfall);
    let plan = Plan {
        target: input.target,
        target_basis: input.target_basis,
        loans,
        shortfall: allocation.shortfall,
        unused_offers: allocation.unused,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Greedy loan mix — cheapest cost per dollar first, filled to each cap",
        &serde_json::json!({
            "target": input.target.to_string(),
            "target_basis": input.target_basis,
            "offers": input.offers.len(),
            "amortization_weight": AMORTIZATION_WEIGHT.to_string(),
            "include_amortization": input.include_amortization,
        }),
        warnings,
        elapsed,
        plan,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_allocation_input(input: &AllocationInput) -> LoanMixResult<()> {
    validate_amount(input.target, "target", false)?;
    validate_offers(&input.offers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoanMixError;
    use rust_decimal_macros::dec;

    fn input(target: Money, offers: Vec<LoanOffer>) -> AllocationInput {
        AllocationInput {
            target,
            target_basis: TargetBasis::GrossPrincipal,
            include_amortization: false,
            offers,
        }
    }

    #[test]
    fn test_rejects_non_positive_target() {
        let result = optimize(&input(dec!(0), vec![LoanOffer::new("A", dec!(5))]));
        match result {
            Err(LoanMixError::InvalidInput { field, .. }) => assert_eq!(field, "target"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_empty_offers() {
        assert!(optimize(&input(dec!(1_000), vec![])).is_err());
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let offers = vec![
            LoanOffer::new("A", dec!(4)).with_cap(dec!(2_500)),
            LoanOffer::new("B", dec!(6)),
        ];
        let plan = optimize(&input(dec!(10_000), offers)).unwrap().result;
        let shares: Vec<Percent> = plan.loans.iter().map(|l| l.share_of_principal_pct).collect();
        assert_eq!(shares, vec![dec!(25), dec!(75)]);
    }

    #[test]
    fn test_summary_totals() {
        let offers = vec![
            LoanOffer::new("A", dec!(5)).with_fee(dec!(1)).with_cap(dec!(4_000)),
            LoanOffer::new("B", dec!(8)).with_fee(dec!(2)),
        ];
        let plan = optimize(&input(dec!(10_000), offers)).unwrap().result;
        let s = &plan.summary;
        assert_eq!(s.loans_used, 2);
        assert_eq!(s.total_principal, dec!(10_000));
        // 40 + 120
        assert_eq!(s.total_origination_fees, dec!(160));
        assert_eq!(s.total_net_proceeds, dec!(9_840));
        assert!(s.feasible);
        assert!(s.total_monthly_payment.is_none());
    }

    #[test]
    fn test_shortfall_warns() {
        let offers = vec![LoanOffer::new("A", dec!(5)).with_cap(dec!(3_000))];
        let out = optimize(&input(dec!(10_000), offers)).unwrap();
        assert!(!out.result.is_feasible());
        assert!(!out.result.summary.feasible);
        assert!(out.warnings.iter().any(|w| w.contains("not fully covered")));
    }

    #[test]
    fn test_amortization_totals_present_when_requested() {
        let mut req = input(
            dec!(10_000),
            vec![
                LoanOffer::new("A", dec!(5)).with_cap(dec!(5_000)),
                LoanOffer::new("B", dec!(7)),
            ],
        );
        req.include_amortization = true;
        let plan = optimize(&req).unwrap().result;
        let per_loan: Money = plan
            .loans
            .iter()
            .map(|l| l.stats.repayment.as_ref().unwrap().monthly_payment)
            .sum();
        assert_eq!(plan.summary.total_monthly_payment, Some(per_loan));
        assert!(plan.summary.total_interest.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_net_cash_fee_just_under_full_reports_shortfall() {
        let req = AllocationInput {
            target: dec!(10_000),
            target_basis: TargetBasis::NetCash,
            include_amortization: true,
            offers: vec![LoanOffer::new("A", dec!(5)).with_fee(dec!(99.999999999999999999999999))],
        };
        let out = optimize(&req).unwrap();
        assert!(out.result.loans.is_empty());
        assert_eq!(out.result.shortfall, dec!(10_000));
        assert!(out.warnings.iter().any(|w| w.contains("A was skipped")));
        assert_eq!(out.result.summary.blended_cost_per_dollar, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_out_of_range_offer_terms() {
        let huge = dec!(1_000_000_000_000_000_000_000_000_000);
        let offers = vec![LoanOffer::new("A", huge).with_term(huge)];
        assert!(matches!(
            optimize(&input(dec!(1_000), offers)),
            Err(LoanMixError::InvalidInput { .. })
        ));
        let too_big = optimize(&input(
            dec!(2_000_000_000_000_000),
            vec![LoanOffer::new("A", dec!(5))],
        ));
        assert!(too_big.is_err());
    }

    #[test]
    fn test_plan_serializes_with_envelope() {
        let offers = vec![LoanOffer::new("A", dec!(5))];
        let out = optimize(&input(dec!(1_000), offers)).unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["result"]["loans"].is_array());
        assert_eq!(json["result"]["target_basis"], "gross_principal");
        assert!(json["metadata"]["version"].is_string());
    }
}
