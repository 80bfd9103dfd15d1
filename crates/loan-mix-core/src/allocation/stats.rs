use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::cost_model::cost_per_dollar;
use crate::allocation::offer::{validate_amount, validate_offer, LoanOffer};
use crate::allocation::optimizer::AllocationEntry;
use crate::allocation::plan::PlannedLoan;
use crate::time_value::{level_payment, simple_interest, MONTHS_PER_YEAR};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Ratio};
use crate::LoanMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-loan figures derived from an allocation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanStats {
    pub origination_fee: Money,
    /// Cash actually disbursed after the fee is withheld.
    pub net_proceeds: Money,
    pub in_school_interest: Money,
    /// Principal plus accrued in-school interest entering repayment.
    pub capitalized_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repayment: Option<RepaymentStats>,
}

/// Level-payment repayment of the capitalized balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentStats {
    pub repayment_months: u32,
    pub monthly_payment: Money,
    pub total_repaid: Money,
    /// Everything repaid above the principal drawn, capitalized accrual included.
    pub total_interest: Money,
}

/// Plan-level totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub loans_used: usize,
    pub total_principal: Money,
    pub total_origination_fees: Money,
    pub total_net_proceeds: Money,
    pub total_in_school_interest: Money,
    pub total_capitalized_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_monthly_payment: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_repaid: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_interest: Option<Money>,
    /// Principal-weighted average of the ranking figure actually used.
    pub blended_cost_per_dollar: Ratio,
    /// True when the target was met in full.
    pub feasible: bool,
}

/// Stand-alone stats request: one offer and an amount drawn from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanStatsInput {
    pub offer: LoanOffer,
    pub principal_used: Money,
    #[serde(default)]
    pub include_amortization: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fees, accrual and (optionally) repayment figures for one allocation entry.
///
/// Arithmetic that cannot be represented is clamped to zero.
pub fn compute_loan_stats(entry: &AllocationEntry, include_amortization: bool) -> LoanStats {
    let mut warnings = Vec::new();
    loan_stats(entry, include_amortization, &mut warnings)
}

/// Weighted average cost per dollar: `Σ(principal × cpd) / Σ principal`.
///
/// Zero total principal yields zero.
pub fn blended_cost_per_dollar(entries: &[AllocationEntry]) -> Ratio {
    let total: Money = entries.iter().map(|e| e.principal_used).sum();
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let weighted: Decimal = entries
        .iter()
        .map(|e| e.principal_used * e.cost_per_dollar)
        .sum();
    weighted / total
}

/// Each loan's share of total principal, in percent.
pub fn share_of_principal_pct(principal_used: Money, total_principal: Money) -> Percent {
    if total_principal <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        principal_used / total_principal * dec!(100)
    }
}

/// Roll per-loan figures up to plan totals.
pub fn summarize_plan(loans: &[PlannedLoan], shortfall: Money) -> PlanSummary {
    let entries: Vec<AllocationEntry> = loans.iter().map(|l| l.allocation.clone()).collect();

    let sum = |f: fn(&PlannedLoan) -> Money| -> Money { loans.iter().map(f).sum() };
    let sum_repayment = |f: fn(&RepaymentStats) -> Money| -> Option<Money> {
        if loans.is_empty() || loans.iter().any(|l| l.stats.repayment.is_none()) {
            return None;
        }
        Some(loans.iter().filter_map(|l| l.stats.repayment.as_ref()).map(f).sum())
    };

    PlanSummary {
        loans_used: loans.len(),
        total_principal: sum(|l| l.allocation.principal_used),
        total_origination_fees: sum(|l| l.stats.origination_fee),
        total_net_proceeds: sum(|l| l.stats.net_proceeds),
        total_in_school_interest: sum(|l| l.stats.in_school_interest),
        total_capitalized_balance: sum(|l| l.stats.capitalized_balance),
        total_monthly_payment: sum_repayment(|r| r.monthly_payment),
        total_repaid: sum_repayment(|r| r.total_repaid),
        total_interest: sum_repayment(|r| r.total_interest),
        blended_cost_per_dollar: blended_cost_per_dollar(&entries),
        feasible: shortfall <= Decimal::ZERO,
    }
}

/// Compute stats for an arbitrary amount drawn from a single offer.
pub fn calculate_loan_stats(input: &LoanStatsInput) -> LoanMixResult<ComputationOutput<LoanStats>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_amount(input.principal_used, "principal_used", true)?;
    validate_offer(&input.offer, "offer")?;
    if let Some(cap) = input.offer.borrowing_cap {
        if input.principal_used > cap {
            warnings.push(format!(
                "Principal {} exceeds the offer's borrowing cap of {}",
                input.principal_used, cap
            ));
        }
    }
    if input.offer.fee_consumes_principal() {
        warnings.push("Origination fee of 100% or more leaves no net proceeds".into());
    }

    let entry = AllocationEntry {
        offer_index: 0,
        cost_per_dollar: cost_per_dollar(&input.offer),
        principal_used: input.principal_used,
        offer: LoanOffer {
            name: input.offer.label(0),
            ..input.offer.clone()
        },
    };
    let stats = loan_stats(&entry, input.include_amortization, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan stats — origination fee, simple in-school accrual, level-payment repayment",
        &serde_json::json!({
            "principal_used": input.principal_used.to_string(),
            "term_years": entry.offer.effective_term_years().to_string(),
            "in_school_months": entry.offer.effective_in_school_months().to_string(),
            "subsidized_in_school": entry.offer.subsidized_in_school,
            "include_amortization": input.include_amortization,
        }),
        warnings,
        elapsed,
        stats,
    ))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

pub(crate) fn loan_stats(
    entry: &AllocationEntry,
    include_amortization: bool,
    warnings: &mut Vec<String>,
) -> LoanStats {
    let offer = &entry.offer;
    let principal = entry.principal_used;

    let origination_fee = principal * offer.fee_rate();
    let net_proceeds = principal - origination_fee;
    let in_school_interest = if offer.subsidized_in_school {
        Decimal::ZERO
    } else {
        simple_interest(principal, offer.rate(), offer.effective_in_school_months())
    };
    let capitalized_balance = principal + in_school_interest;

    let repayment = if include_amortization {
        Some(repayment_stats(entry, capitalized_balance, warnings))
    } else {
        None
    };

    LoanStats {
        origination_fee,
        net_proceeds,
        in_school_interest,
        capitalized_balance,
        repayment,
    }
}

fn repayment_stats(
    entry: &AllocationEntry,
    capitalized_balance: Money,
    warnings: &mut Vec<String>,
) -> RepaymentStats {
    let offer = &entry.offer;
    let repayment_months = (offer.effective_term_years() * MONTHS_PER_YEAR)
        .round()
        .to_u32()
        .unwrap_or(0)
        .max(1);
    let monthly_rate = offer.rate() / MONTHS_PER_YEAR;

    let monthly_payment = match level_payment(monthly_rate, repayment_months, capitalized_balance) {
        Ok(payment) => payment,
        Err(e) => {
            log::warn!("repayment for {} clamped to zero: {e}", offer.name);
            warnings.push(format!(
                "Repayment figures for {} could not be computed ({e}); reported as 0",
                offer.name
            ));
            return RepaymentStats {
                repayment_months,
                monthly_payment: Decimal::ZERO,
                total_repaid: Decimal::ZERO,
                total_interest: Decimal::ZERO,
            };
        }
    };

    let total_repaid = monthly_payment
        .checked_mul(Decimal::from(repayment_months))
        .unwrap_or(Decimal::ZERO);
    let total_interest = (total_repaid - entry.principal_used).max(Decimal::ZERO);

    RepaymentStats {
        repayment_months,
        monthly_payment,
        total_repaid,
        total_interest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(offer: LoanOffer, principal_used: Money) -> AllocationEntry {
        AllocationEntry {
            offer_index: 0,
            cost_per_dollar: cost_per_dollar(&offer),
            principal_used,
            offer,
        }
    }

    #[test]
    fn test_fee_and_net_proceeds() {
        let e = entry(LoanOffer::new("A", dec!(5)).with_fee(dec!(4)), dec!(10_000));
        let stats = compute_loan_stats(&e, false);
        assert_eq!(stats.origination_fee, dec!(400));
        assert_eq!(stats.net_proceeds, dec!(9_600));
        assert!(stats.repayment.is_none());
    }

    #[test]
    fn test_in_school_interest_capitalizes() {
        // 10,000 at 6% for 18 months = 900
        let e = entry(
            LoanOffer::new("A", dec!(6)).with_in_school_months(dec!(18)),
            dec!(10_000),
        );
        let stats = compute_loan_stats(&e, false);
        assert_eq!(stats.in_school_interest, dec!(900));
        assert_eq!(stats.capitalized_balance, dec!(10_900));
    }

    #[test]
    fn test_subsidized_waives_accrual() {
        let e = entry(
            LoanOffer::new("Sub", dec!(5.5))
                .with_in_school_months(dec!(24))
                .subsidized(),
            dec!(5_000),
        );
        let stats = compute_loan_stats(&e, true);
        assert_eq!(stats.in_school_interest, Decimal::ZERO);
        assert_eq!(stats.capitalized_balance, dec!(5_000));
    }

    #[test]
    fn test_amortization_standard_term() {
        let e = entry(LoanOffer::new("A", dec!(6)), dec!(10_000));
        let stats = compute_loan_stats(&e, true);
        let r = stats.repayment.unwrap();
        assert_eq!(r.repayment_months, 120);
        assert!((r.monthly_payment - dec!(111.02)).abs() < dec!(0.01));
        assert_eq!(r.total_repaid, r.monthly_payment * dec!(120));
        assert!((r.total_interest - dec!(3322.46)).abs() < dec!(1));
    }

    #[test]
    fn test_amortization_zero_rate() {
        let e = entry(LoanOffer::new("Family", dec!(0)).with_term(dec!(5)), dec!(6_000));
        let r = compute_loan_stats(&e, true).repayment.unwrap();
        assert_eq!(r.repayment_months, 60);
        assert_eq!(r.monthly_payment, dec!(100));
        assert_eq!(r.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_amortization_overflow_clamps_to_zero() {
        let e = entry(
            LoanOffer::new("Absurd", dec!(5000)).with_term(dec!(50)),
            dec!(1_000),
        );
        let mut warnings = Vec::new();
        let stats = loan_stats(&e, true, &mut warnings);
        let r = stats.repayment.unwrap();
        assert_eq!(r.monthly_payment, Decimal::ZERO);
        assert_eq!(r.total_repaid, Decimal::ZERO);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_blended_cpd_weighted() {
        let a = entry(LoanOffer::new("A", dec!(0)), dec!(3_000));
        let mut b = entry(LoanOffer::new("B", dec!(0)), dec!(1_000));
        b.cost_per_dollar = dec!(2);
        // (3000 * 1 + 1000 * 2) / 4000 = 1.25
        assert_eq!(blended_cost_per_dollar(&[a, b]), dec!(1.25));
    }

    #[test]
    fn test_blended_cpd_empty_is_zero() {
        assert_eq!(blended_cost_per_dollar(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_share_of_principal() {
        assert_eq!(share_of_principal_pct(dec!(250), dec!(1000)), dec!(25));
        assert_eq!(share_of_principal_pct(dec!(250), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_calculate_loan_stats_warns_over_cap() {
        let input = LoanStatsInput {
            offer: LoanOffer::new("", dec!(5)).with_cap(dec!(1_000)),
            principal_used: dec!(2_000),
            include_amortization: false,
        };
        let result = calculate_loan_stats(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("borrowing cap")));
        assert_eq!(result.result.net_proceeds, dec!(2_000));
    }

    #[test]
    fn test_calculate_loan_stats_rejects_negative_principal() {
        let input = LoanStatsInput {
            offer: LoanOffer::new("A", dec!(5)),
            principal_used: dec!(-1),
            include_amortization: false,
        };
        assert!(calculate_loan_stats(&input).is_err());
    }
}
