//! Cost-per-dollar ranking model.
//!
//! Produces one comparable figure per offer: the estimated dollars repaid for
//! every dollar of principal. It ranks offers; it is not an amortization
//! schedule and not an APR.
//!
//! ```text
//! cpd = (1 + fee) * (1 + rate * months / 12) * (1 + rate * term * 0.55)
//! ```
//!
//! The 0.55 weight approximates the declining balance of a level-payment loan
//! without building the schedule. Each factor is ≥ 1 and non-decreasing in its
//! own input, so the product is ≥ 1 and sorting ascending puts the cheapest
//! offer first.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::offer::{validate_offers, LoanOffer};
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{with_metadata, ComputationOutput, Ratio};
use crate::LoanMixResult;

/// Share of `rate * term` charged on average over a level-payment term.
pub const AMORTIZATION_WEIGHT: Decimal = dec!(0.55);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The three multiplicative factors behind a cost-per-dollar figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// 1 + origination fee.
    pub fee_factor: Ratio,
    /// 1 + simple accrual over the in-school months (1 when subsidized).
    pub in_school_factor: Ratio,
    /// 1 + rate * term * 0.55.
    pub amortization_factor: Ratio,
    pub cost_per_dollar: Ratio,
}

/// An offer together with its rank in the cheapest-first ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedOffer {
    pub rank: usize,
    /// Zero-based position in the submitted offer list.
    pub offer_index: usize,
    pub name: String,
    pub interest_rate_pct: Decimal,
    pub origination_fee_pct: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrowing_cap: Option<Decimal>,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostComparisonInput {
    pub offers: Vec<LoanOffer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostComparisonOutput {
    pub ranking: Vec<RankedOffer>,
    pub cheapest: String,
    /// Most expensive CPD divided by the cheapest.
    pub spread_ratio: Ratio,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Break an offer's cost-per-dollar into its factors.
pub fn cost_breakdown(offer: &LoanOffer) -> CostBreakdown {
    let rate = offer.rate();
    let term = offer.effective_term_years();
    let months = offer.effective_in_school_months();

    let fee_factor = Decimal::ONE + offer.fee_rate();
    let in_school_factor = if offer.subsidized_in_school {
        Decimal::ONE
    } else {
        Decimal::ONE + rate * (months / MONTHS_PER_YEAR)
    };
    let amortization_factor = Decimal::ONE + rate * term * AMORTIZATION_WEIGHT;

    CostBreakdown {
        fee_factor,
        in_school_factor,
        amortization_factor,
        cost_per_dollar: fee_factor * in_school_factor * amortization_factor,
    }
}

/// Estimated dollars repaid per dollar borrowed.
pub fn cost_per_dollar(offer: &LoanOffer) -> Ratio {
    cost_breakdown(offer).cost_per_dollar
}

/// Rank offers cheapest first. Equal figures keep their input order.
pub fn rank_offers(offers: &[LoanOffer]) -> Vec<RankedOffer> {
    let mut ranked: Vec<RankedOffer> = offers
        .iter()
        .enumerate()
        .map(|(i, offer)| RankedOffer {
            rank: 0,
            offer_index: i,
            name: offer.label(i),
            interest_rate_pct: offer.interest_rate_pct,
            origination_fee_pct: offer.origination_fee_pct,
            borrowing_cap: offer.borrowing_cap,
            breakdown: cost_breakdown(offer),
        })
        .collect();

    // Vec::sort_by is stable.
    ranked.sort_by(|a, b| a.breakdown.cost_per_dollar.cmp(&b.breakdown.cost_per_dollar));

    for (rank, entry) in ranked.iter_mut().enumerate() {
        entry.rank = rank + 1;
    }
    ranked
}

/// Compare offers on cost-per-dollar without allocating a target.
pub fn compare_costs(
    input: &CostComparisonInput,
) -> LoanMixResult<ComputationOutput<CostComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_offers(&input.offers)?;

    let ranking = rank_offers(&input.offers);

    for entry in &ranking {
        if input.offers[entry.offer_index].is_degenerate() {
            warnings.push(format!(
                "{} has no usable capacity (fee ≥ 100% or cap ≤ 0) and would be skipped",
                entry.name
            ));
        }
    }

    let cheapest_cpd = ranking
        .first()
        .map(|r| r.breakdown.cost_per_dollar)
        .unwrap_or(Decimal::ONE);
    let dearest_cpd = ranking
        .last()
        .map(|r| r.breakdown.cost_per_dollar)
        .unwrap_or(Decimal::ONE);
    let spread_ratio = if cheapest_cpd.is_zero() {
        Decimal::ZERO
    } else {
        dearest_cpd / cheapest_cpd
    };

    let output = CostComparisonOutput {
        cheapest: ranking.first().map(|r| r.name.clone()).unwrap_or_default(),
        spread_ratio,
        ranking,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cost per dollar borrowed — fee, in-school accrual and weighted term factors",
        &serde_json::json!({
            "offers": input.offers.len(),
            "amortization_weight": AMORTIZATION_WEIGHT.to_string(),
            "default_term_years": crate::allocation::offer::DEFAULT_TERM_YEARS.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_cost_offer_is_exactly_one() {
        let offer = LoanOffer::new("Free", dec!(0));
        assert_eq!(cost_per_dollar(&offer), Decimal::ONE);
    }

    #[test]
    fn test_known_value() {
        // rate 6%, fee 1%, 12 months, 10 years:
        // 1.01 * (1 + 0.06) * (1 + 0.06 * 10 * 0.55) = 1.01 * 1.06 * 1.33
        let offer = LoanOffer::new("A", dec!(6))
            .with_fee(dec!(1))
            .with_in_school_months(dec!(12));
        let b = cost_breakdown(&offer);
        assert_eq!(b.fee_factor, dec!(1.01));
        assert_eq!(b.in_school_factor, dec!(1.06));
        assert_eq!(b.amortization_factor, dec!(1.33));
        assert_eq!(b.cost_per_dollar, dec!(1.01) * dec!(1.06) * dec!(1.33));
    }

    #[test]
    fn test_subsidized_ignores_in_school_months() {
        let unsub = LoanOffer::new("U", dec!(5)).with_in_school_months(dec!(48));
        let sub = unsub.clone().subsidized();
        assert_eq!(cost_breakdown(&sub).in_school_factor, Decimal::ONE);
        assert!(cost_per_dollar(&sub) < cost_per_dollar(&unsub));
    }

    #[test]
    fn test_term_floor_applies_to_ranking() {
        let short = LoanOffer::new("S", dec!(5)).with_term(dec!(0.25));
        let one_year = LoanOffer::new("O", dec!(5)).with_term(dec!(1));
        assert_eq!(cost_per_dollar(&short), cost_per_dollar(&one_year));
    }

    #[test]
    fn test_rank_offers_cheapest_first_and_stable() {
        let offers = vec![
            LoanOffer::new("Pricey", dec!(9)),
            LoanOffer::new("Twin A", dec!(4)),
            LoanOffer::new("Twin B", dec!(4)),
        ];
        let ranked = rank_offers(&offers);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Twin A", "Twin B", "Pricey"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].offer_index, 0);
    }

    #[test]
    fn test_compare_costs_warns_on_degenerate() {
        let input = CostComparisonInput {
            offers: vec![
                LoanOffer::new("Ok", dec!(5)),
                LoanOffer::new("Broken", dec!(5)).with_fee(dec!(100)),
            ],
        };
        let result = compare_costs(&input).unwrap();
        assert_eq!(result.result.cheapest, "Ok");
        assert!(result.result.spread_ratio > Decimal::ONE);
        assert!(result.warnings.iter().any(|w| w.contains("Broken")));
    }
}
