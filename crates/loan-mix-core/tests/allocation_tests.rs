use loan_mix_core::allocation::cost_model::cost_per_dollar;
use loan_mix_core::allocation::offer::LoanOffer;
use loan_mix_core::allocation::optimizer::TargetBasis;
use loan_mix_core::allocation::plan::{optimize, AllocationInput, Plan};
use loan_mix_core::allocation::stats::compute_loan_stats;
use loan_mix_core::LoanMixError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn plan_for(target: Decimal, offers: Vec<LoanOffer>) -> Plan {
    plan_with_basis(target, TargetBasis::GrossPrincipal, offers)
}

fn plan_with_basis(target: Decimal, target_basis: TargetBasis, offers: Vec<LoanOffer>) -> Plan {
    optimize(&AllocationInput {
        target,
        target_basis,
        include_amortization: false,
        offers,
    })
    .unwrap()
    .result
}

fn net_total(plan: &Plan) -> Decimal {
    plan.loans.iter().map(|l| l.stats.net_proceeds).sum()
}

fn used(plan: &Plan) -> Vec<(String, Decimal)> {
    plan.loans
        .iter()
        .map(|l| (l.allocation.offer.name.clone(), l.allocation.principal_used))
        .collect()
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_capped_cheap_offer_then_uncapped() {
    let plan = plan_for(
        dec!(10_000),
        vec![
            LoanOffer::new("offer1", dec!(5)).with_cap(dec!(5_000)),
            LoanOffer::new("offer2", dec!(8)),
        ],
    );
    assert_eq!(
        used(&plan),
        vec![
            ("offer1".to_string(), dec!(5_000)),
            ("offer2".to_string(), dec!(5_000)),
        ]
    );
    assert_eq!(plan.shortfall, Decimal::ZERO);
    assert!(plan.summary.feasible);
}

#[test]
fn test_single_capped_offer_leaves_shortfall() {
    let plan = plan_for(
        dec!(10_000),
        vec![LoanOffer::new("only", dec!(5)).with_cap(dec!(3_000))],
    );
    assert_eq!(used(&plan), vec![("only".to_string(), dec!(3_000))]);
    assert_eq!(plan.shortfall, dec!(7_000));
    assert!(!plan.summary.feasible);
}

#[test]
fn test_full_fee_offer_contributes_nothing() {
    // Cheap rate and a big cap, but a 100% fee: never drawn.
    let plan = plan_for(
        dec!(10_000),
        vec![
            LoanOffer::new("all fee", dec!(0)).with_fee(dec!(100)).with_cap(dec!(50_000)),
            LoanOffer::new("normal", dec!(30)).with_cap(dec!(4_000)),
        ],
    );
    assert_eq!(used(&plan), vec![("normal".to_string(), dec!(4_000))]);
    assert_eq!(plan.shortfall, dec!(6_000));
    assert!(plan.loans.iter().all(|l| l.allocation.offer.name != "all fee"));
}

#[test]
fn test_equal_cost_keeps_input_order() {
    let plan = plan_for(
        dec!(9_000),
        vec![
            LoanOffer::new("second listed first", dec!(6)).with_cap(dec!(4_000)),
            LoanOffer::new("twin", dec!(6)).with_cap(dec!(4_000)),
            LoanOffer::new("last", dec!(6)),
        ],
    );
    let names: Vec<String> = used(&plan).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["second listed first", "twin", "last"]);
}

#[test]
fn test_equal_cost_from_different_terms_keeps_input_order() {
    // 11% fee at 0% interest vs 2% over ten years: both 1.11
    let a = LoanOffer::new("B-listed-first", dec!(0)).with_fee(dec!(11));
    let b = LoanOffer::new("A-listed-second", dec!(2)).with_term(dec!(10));
    assert_eq!(cost_per_dollar(&a), dec!(1.11));
    assert_eq!(cost_per_dollar(&a), cost_per_dollar(&b));
    let plan = plan_for(dec!(100), vec![a.with_cap(dec!(60)), b]);
    assert_eq!(plan.loans[0].allocation.offer.name, "B-listed-first");
    assert_eq!(plan.loans[1].allocation.principal_used, dec!(40));
}

#[test]
fn test_subsidized_in_school_interest_is_zero() {
    let plan = plan_for(
        dec!(5_500),
        vec![LoanOffer::new("Direct Subsidized", dec!(6.53))
            .with_in_school_months(dec!(24))
            .subsidized()],
    );
    let stats = &plan.loans[0].stats;
    assert_eq!(stats.in_school_interest, Decimal::ZERO);
    assert_eq!(stats.capitalized_balance, dec!(5_500));

    let entry = plan.loans[0].allocation.clone();
    assert_eq!(compute_loan_stats(&entry, false).in_school_interest, Decimal::ZERO);
}

#[test]
fn test_single_uncapped_offer_covers_target() {
    let plan = plan_for(dec!(42_000), vec![LoanOffer::new("Grad PLUS", dec!(9.08))]);
    assert_eq!(plan.loans.len(), 1);
    assert_eq!(plan.loans[0].allocation.principal_used, dec!(42_000));
    assert_eq!(plan.shortfall, Decimal::ZERO);
}

#[test]
fn test_uncapped_absorbs_remainder_after_cheaper_caps() {
    let plan = plan_for(
        dec!(30_000),
        vec![
            LoanOffer::new("Private", dec!(11)),
            LoanOffer::new("Sub", dec!(5.5)).with_cap(dec!(3_500)).subsidized(),
            LoanOffer::new("Unsub", dec!(5.5)).with_cap(dec!(2_000)),
        ],
    );
    assert_eq!(
        used(&plan),
        vec![
            ("Sub".to_string(), dec!(3_500)),
            ("Unsub".to_string(), dec!(2_000)),
            ("Private".to_string(), dec!(24_500)),
        ]
    );
}

#[test]
fn test_rejects_negative_rate() {
    let result = optimize(&AllocationInput {
        target: dec!(1_000),
        target_basis: TargetBasis::GrossPrincipal,
        include_amortization: false,
        offers: vec![LoanOffer::new("bad", dec!(-2))],
    });
    assert!(matches!(result, Err(LoanMixError::InvalidInput { .. })));
}

#[test]
fn test_net_cash_conservation() {
    let out = optimize(&AllocationInput {
        target: dec!(9_000),
        target_basis: TargetBasis::NetCash,
        include_amortization: false,
        offers: vec![
            LoanOffer::new("Fee 4", dec!(5)).with_fee(dec!(4)).with_cap(dec!(5_000)),
            LoanOffer::new("Fee 0", dec!(9)).with_cap(dec!(2_000)),
        ],
    })
    .unwrap()
    .result;
    // 4,800 net from the first, 2,000 from the second, 2,200 short
    assert_eq!(out.summary.total_net_proceeds, dec!(6_800));
    assert_eq!(out.shortfall, dec!(2_200));
    assert_eq!(out.summary.total_net_proceeds + out.shortfall, dec!(9_000));
}

#[test]
fn test_net_cash_fees_near_full_never_fail() {
    let fees = [
        dec!(99.9),
        dec!(99.99999),
        dec!(99.999999999999),
        dec!(99.999999999999999999999999),
    ];
    for fee in fees {
        for cap in [None, Some(dec!(250)), Some(dec!(1_000_000_000_000_000_000))] {
            let mut steep = LoanOffer::new("Steep", dec!(4)).with_fee(fee);
            if let Some(cap) = cap {
                steep = steep.with_cap(cap);
            }
            // 30% keeps the plain offer behind the steep one in the ranking
            let offers = vec![steep, LoanOffer::new("Plain", dec!(30)).with_fee(dec!(3))];
            let plan = plan_with_basis(dec!(10_000), TargetBasis::NetCash, offers);

            let gap = (net_total(&plan) + plan.shortfall - dec!(10_000)).abs();
            assert!(gap < dec!(0.000001), "fee {fee} cap {cap:?}: off by {gap}");
            for loan in &plan.loans {
                if let Some(cap) = loan.allocation.offer.borrowing_cap {
                    assert!(loan.allocation.principal_used <= cap);
                }
            }
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

fn offer_strategy() -> impl Strategy<Value = LoanOffer> {
    (
        0i64..2_000,
        0i64..1_000,
        prop::option::of(0i64..20_000),
        1i64..30,
        0i64..60,
        any::<bool>(),
    )
        .prop_map(|(rate_bps, fee_bps, cap, term, months, subsidized)| {
            let mut offer = LoanOffer::new("", Decimal::new(rate_bps, 2))
                .with_fee(Decimal::new(fee_bps, 2))
                .with_term(Decimal::from(term))
                .with_in_school_months(Decimal::from(months));
            if let Some(cap) = cap {
                offer = offer.with_cap(Decimal::from(cap));
            }
            if subsidized {
                offer = offer.subsidized();
            }
            offer
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_principal_plus_shortfall_equals_target(
        target in 1i64..100_000,
        offers in prop::collection::vec(offer_strategy(), 1..6),
    ) {
        let target = Decimal::from(target);
        let plan = plan_for(target, offers);
        let total: Decimal = plan.loans.iter().map(|l| l.allocation.principal_used).sum();
        prop_assert_eq!(total + plan.shortfall, target);
        prop_assert!(plan.shortfall >= Decimal::ZERO);
        prop_assert_eq!(plan.summary.feasible, plan.shortfall.is_zero());
    }

    #[test]
    fn prop_caps_respected_and_amounts_positive(
        target in 1i64..100_000,
        offers in prop::collection::vec(offer_strategy(), 1..6),
    ) {
        let plan = plan_for(Decimal::from(target), offers);
        for loan in &plan.loans {
            prop_assert!(loan.allocation.principal_used > Decimal::ZERO);
            if let Some(cap) = loan.allocation.offer.borrowing_cap {
                prop_assert!(loan.allocation.principal_used <= cap);
            }
        }
    }

    #[test]
    fn prop_entries_in_non_decreasing_cost_order(
        target in 1i64..100_000,
        offers in prop::collection::vec(offer_strategy(), 1..6),
    ) {
        let plan = plan_for(Decimal::from(target), offers);
        for pair in plan.loans.windows(2) {
            prop_assert!(pair[0].allocation.cost_per_dollar <= pair[1].allocation.cost_per_dollar);
        }
    }

    #[test]
    fn prop_optimize_is_repeatable(
        target in 1i64..100_000,
        offers in prop::collection::vec(offer_strategy(), 1..6),
    ) {
        let first = plan_for(Decimal::from(target), offers.clone());
        let second = plan_for(Decimal::from(target), offers);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_net_cash_proceeds_plus_shortfall_equals_target(
        target in 1i64..100_000,
        offers in prop::collection::vec(offer_strategy(), 1..6),
    ) {
        let target = Decimal::from(target);
        let plan = plan_with_basis(target, TargetBasis::NetCash, offers);
        let gap = (net_total(&plan) + plan.shortfall - target).abs();
        prop_assert!(gap < dec!(0.000001), "off by {}", gap);
        prop_assert!(plan.shortfall >= Decimal::ZERO);
        for loan in &plan.loans {
            prop_assert!(loan.allocation.principal_used > Decimal::ZERO);
            prop_assert!(loan.stats.net_proceeds <= loan.allocation.principal_used);
            if let Some(cap) = loan.allocation.offer.borrowing_cap {
                prop_assert!(loan.allocation.principal_used <= cap);
            }
        }
    }

    #[test]
    fn prop_cost_per_dollar_at_least_one(offer in offer_strategy()) {
        prop_assert!(cost_per_dollar(&offer) >= Decimal::ONE);
    }

    #[test]
    fn prop_cost_per_dollar_monotone_in_each_input(
        offer in offer_strategy(),
        bump in 1i64..500,
    ) {
        let base = cost_per_dollar(&offer);
        let step = Decimal::new(bump, 2);

        let higher_rate = LoanOffer { interest_rate_pct: offer.interest_rate_pct + step, ..offer.clone() };
        prop_assert!(cost_per_dollar(&higher_rate) >= base);

        let higher_fee = LoanOffer { origination_fee_pct: offer.origination_fee_pct + step, ..offer.clone() };
        prop_assert!(cost_per_dollar(&higher_fee) >= base);

        let longer_term = LoanOffer { term_years: offer.term_years.map(|t| t + step), ..offer.clone() };
        prop_assert!(cost_per_dollar(&longer_term) >= base);

        let more_months = LoanOffer { in_school_months: offer.in_school_months.map(|m| m + step), ..offer.clone() };
        prop_assert!(cost_per_dollar(&more_months) >= base);
    }
}
