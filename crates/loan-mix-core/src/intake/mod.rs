//! Boundary between loosely typed input (form fields, language-model
//! extraction) and the allocator. Every value that leaves this module is a
//! valid number; anything unreadable is replaced with its documented default
//! and reported as a note.

pub mod coerce;
pub mod extraction;
pub mod form;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::allocation::offer::{
    placeholder_name, LoanOffer, MAX_AMOUNT, MAX_FEE_PCT, MAX_IN_SCHOOL_MONTHS, MAX_RATE_PCT,
    MAX_TERM_YEARS,
};
use crate::allocation::optimizer::TargetBasis;
use crate::allocation::plan::AllocationInput;
use crate::types::Money;
use crate::{LoanMixError, LoanMixResult};

use coerce::Coerced;

const FEE_CEILING_PCT: Decimal = dec!(100);

/// Pull a value down to its ceiling, noting the change.
fn clamp_to(
    value: Decimal,
    ceiling: Decimal,
    what: &str,
    name: &str,
    notes: &mut Vec<String>,
) -> Decimal {
    if value > ceiling {
        notes.push(format!("{name}: {what} {value} is out of range, capped at {ceiling}"));
        ceiling
    } else {
        value
    }
}

/// Offers and target ready for the allocator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub target: Money,
    #[serde(default)]
    pub target_basis: TargetBasis,
    pub offers: Vec<LoanOffer>,
}

impl LoanApplication {
    pub fn into_allocation_input(self, include_amortization: bool) -> AllocationInput {
        AllocationInput {
            target: self.target,
            target_basis: self.target_basis,
            include_amortization,
            offers: self.offers,
        }
    }
}

/// One offer's fields after per-field coercion, before defaults.
#[derive(Debug, Clone)]
pub(crate) struct RawOffer {
    pub name: String,
    pub interest_rate: Coerced,
    pub origination_fee: Coerced,
    pub borrowing_cap: Coerced,
    pub term_years: Coerced,
    pub in_school_months: Coerced,
    pub subsidized: bool,
}

/// Apply the field defaults: 0 for rate, fee and months, uncapped for cap,
/// ten years for term.
pub(crate) fn build_offer(raw: RawOffer, position: usize, notes: &mut Vec<String>) -> LoanOffer {
    let name = match raw.name.trim() {
        "" => placeholder_name(position),
        trimmed => trimmed.to_string(),
    };

    let interest_rate_pct = match raw.interest_rate {
        Coerced::Number(r) if r >= Decimal::ZERO => {
            clamp_to(r, MAX_RATE_PCT, "interest rate", &name, notes)
        }
        Coerced::Number(r) => {
            notes.push(format!("{name}: negative interest rate {r} replaced with 0"));
            Decimal::ZERO
        }
        Coerced::Missing => {
            notes.push(format!("{name}: interest rate missing, assumed 0%"));
            Decimal::ZERO
        }
        Coerced::Invalid(text) => {
            notes.push(format!("{name}: interest rate '{text}' unreadable, assumed 0%"));
            Decimal::ZERO
        }
    };

    let origination_fee_pct = match raw.origination_fee {
        Coerced::Number(f) if f >= FEE_CEILING_PCT => {
            notes.push(format!(
                "{name}: origination fee {f}% leaves no net proceeds; offer will be skipped"
            ));
            f.min(MAX_FEE_PCT)
        }
        Coerced::Number(f) if f >= Decimal::ZERO => f,
        Coerced::Number(f) => {
            notes.push(format!("{name}: negative origination fee {f} replaced with 0"));
            Decimal::ZERO
        }
        Coerced::Missing => Decimal::ZERO,
        Coerced::Invalid(text) => {
            notes.push(format!("{name}: origination fee '{text}' unreadable, assumed 0%"));
            Decimal::ZERO
        }
    };

    let borrowing_cap = match raw.borrowing_cap {
        Coerced::Number(c) => {
            if c <= Decimal::ZERO {
                notes.push(format!("{name}: borrowing cap {c} leaves no capacity; offer will be skipped"));
            }
            Some(c)
        }
        Coerced::Missing => None,
        Coerced::Invalid(text) => {
            notes.push(format!("{name}: borrowing cap '{text}' unreadable, treated as uncapped"));
            None
        }
    };

    let term_years = match raw.term_years {
        Coerced::Number(t) if t > Decimal::ZERO => {
            Some(clamp_to(t, MAX_TERM_YEARS, "term", &name, notes))
        }
        Coerced::Number(t) => {
            notes.push(format!("{name}: term {t} is not positive, assumed 10 years"));
            None
        }
        Coerced::Missing => None,
        Coerced::Invalid(text) => {
            notes.push(format!("{name}: term '{text}' unreadable, assumed 10 years"));
            None
        }
    };

    let in_school_months = match raw.in_school_months {
        Coerced::Number(m) if m >= Decimal::ZERO => Some(clamp_to(
            m,
            MAX_IN_SCHOOL_MONTHS,
            "in-school months",
            &name,
            notes,
        )),
        Coerced::Number(m) => {
            notes.push(format!("{name}: negative in-school months {m} replaced with 0"));
            None
        }
        Coerced::Missing => None,
        Coerced::Invalid(text) => {
            notes.push(format!("{name}: in-school months '{text}' unreadable, assumed 0"));
            None
        }
    };

    LoanOffer {
        name,
        interest_rate_pct,
        origination_fee_pct,
        borrowing_cap,
        term_years,
        in_school_months,
        subsidized_in_school: raw.subsidized,
    }
}

/// The target has no safe default: a missing or non-positive value is an error.
pub(crate) fn build_target(raw: Coerced) -> LoanMixResult<Money> {
    match raw {
        Coerced::Number(t) if t > MAX_AMOUNT => Err(LoanMixError::InvalidInput {
            field: "target".into(),
            reason: format!("Target amount cannot exceed {MAX_AMOUNT}, got {t}"),
        }),
        Coerced::Number(t) if t > Decimal::ZERO => Ok(t),
        Coerced::Number(t) => Err(LoanMixError::InvalidInput {
            field: "target".into(),
            reason: format!("Target amount must be positive, got {t}"),
        }),
        Coerced::Missing => Err(LoanMixError::InvalidInput {
            field: "target".into(),
            reason: "Target amount is required".into(),
        }),
        Coerced::Invalid(text) => Err(LoanMixError::InvalidInput {
            field: "target".into(),
            reason: format!("Target amount '{text}' is not a number"),
        }),
    }
}
