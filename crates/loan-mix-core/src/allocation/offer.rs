use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Months, Percent, Rate, Years};
use crate::{LoanMixError, LoanMixResult};

/// Repayment term assumed when an offer does not state one.
pub const DEFAULT_TERM_YEARS: Decimal = dec!(10);

/// Largest target or drawn principal the engine accepts.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

/// Upper bounds on offer terms. Anything above them is not a loan offer, and
/// keeping them bounded keeps every cost and accrual product representable.
pub const MAX_RATE_PCT: Percent = dec!(1000);
pub const MAX_FEE_PCT: Percent = dec!(1000);
pub const MAX_TERM_YEARS: Years = dec!(100);
pub const MAX_IN_SCHOOL_MONTHS: Months = dec!(1200);

const PERCENT_DIVISOR: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single education-loan offer as submitted by the student.
///
/// Offers are never mutated by the engine; every run works on fresh copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOffer {
    /// Display label. Blank names are replaced with `Loan N` at plan time.
    #[serde(default)]
    pub name: String,
    /// Annual nominal rate in percent (6.53 = 6.53%).
    pub interest_rate_pct: Percent,
    /// Share of principal withheld at disbursement, in percent.
    #[serde(default)]
    pub origination_fee_pct: Percent,
    /// Maximum principal drawable. `None` means uncapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowing_cap: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_years: Option<Years>,
    /// Months of accrual before repayment starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_school_months: Option<Months>,
    /// In-school interest is paid by a third party (e.g. subsidized federal loans).
    #[serde(default)]
    pub subsidized_in_school: bool,
}

impl LoanOffer {
    pub fn new(name: impl Into<String>, interest_rate_pct: Percent) -> Self {
        LoanOffer {
            name: name.into(),
            interest_rate_pct,
            origination_fee_pct: Decimal::ZERO,
            borrowing_cap: None,
            term_years: None,
            in_school_months: None,
            subsidized_in_school: false,
        }
    }

    pub fn with_fee(mut self, origination_fee_pct: Percent) -> Self {
        self.origination_fee_pct = origination_fee_pct;
        self
    }

    pub fn with_cap(mut self, borrowing_cap: Money) -> Self {
        self.borrowing_cap = Some(borrowing_cap);
        self
    }

    pub fn with_term(mut self, term_years: Years) -> Self {
        self.term_years = Some(term_years);
        self
    }

    pub fn with_in_school_months(mut self, months: Months) -> Self {
        self.in_school_months = Some(months);
        self
    }

    pub fn subsidized(mut self) -> Self {
        self.subsidized_in_school = true;
        self
    }

    /// Annual rate as a decimal (0.0653).
    pub fn rate(&self) -> Rate {
        self.interest_rate_pct / PERCENT_DIVISOR
    }

    /// Origination fee as a decimal share of principal.
    pub fn fee_rate(&self) -> Rate {
        self.origination_fee_pct / PERCENT_DIVISOR
    }

    /// Term floored at one year, defaulting to ten.
    pub fn effective_term_years(&self) -> Years {
        self.term_years
            .unwrap_or(DEFAULT_TERM_YEARS)
            .max(Decimal::ONE)
    }

    /// Accrual months floored at zero.
    pub fn effective_in_school_months(&self) -> Months {
        self.in_school_months
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    }

    /// Fee of 100% or more leaves nothing to disburse.
    pub fn fee_consumes_principal(&self) -> bool {
        self.origination_fee_pct >= PERCENT_DIVISOR
    }

    /// True when the offer can never contribute to a plan.
    pub fn is_degenerate(&self) -> bool {
        self.fee_consumes_principal()
            || self.borrowing_cap.is_some_and(|cap| cap <= Decimal::ZERO)
    }

    /// Principal that can be drawn. `None` is unlimited; degenerate offers
    /// report zero.
    pub fn principal_capacity(&self) -> Option<Money> {
        if self.fee_consumes_principal() {
            return Some(Decimal::ZERO);
        }
        self.borrowing_cap.map(|cap| cap.max(Decimal::ZERO))
    }

    /// Label used in plans: the trimmed name, or `Loan N` for blank names.
    pub fn label(&self, input_position: usize) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            placeholder_name(input_position)
        } else {
            trimmed.to_string()
        }
    }
}

/// Generated label for an unnamed offer at a zero-based input position.
pub fn placeholder_name(input_position: usize) -> String {
    format!("Loan {}", input_position + 1)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject offer sets the allocator must never see.
///
/// Degenerate offers (fee ≥ 100%, cap ≤ 0) pass: they are skipped, not errors.
pub fn validate_offers(offers: &[LoanOffer]) -> LoanMixResult<()> {
    if offers.is_empty() {
        return Err(LoanMixError::InsufficientData(
            "At least one loan offer is required".into(),
        ));
    }
    for (i, offer) in offers.iter().enumerate() {
        validate_offer(offer, &format!("offers[{i}]"))?;
    }
    Ok(())
}

/// Check one offer's terms. `path` prefixes the field in the error.
pub fn validate_offer(offer: &LoanOffer, path: &str) -> LoanMixResult<()> {
    if offer.interest_rate_pct < Decimal::ZERO {
        return Err(LoanMixError::InvalidInput {
            field: format!("{path}.interest_rate_pct"),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if offer.interest_rate_pct > MAX_RATE_PCT {
        return Err(LoanMixError::InvalidInput {
            field: format!("{path}.interest_rate_pct"),
            reason: format!("Interest rate cannot exceed {MAX_RATE_PCT}%"),
        });
    }
    if offer.origination_fee_pct < Decimal::ZERO {
        return Err(LoanMixError::InvalidInput {
            field: format!("{path}.origination_fee_pct"),
            reason: "Origination fee cannot be negative".into(),
        });
    }
    if offer.origination_fee_pct > MAX_FEE_PCT {
        return Err(LoanMixError::InvalidInput {
            field: format!("{path}.origination_fee_pct"),
            reason: format!("Origination fee cannot exceed {MAX_FEE_PCT}%"),
        });
    }
    if offer.term_years.is_some_and(|t| t > MAX_TERM_YEARS) {
        return Err(LoanMixError::InvalidInput {
            field: format!("{path}.term_years"),
            reason: format!("Term cannot exceed {MAX_TERM_YEARS} years"),
        });
    }
    if offer.in_school_months.is_some_and(|m| m > MAX_IN_SCHOOL_MONTHS) {
        return Err(LoanMixError::InvalidInput {
            field: format!("{path}.in_school_months"),
            reason: format!("In-school period cannot exceed {MAX_IN_SCHOOL_MONTHS} months"),
        });
    }
    Ok(())
}

/// Reject amounts outside `(0, MAX_AMOUNT]` (`allow_zero` admits zero).
pub fn validate_amount(amount: Money, field: &str, allow_zero: bool) -> LoanMixResult<()> {
    let too_small = if allow_zero {
        amount < Decimal::ZERO
    } else {
        amount <= Decimal::ZERO
    };
    if too_small {
        return Err(LoanMixError::InvalidInput {
            field: field.into(),
            reason: if allow_zero {
                "Amount cannot be negative".into()
            } else {
                "Amount must be positive".into()
            },
        });
    }
    if amount > MAX_AMOUNT {
        return Err(LoanMixError::InvalidInput {
            field: field.into(),
            reason: format!("Amount cannot exceed {MAX_AMOUNT}"),
        });
    }
    Ok(())
}
