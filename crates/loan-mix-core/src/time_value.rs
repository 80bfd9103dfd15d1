use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LoanMixError;
use crate::types::{Money, Months, Rate};
use crate::LoanMixResult;

pub const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Simple (non-compounding) interest accrued over a number of months.
pub fn simple_interest(principal: Money, annual_rate: Rate, months: Months) -> Money {
    principal * annual_rate * months / MONTHS_PER_YEAR
}

/// Level payment (PMT) that retires `present_value` over `nper` periods.
///
/// Returned as a positive amount owed per period. A zero rate degrades to
/// straight-line repayment.
pub fn level_payment(rate: Rate, nper: u32, present_value: Money) -> LoanMixResult<Money> {
    if nper == 0 {
        return Err(LoanMixError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r
        .checked_powu(u64::from(nper))
        .ok_or_else(|| LoanMixError::ArithmeticOverflow {
            context: format!("PMT compounding factor over {nper} periods"),
        })?;
    let annuity_factor = factor - Decimal::ONE;

    if annuity_factor.is_zero() {
        return Err(LoanMixError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    present_value
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(annuity_factor))
        .ok_or_else(|| LoanMixError::ArithmeticOverflow {
            context: "PMT payment amount".into(),
        })
}
