use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::allocation::optimizer::TargetBasis;
use crate::intake::coerce::{coerce_flag, coerce_json};
use crate::intake::{build_offer, build_target, LoanApplication, RawOffer};
use crate::types::{with_metadata, ComputationOutput};
use crate::{LoanMixError, LoanMixResult};

/// A loan as returned by the free-text extraction service. Every field may be
/// missing, `null`, a number or a numeric string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLoan {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default, alias = "interest_rate_pct", alias = "interestRatePercent")]
    pub interest_rate: Option<Value>,
    #[serde(default, alias = "origination_fee_pct", alias = "originationFeePercent")]
    pub fee_pct: Option<Value>,
    #[serde(default, alias = "borrowing_cap", alias = "borrowingCap")]
    pub cap: Option<Value>,
    #[serde(default, alias = "term_years", alias = "repaymentTermYears")]
    pub term_years: Option<Value>,
    #[serde(default, alias = "in_school_months", alias = "inSchoolMonths")]
    pub accrual_months: Option<Value>,
    #[serde(default, alias = "subsidized_in_school", alias = "subsidizedInSchool")]
    pub subsidized: Option<Value>,
}

/// Extraction service response: `{ target, loans: [...], errors: [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionDocument {
    #[serde(default)]
    pub target: Option<Value>,
    #[serde(default, alias = "targetBasis")]
    pub target_basis: TargetBasis,
    #[serde(default)]
    pub loans: Vec<ExtractedLoan>,
    /// Ambiguities the extractor reported itself.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Coerce an extraction document into an application. The extractor's own
/// `errors` are passed through as warnings ahead of coercion notes.
pub fn intake_extraction(
    input: &ExtractionDocument,
) -> LoanMixResult<ComputationOutput<LoanApplication>> {
    let start = Instant::now();
    let mut notes: Vec<String> = input
        .errors
        .iter()
        .map(|e| format!("extractor: {e}"))
        .collect();

    let target = build_target(coerce_json(input.target.as_ref()))?;

    if input.loans.is_empty() {
        return Err(LoanMixError::InsufficientData(
            "No loans were found in the text".into(),
        ));
    }

    let offers = input
        .loans
        .iter()
        .enumerate()
        .map(|(i, loan)| {
            let raw = RawOffer {
                name: loan_name(loan.name.as_ref()),
                interest_rate: coerce_json(loan.interest_rate.as_ref()),
                origination_fee: coerce_json(loan.fee_pct.as_ref()),
                borrowing_cap: coerce_json(loan.cap.as_ref()),
                term_years: coerce_json(loan.term_years.as_ref()),
                in_school_months: coerce_json(loan.accrual_months.as_ref()),
                subsidized: coerce_flag(loan.subsidized.as_ref()),
            };
            build_offer(raw, i, &mut notes)
        })
        .collect();

    let application = LoanApplication {
        target,
        target_basis: input.target_basis,
        offers,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Extraction intake — loose JSON values coerced with field defaults",
        &serde_json::json!({
            "loans": input.loans.len(),
            "extractor_errors": input.errors.len(),
        }),
        notes,
        elapsed,
        application,
    ))
}

fn loan_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
