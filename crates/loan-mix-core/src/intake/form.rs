use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocation::optimizer::TargetBasis;
use crate::intake::coerce::coerce_str;
use crate::intake::{build_offer, build_target, LoanApplication, RawOffer};
use crate::types::{with_metadata, ComputationOutput};
use crate::{LoanMixError, LoanMixResult};

/// One loan row exactly as typed into the form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanFormRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub interest_rate: String,
    #[serde(default)]
    pub origination_fee: String,
    #[serde(default)]
    pub borrowing_cap: String,
    #[serde(default)]
    pub term_years: String,
    #[serde(default)]
    pub in_school_months: String,
    #[serde(default)]
    pub subsidized_in_school: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmission {
    pub target: String,
    #[serde(default)]
    pub target_basis: TargetBasis,
    pub rows: Vec<LoanFormRow>,
}

/// Turn raw form text into a validated application.
pub fn intake_form(input: &FormSubmission) -> LoanMixResult<ComputationOutput<LoanApplication>> {
    let start = Instant::now();
    let mut notes: Vec<String> = Vec::new();

    let target = build_target(coerce_str(&input.target))?;

    if input.rows.is_empty() {
        return Err(LoanMixError::InsufficientData(
            "Enter at least one loan option".into(),
        ));
    }

    let offers = input
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let raw = RawOffer {
                name: row.name.clone(),
                interest_rate: coerce_str(&row.interest_rate),
                origination_fee: coerce_str(&row.origination_fee),
                borrowing_cap: coerce_str(&row.borrowing_cap),
                term_years: coerce_str(&row.term_years),
                in_school_months: coerce_str(&row.in_school_months),
                subsidized: row.subsidized_in_school,
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
        "Form intake — tolerant numeric parsing with field defaults",
        &serde_json::json!({ "rows": input.rows.len() }),
        notes,
        elapsed,
        application,
    ))
}
