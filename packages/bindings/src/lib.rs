use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use loan_mix_core::allocation::offer::{validate_offer, LoanOffer};
use loan_mix_core::allocation::{cost_model, plan, stats};
use loan_mix_core::{explain, intake};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[napi]
pub fn optimize_mix(input_json: String) -> NapiResult<String> {
    let input: plan::AllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = plan::optimize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_costs(input_json: String) -> NapiResult<String> {
    let input: cost_model::CostComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cost_model::compare_costs(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Cost per dollar of a single offer, returned as a decimal string.
#[napi]
pub fn cost_per_dollar(offer_json: String) -> NapiResult<String> {
    let offer: LoanOffer = serde_json::from_str(&offer_json).map_err(to_napi_error)?;
    validate_offer(&offer, "offer").map_err(to_napi_error)?;
    let cpd: Decimal = cost_model::cost_per_dollar(&offer);
    Ok(cpd.to_string())
}

#[napi]
pub fn loan_stats(input_json: String) -> NapiResult<String> {
    let input: stats::LoanStatsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = stats::calculate_loan_stats(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Intake
// ---------------------------------------------------------------------------

#[napi]
pub fn intake_form(input_json: String) -> NapiResult<String> {
    let input: intake::form::FormSubmission =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = intake::form::intake_form(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn intake_extraction(input_json: String) -> NapiResult<String> {
    let input: intake::extraction::ExtractionDocument =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = intake::extraction::intake_extraction(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Explanation
// ---------------------------------------------------------------------------

/// Build the summarization request from a plan the page already holds.
#[napi]
pub fn explanation_request(plan_json: String) -> NapiResult<String> {
    let plan: plan::Plan = serde_json::from_str(&plan_json).map_err(to_napi_error)?;
    let request = explain::build_explanation_request(&plan);
    serde_json::to_string(&request).map_err(to_napi_error)
}

/// Text to display for a summarization service response body.
#[napi]
pub fn explanation_text(response_body: String) -> String {
    explain::explanation_text(&response_body)
}
