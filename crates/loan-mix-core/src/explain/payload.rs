use serde::{Deserialize, Serialize};

use crate::allocation::plan::Plan;
use crate::types::{Money, Percent, Ratio};

/// Shown when the summarization service returns nothing usable.
pub const FALLBACK_EXPLANATION: &str = "No explanation available.";

/// One line of the allocation as the summarization service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainedLoan {
    pub name: String,
    pub interest_rate_pct: Percent,
    pub origination_fee_pct: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrowing_cap: Option<Money>,
    pub principal_used: Money,
    pub origination_fee: Money,
    pub cost_per_dollar: Ratio,
}

/// Request body for the summarization service. Field names follow the
/// service contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub target: Money,
    pub allocation: Vec<ExplainedLoan>,
    #[serde(rename = "blendedCPD")]
    pub blended_cpd: Ratio,
    pub feasible: bool,
    pub shortfall: Money,
}

/// Response body: either `{ explanation }` or `{ error }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExplanationResponse {
    /// Text to show the student verbatim. Service failures degrade to a
    /// message; they never touch the plan.
    pub fn display_text(&self) -> String {
        if let Some(text) = self.explanation.as_deref().map(str::trim) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
        match self.error.as_deref().map(str::trim) {
            Some(err) if !err.is_empty() => format!("Explanation unavailable: {err}"),
            _ => FALLBACK_EXPLANATION.to_string(),
        }
    }
}

/// Build the summarization request from a plan the caller already holds.
pub fn build_explanation_request(plan: &Plan) -> ExplanationRequest {
    let allocation = plan
        .loans
        .iter()
        .map(|loan| {
            let offer = &loan.allocation.offer;
            ExplainedLoan {
                name: offer.name.clone(),
                interest_rate_pct: offer.interest_rate_pct,
                origination_fee_pct: offer.origination_fee_pct,
                borrowing_cap: offer.borrowing_cap,
                principal_used: loan.allocation.principal_used,
                origination_fee: loan.stats.origination_fee,
                cost_per_dollar: loan.allocation.cost_per_dollar,
            }
        })
        .collect();

    ExplanationRequest {
        target: plan.target,
        allocation,
        blended_cpd: plan.summary.blended_cost_per_dollar,
        feasible: plan.is_feasible(),
        shortfall: plan.shortfall,
    }
}

/// Parse the service's JSON body into display text. Unparsable bodies fall
/// back to the default message.
pub fn explanation_text(body: &str) -> String {
    serde_json::from_str::<ExplanationResponse>(body)
        .unwrap_or_default()
        .display_text()
}
