pub mod payload;

use std::time::Instant;

use crate::allocation::plan::{optimize, AllocationInput};
use crate::types::{with_metadata, ComputationOutput};
use crate::LoanMixResult;

pub use payload::{build_explanation_request, explanation_text, ExplanationRequest, ExplanationResponse};

/// Optimize and package the plan for the summarization service in one step.
pub fn prepare_explanation(
    input: &AllocationInput,
) -> LoanMixResult<ComputationOutput<ExplanationRequest>> {
    let start = Instant::now();

    let plan_output = optimize(input)?;
    let request = build_explanation_request(&plan_output.result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Explanation payload — greedy plan summarised for narrative generation",
        &plan_output.assumptions,
        plan_output.warnings,
        elapsed,
        request,
    ))
}
