pub mod cost_model;
pub mod offer;
pub mod optimizer;
pub mod plan;
pub mod stats;

pub use cost_model::{cost_per_dollar, rank_offers};
pub use offer::LoanOffer;
pub use optimizer::{allocate, AllocationEntry, TargetBasis};
pub use plan::{optimize, AllocationInput, Plan, PlannedLoan};
pub use stats::{compute_loan_stats, LoanStats, PlanSummary};
