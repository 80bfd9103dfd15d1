pub mod error;
pub mod time_value;
pub mod types;

pub mod allocation;

#[cfg(feature = "intake")]
pub mod intake;

#[cfg(feature = "explain")]
pub mod explain;

pub use error::LoanMixError;
pub use types::*;

/// Standard result type for all loan-mix operations
pub type LoanMixResult<T> = Result<T, LoanMixError>;
