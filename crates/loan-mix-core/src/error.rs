use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanMixError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanMixError {
    fn from(e: serde_json::Error) -> Self {
        LoanMixError::SerializationError(e.to_string())
    }
}
