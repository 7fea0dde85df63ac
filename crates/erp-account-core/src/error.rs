use chrono::NaiveDate;
use thiserror::Error;

use crate::types::Currency;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("No exchange rate from {from} to {to} on or before {date}")]
    CurrencyConversion {
        from: Currency,
        to: Currency,
        date: NaiveDate,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AccountError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AccountError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(e: serde_json::Error) -> Self {
        AccountError::SerializationError(e.to_string())
    }
}
