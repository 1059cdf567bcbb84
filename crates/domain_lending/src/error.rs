//! Lending domain errors

use thiserror::Error;

/// Errors that can occur in the lending domain
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LendingError {
    /// A caller-supplied value is outside its domain
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        field: String,
        reason: String,
    },

    /// No schedule entry carries this payment number
    #[error("Payment not found: #{0}")]
    PaymentNotFound(u32),

    /// The schedule entry has already been paid
    #[error("Payment #{0} is already paid")]
    AlreadyPaid(u32),
}

impl LendingError {
    /// Creates an InvalidInput error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LendingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for lending computations
pub type LendingResult<T> = Result<T, LendingError>;
