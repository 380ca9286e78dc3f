use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Internal,
}

/// Every way a submission can end in the error state. `Display` is the text shown
/// to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormError {
    #[error("Domain can only contain letters, numbers, and hyphens")]
    InvalidDomain,
    #[error("Please enter a valid NEAR wallet address")]
    InvalidWallet,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("An error occurred. Please try again.")]
    UnexpectedFailure,
}

impl FormError {
    pub fn code(self) -> ErrorCode {
        match self {
            FormError::InvalidDomain | FormError::InvalidWallet | FormError::InvalidEmail => {
                ErrorCode::Validation
            }
            FormError::UnexpectedFailure => ErrorCode::Internal,
        }
    }
}
