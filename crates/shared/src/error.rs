//! Errors for malformed request input.

use thiserror::Error;

use crate::types::IdCodecError;

/// Errors for request input the API could not parse.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A reference supplied by the client could not be resolved.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidReference(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
        }
    }
}

impl From<IdCodecError> for AppError {
    fn from(err: IdCodecError) -> Self {
        Self::InvalidReference(err.to_string())
    }
}
