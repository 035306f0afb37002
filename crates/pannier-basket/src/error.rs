//! Error types for basket operations.

use thiserror::Error;

/// Result type alias for basket operations.
pub type Result<T> = std::result::Result<T, BasketError>;

/// Errors that can occur during basket operations.
#[derive(Debug, Error)]
pub enum BasketError {
    /// The caller presented no usable identity.
    #[error("caller identity is missing")]
    Unauthenticated,

    /// The request payload failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of what was invalid.
        message: String,
    },

    /// The basket (or its write target) was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// The storage layer failed or is unavailable.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Serialization/deserialization of a stored snapshot failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An internal invariant was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl BasketError {
    /// Creates a validation error with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<pannier_core::Error> for BasketError {
    fn from(err: pannier_core::Error) -> Self {
        use pannier_core::Error;

        match err {
            Error::InvalidId { message } => Self::Validation { message },
            Error::InvalidInput(message) => Self::Validation { message },
            Error::NotFound(message) => Self::NotFound { message },
            Error::Storage { message, .. } | Error::PreconditionFailed { message } => {
                Self::Storage { message }
            }
            Error::Serialization { message } => Self::Serialization { message },
            Error::Internal { message } => Self::Internal { message },
        }
    }
}
