//! Error definitions
//!
//! This module provides error types for task-facility.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// Main error type for task-facility
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A caller supplied an argument the operation cannot work with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A submitted work item panicked while executing.
    #[error("Work item failed: {0}")]
    WorkItemFailure(String),

    /// Waiting on a work item exceeded the given timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A completion lost its producer before a value was delivered.
    #[error("Result channel closed before a value was delivered")]
    Disconnected,
}

impl Error {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a work item failure error.
    #[must_use]
    pub fn work_item_failure(message: impl Into<String>) -> Self {
        Self::WorkItemFailure(message.into())
    }

    /// Create a work item failure from a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::WorkItemFailure(panic_message(payload))
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = Error::invalid_argument("filename has to be provided");
        assert_eq!(
            err.to_string(),
            "Invalid argument: filename has to be provided"
        );
    }

    #[test]
    fn test_panic_message_str_payload() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_panic_message_string_payload() {
        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(
            Error::from_panic(payload.as_ref()),
            Error::WorkItemFailure("code 7".to_string())
        );
    }

    #[test]
    fn test_panic_message_other_payload() {
        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
