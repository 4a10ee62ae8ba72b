//! Custom error types for potledger
//!
//! This module defines the error hierarchy for the ledger using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Referenced account, pot, schedule, transaction or event is absent
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The request was rejected before anything changed
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Durable storage rejected the new snapshot
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The persisted document could not be decoded
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors outside the ledger document
    #[error("I/O error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for pots
    pub fn pot_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Pot",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for transaction records
    pub fn transaction_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for transaction events
    pub fn event_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Event",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for income/transfer schedules and scheduled payments
    pub fn schedule_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Schedule",
            identifier: identifier.to_string(),
        }
    }

    /// Shorthand for [`LedgerError::InvalidOperation`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invalid-operation error
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    /// Whether retrying the same call may succeed
    ///
    /// Only storage failures are transient; everything else was rejected
    /// before the ledger changed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Io(_))
    }

    /// Message suitable for showing to a person
    pub fn user_message(&self) -> String {
        if self.is_retryable() {
            format!("Storage error, please retry. ({})", self)
        } else {
            format!("Nothing was changed: {}", self)
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedSnapshot(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::invalid("insufficient balance");
        assert_eq!(err.to_string(), "Invalid operation: insufficient balance");
    }

    #[test]
    fn test_not_found_error() {
        let err = LedgerError::account_not_found("acc-7");
        assert_eq!(err.to_string(), "Account not found: acc-7");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_message_distinguishes_storage_failures() {
        let err = LedgerError::Persistence("disk full".into());
        assert!(err.is_retryable());
        assert!(err.user_message().starts_with("Storage error, please retry."));

        let err = LedgerError::pot_not_found("pot-3");
        assert!(err.user_message().starts_with("Nothing was changed:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ledger_err: LedgerError = io_err.into();
        assert!(matches!(ledger_err, LedgerError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let ledger_err: LedgerError = json_err.into();
        assert!(matches!(ledger_err, LedgerError::MalformedSnapshot(_)));
    }
}
