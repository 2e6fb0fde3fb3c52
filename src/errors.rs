//! Error taxonomy for the wagering engine.
//!
//! Nothing here is fatal to the process: every variant is scoped to one
//! account's one operation and is reported back to the collaborator that
//! triggered it.

use crate::AccountId;

/// Failures an engine operation can report.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed or out-of-range bet or game parameter. No state change.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Bet or withdrawal exceeds the account balance. No state change.
    #[error("insufficient funds: balance {balance:.2}, required {required:.2}")]
    InsufficientFunds { balance: f64, required: f64 },

    /// A bet arrived while the account already has a live session.
    #[error("account {0} already has an active session")]
    SessionConflict(AccountId),

    /// The event references no session, or a session of a different game.
    #[error("no matching session for account {0}")]
    UnknownSession(AccountId),

    /// The event does not fit the session's current phase or position.
    #[error("invalid step: {0}")]
    InvalidStep(String),

    /// The storage collaborator failed; retryable, never assumed successful.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InsufficientFunds {
            balance: 5.0,
            required: 10.0,
        };
        assert!(err.to_string().contains("5.00"));
        assert!(err.to_string().contains("10.00"));

        let err = EngineError::SessionConflict(42);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_validation_error_carries_field() {
        let err = EngineError::Validation {
            field: "mine_count",
            reason: "30 is out of range 1-24".to_string(),
        };
        assert!(err.to_string().contains("mine_count"));
        assert!(err.to_string().contains("30"));
    }
}
