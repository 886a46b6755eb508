//! Error codes returned by the wallet platform APIs.
//!
//! Business-rule and validation failures come back as HTTP 400 with a
//! structured body:
//!
//! ```json
//! { "code": "ROLLBACK_NOT_ALLOWED", "message": "transaction already rolled back" }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Structured `{code, message}` body of a rejected API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable description
    #[serde(default)]
    pub message: String,
}

impl ApiErrorBody {
    /// Parse an error body, returning `None` when the payload is not structured.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Error codes the suite asserts on.
///
/// Unknown codes are preserved in [`ErrorCode::Other`] so a changed platform
/// response still produces a readable assertion failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Second reversal of a bet, or reversal of a win-class transaction
    RollbackNotAllowed,
    /// Malformed request (bad amount, missing field)
    ValidationError,
    /// Request without a session or bearer token
    MissingToken,
    /// Stake or withdrawal larger than the available funds
    InsufficientBalance,
    /// Wager would exceed an active turnover limit
    LimitReached,
    /// Reversal of a transaction the platform does not know
    TransactionNotFound,
    /// Gambling disabled for the player
    GamblingBlocked,
    /// Betting disabled for the player
    BettingBlocked,
    /// Any other code
    Other(String),
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RollbackNotAllowed => "ROLLBACK_NOT_ALLOWED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::LimitReached => "LIMIT_REACHED",
            Self::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            Self::GamblingBlocked => "GAMBLING_BLOCKED",
            Self::BettingBlocked => "BETTING_BLOCKED",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "ROLLBACK_NOT_ALLOWED" => Self::RollbackNotAllowed,
            "VALIDATION_ERROR" => Self::ValidationError,
            "MISSING_TOKEN" => Self::MissingToken,
            "INSUFFICIENT_BALANCE" => Self::InsufficientBalance,
            "LIMIT_REACHED" => Self::LimitReached,
            "TRANSACTION_NOT_FOUND" => Self::TransactionNotFound,
            "GAMBLING_BLOCKED" => Self::GamblingBlocked,
            "BETTING_BLOCKED" => Self::BettingBlocked,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from(code.as_str()))
    }
}
