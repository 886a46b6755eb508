//! Error types for aggregate cache reads.

use thiserror::Error;
use uuid::Uuid;

/// Errors reading the wallet aggregate cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Could not open the client or connection manager
    #[error("Redis connection failed: {0}")]
    ConnectionFailed(String),

    /// A command failed
    #[error("Redis command on '{key}' failed: {reason}")]
    CommandFailed {
        /// Key the command targeted
        key: String,
        /// Error reported by the client
        reason: String,
    },

    /// No aggregate is cached for the wallet
    #[error("No aggregate cached under '{key}'")]
    NotFound {
        /// Key that was read
        key: String,
    },

    /// The cached value is not a wallet aggregate
    #[error("Aggregate under '{key}' could not be decoded: {reason}")]
    Decode {
        /// Key that was read
        key: String,
        /// Decoder error
        reason: String,
    },

    /// The aggregate never caught up with the expected event
    #[error(
        "Aggregate of wallet {wallet_uuid} did not reach sequence {expected} after {attempts} reads (last seen: {last_seen:?})"
    )]
    SequenceNotReached {
        /// Wallet polled
        wallet_uuid: Uuid,
        /// Sequence waited for
        expected: u64,
        /// `LastSeqNumber` of the final read, if any read succeeded
        last_seen: Option<u64>,
        /// Reads performed
        attempts: usize,
    },
}

/// Result alias for cache reads.
pub type Result<T> = std::result::Result<T, CacheError>;
