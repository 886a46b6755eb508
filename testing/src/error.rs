//! Errors surfaced by the harness.

use thiserror::Error;
use wallet_e2e_clients::ClientError;
use wallet_e2e_core::event::EventError;
use wallet_e2e_core::event_bus::BusError;
use wallet_e2e_core::model::ModelRejection;
use wallet_e2e_postgres::DatabaseError;
use wallet_e2e_redis::CacheError;

/// Any failure while driving or observing the wallet stack.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// An API call failed or was rejected
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A bus subscription or wait failed
    #[error(transparent)]
    Bus(#[from] BusError),

    /// A wallet event payload did not decode
    #[error(transparent)]
    Event(#[from] EventError),

    /// The aggregate cache could not be read or never caught up
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The history database could not be read
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The expectation model refused a command the step was asked to perform
    #[error("Model rejected command: {0}")]
    Model(#[from] ModelRejection),

    /// The stack is not in the shape a step needs
    #[error("Setup failed: {0}")]
    Setup(String),

    /// Two systems disagree
    #[error("Mismatch: {0}")]
    Mismatch(String),
}

/// Result alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
