//! # Wallet E2E Core
//!
//! Domain types and verification primitives for the wallet end-to-end suite.
//!
//! The suite drives a deployed wallet platform and checks, after every
//! business operation, that the event stream, the projection topic, the cached
//! aggregate and the history tables agree with each other and with an
//! expectation model. This crate holds everything that does not talk to a
//! backend:
//!
//! - **Domain**: the cached [`aggregate`], [`transaction`] classification,
//!   turnover [`limit`]s, NATS [`event`]s and Kafka [`projection`] records
//! - **Errors**: platform error codes ([`error`])
//! - **Waiting**: the [`event_bus::MessageSource`] seam, bounded
//!   [`expectation`]s on message streams, and [`retry`]/polling
//! - **Oracle**: the [`model::WalletModel`] predicting each operation's outcome
//!
//! ## Example
//!
//! ```ignore
//! use wallet_e2e_core::model::{WalletCommand, WalletModel};
//! use wallet_e2e_core::transaction::GamblingBetType;
//!
//! let mut model = WalletModel::new("EUR", dec!(100));
//! let outcome = model.execute(&WalletCommand::Bet {
//!     transaction_id: "tx-1".into(),
//!     amount: dec!(10),
//!     bet_type: GamblingBetType::Bet,
//! })?;
//! assert_eq!(outcome.balance, dec!(90));
//! ```

pub use rust_decimal::Decimal;
pub use uuid::Uuid;

/// Wallet aggregate as cached in Redis.
pub mod aggregate;

/// Platform API error codes.
pub mod error;

/// NATS wallet events and their payloads.
pub mod event;

/// Message source abstraction shared by the NATS and Kafka adapters.
pub mod event_bus;

/// Bounded waits on message streams.
pub mod expectation;

/// Turnover limits.
pub mod limit;

/// Expectation model of a wallet.
pub mod model;

/// Kafka wallet projection records.
pub mod projection;

/// Retry and polling with backoff.
pub mod retry;

/// Operation classification.
pub mod transaction;
