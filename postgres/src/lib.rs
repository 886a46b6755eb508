//! `PostgreSQL` transaction-history reader for the wallet end-to-end suite.
//!
//! The wallet platform projects every gambling and sportsbook movement into
//! history tables. Tests read them to confirm that an operation was recorded
//! with the right amount and sequence, and to resolve transactions that have
//! already left the Redis aggregate.
//!
//! # Example
//!
//! ```no_run
//! use wallet_e2e_core::retry::RetryPolicy;
//! use wallet_e2e_postgres::WalletDatabaseClient;
//!
//! # async fn example() -> Result<(), wallet_e2e_postgres::DatabaseError> {
//! let db = WalletDatabaseClient::new("postgres://localhost/wallet", 5).await?;
//! let row = db.wait_for_gambling_transaction("tx-1", &RetryPolicy::default()).await?;
//! println!("{} {} at sequence {}", row.operation, row.amount, row.seqnumber);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
pub mod error;
pub mod rows;

pub use client::WalletDatabaseClient;
pub use error::DatabaseError;
pub use rows::{BettingTransactionRow, GamblingTransactionRow};
