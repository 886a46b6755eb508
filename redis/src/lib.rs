//! Redis wallet aggregate cache reader for the wallet end-to-end suite.
//!
//! The wallet service keeps a JSON snapshot of each wallet in Redis and
//! stamps it with the NATS sequence of the last applied event.
//! [`RedisWalletClient`] reads those snapshots and waits for them to catch up
//! with a given event, so assertions never race the projection.
//!
//! # Example
//!
//! ```no_run
//! use wallet_e2e_core::retry::RetryPolicy;
//! use wallet_e2e_redis::RedisWalletClient;
//! # use uuid::Uuid;
//!
//! # async fn example(wallet: Uuid) -> Result<(), wallet_e2e_redis::CacheError> {
//! let redis = RedisWalletClient::new("redis://127.0.0.1:6379", "wallet:").await?;
//! let aggregate = redis.wait_for_sequence(wallet, 12, &RetryPolicy::default()).await?;
//! println!("balance {}", aggregate.balance);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
pub mod error;

pub use client::RedisWalletClient;
pub use error::CacheError;
