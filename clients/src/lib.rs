//! # Wallet E2E Clients
//!
//! HTTP clients for the three APIs the suite drives:
//!
//! - [`ManagerClient`]: casino and sportsbook transactions, HMAC-signed
//! - [`PublicClient`]: player registration, game launch, limits and payments
//! - [`CapAdminClient`]: back-office blockers, limits and balance adjustments
//!
//! Non-success responses become [`ClientError::Api`], carrying the status and
//! the parsed `{code, message}` body when there is one.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rust_decimal::Decimal;
//! use wallet_e2e_clients::ManagerClient;
//! use wallet_e2e_clients::dto::manager::BetRequest;
//!
//! # async fn example() -> Result<(), wallet_e2e_clients::ClientError> {
//! let manager = ManagerClient::new("http://manager", "casino-1", "secret", Duration::from_secs(10))?;
//! let response = manager.bet(&BetRequest::new("session-token", Decimal::TEN)).await?;
//! println!("balance after bet: {}", response.balance);
//! # Ok(())
//! # }
//! ```

pub mod cap;
pub mod dto;
pub mod error;
pub mod http;
pub mod manager;
pub mod public;
pub mod signing;

pub use cap::CapAdminClient;
pub use error::ClientError;
pub use manager::ManagerClient;
pub use public::PublicClient;
pub use signing::RequestSigner;
