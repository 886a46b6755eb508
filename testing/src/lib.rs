//! # Wallet E2E Testing
//!
//! Harness for the wallet end-to-end scenarios.
//!
//! This crate provides:
//! - [`Config`] loaded from the environment and `.env`
//! - [`TestContext`], owning every API client and backend connection
//! - [`DefaultTestSteps`], the register/bet/deposit/limit steps scenarios share
//! - [`assertions`] comparing the cached aggregate with the expectation model
//! - [`InMemoryMessageSource`] and [`ModelTest`] for offline tests
//!
//! ## Example
//!
//! ```ignore
//! use wallet_e2e_testing::{TestContext, fixtures};
//!
//! #[tokio::test]
//! #[ignore = "requires deployed wallet stack"]
//! async fn bet_debits_balance() -> anyhow::Result<()> {
//!     let ctx = TestContext::from_env().await?;
//!     let steps = ctx.steps();
//!     let mut player = steps.register_player(fixtures::INITIAL_BALANCE).await?;
//!     steps.launch_game(&mut player).await?;
//!
//!     let (_, bet) = steps.place_bet(&mut player, fixtures::STAKE).await?;
//!     assert_eq!(bet.aggregate.balance, dec!(90));
//!     Ok(())
//! }
//! ```

/// Assertions shared by the scenarios.
pub mod assertions;

/// Suite configuration.
pub mod config;

/// Shared test fixture.
pub mod context;

/// Harness errors.
pub mod error;

/// Amounts and command builders.
pub mod fixtures;

/// In-memory message source.
pub mod in_memory;

/// Tracing setup.
pub mod logging;

/// Given-When-Then model tests.
pub mod model_test;

/// Registered player state.
pub mod player;

/// Default scenario steps.
pub mod steps;

pub use config::Config;
pub use context::TestContext;
pub use error::{HarnessError, Result};
pub use in_memory::InMemoryMessageSource;
pub use logging::init_tracing;
pub use model_test::ModelTest;
pub use player::RegisteredPlayer;
pub use steps::{Confirmed, DefaultTestSteps};
