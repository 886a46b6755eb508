//! A player registered for one scenario.

use crate::error::{HarnessError, Result};
use rust_decimal::Decimal;
use uuid::Uuid;
use wallet_e2e_clients::PublicClient;
use wallet_e2e_core::model::WalletModel;

/// A freshly registered player, their wallet and its expected state.
#[derive(Debug, Clone)]
pub struct RegisteredPlayer {
    /// Player id
    pub player_uuid: Uuid,
    /// Wallet id
    pub wallet_uuid: Uuid,
    /// Generated login
    pub username: String,
    /// Player bearer token
    pub token: String,
    /// Public API client authenticated as this player
    pub public: PublicClient,
    /// Game session token, once a game was launched
    pub session_token: Option<String>,
    /// NATS subject of the wallet
    pub subject: String,
    /// Expected wallet state
    pub model: WalletModel,
    /// Sequence of the last wallet event the suite observed
    pub last_sequence: u64,
}

impl RegisteredPlayer {
    /// Wallet currency.
    #[must_use]
    pub fn currency(&self) -> &str {
        self.model.currency()
    }

    /// Expected balance.
    #[must_use]
    pub const fn expected_balance(&self) -> Decimal {
        self.model.balance()
    }

    /// Game session token of the launched game.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Setup`] if no game was launched for this player.
    pub fn try_session(&self) -> Result<&str> {
        self.session_token.as_deref().ok_or_else(|| {
            HarnessError::Setup(format!("no game launched for player {}", self.player_uuid))
        })
    }

    /// Game session token, or an empty token if no game was launched.
    ///
    /// Only for checking that the Manager API rejects a missing token.
    #[must_use]
    pub fn session_or_empty(&self) -> &str {
        self.session_token.as_deref().unwrap_or_default()
    }

    /// Record that the suite has seen the event with `sequence`.
    pub fn observe(&mut self, sequence: u64) {
        self.last_sequence = self.last_sequence.max(sequence);
    }
}
