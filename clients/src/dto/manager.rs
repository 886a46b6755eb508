//! Manager API request and response bodies.
//!
//! Requests are built with a session token and an amount; transaction and
//! round ids are generated so every call is unique unless a test sets them.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wallet_e2e_core::transaction::{BettingPaymentType, GamblingBetType, GamblingWinType};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Body of `POST /bet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetRequest {
    /// Game session token
    pub session_token: String,
    /// Stake
    pub amount: Decimal,
    /// Provider transaction id
    pub transaction_id: String,
    /// Bet type
    #[serde(rename = "type")]
    pub bet_type: GamblingBetType,
    /// Game round
    pub round_id: String,
    /// Whether the round ends with this bet
    pub round_closed: bool,
}

impl BetRequest {
    /// A regular `BET` with fresh transaction and round ids.
    #[must_use]
    pub fn new(session_token: impl Into<String>, amount: Decimal) -> Self {
        Self {
            session_token: session_token.into(),
            amount,
            transaction_id: new_id(),
            bet_type: GamblingBetType::Bet,
            round_id: new_id(),
            round_closed: false,
        }
    }

    /// Builder: set bet type
    #[must_use]
    pub const fn with_type(mut self, bet_type: GamblingBetType) -> Self {
        self.bet_type = bet_type;
        self
    }

    /// Builder: set transaction id
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }

    /// Builder: set round id
    #[must_use]
    pub fn with_round_id(mut self, round_id: impl Into<String>) -> Self {
        self.round_id = round_id.into();
        self
    }

    /// Builder: close the round
    #[must_use]
    pub const fn closing_round(mut self) -> Self {
        self.round_closed = true;
        self
    }
}

/// Body of `POST /win`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRequest {
    /// Game session token
    pub session_token: String,
    /// Payout
    pub amount: Decimal,
    /// Provider transaction id
    pub transaction_id: String,
    /// Win type
    #[serde(rename = "type")]
    pub win_type: GamblingWinType,
    /// Game round
    pub round_id: String,
    /// Whether the round ends with this win
    pub round_closed: bool,
}

impl WinRequest {
    /// A regular `WIN` closing a fresh round.
    #[must_use]
    pub fn new(session_token: impl Into<String>, amount: Decimal) -> Self {
        Self {
            session_token: session_token.into(),
            amount,
            transaction_id: new_id(),
            win_type: GamblingWinType::Win,
            round_id: new_id(),
            round_closed: true,
        }
    }

    /// Builder: set win type
    #[must_use]
    pub const fn with_type(mut self, win_type: GamblingWinType) -> Self {
        self.win_type = win_type;
        self
    }

    /// Builder: settle the round of an earlier bet
    #[must_use]
    pub fn for_round(mut self, round_id: impl Into<String>) -> Self {
        self.round_id = round_id.into();
        self
    }

    /// Builder: set transaction id
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }
}

/// Body of `POST /refund`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// Game session token
    pub session_token: String,
    /// Amount returned, equal to the stake
    pub amount: Decimal,
    /// Provider transaction id of the refund
    pub transaction_id: String,
    /// Bet being refunded
    pub bet_transaction_id: String,
    /// Round of the bet
    pub round_id: String,
    /// Whether the round ends with this refund
    pub round_closed: bool,
}

impl RefundRequest {
    /// Refund of the bet `bet`.
    #[must_use]
    pub fn of(bet: &BetRequest) -> Self {
        Self {
            session_token: bet.session_token.clone(),
            amount: bet.amount,
            transaction_id: new_id(),
            bet_transaction_id: bet.transaction_id.clone(),
            round_id: bet.round_id.clone(),
            round_closed: true,
        }
    }

    /// Builder: set transaction id
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }

    /// Builder: target another transaction
    #[must_use]
    pub fn targeting(mut self, bet_transaction_id: impl Into<String>) -> Self {
        self.bet_transaction_id = bet_transaction_id.into();
        self
    }
}

/// Body of `POST /rollback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    /// Game session token
    pub session_token: String,
    /// Amount returned, equal to the stake
    pub amount: Decimal,
    /// Provider transaction id of the rollback
    pub transaction_id: String,
    /// Transaction being rolled back
    pub rollback_transaction_id: String,
    /// Round of the rolled-back transaction
    pub round_id: String,
    /// Whether the round ends with this rollback
    pub round_closed: bool,
}

impl RollbackRequest {
    /// Rollback of the bet `bet`.
    #[must_use]
    pub fn of(bet: &BetRequest) -> Self {
        Self {
            session_token: bet.session_token.clone(),
            amount: bet.amount,
            transaction_id: new_id(),
            rollback_transaction_id: bet.transaction_id.clone(),
            round_id: bet.round_id.clone(),
            round_closed: true,
        }
    }

    /// Rollback aimed at an arbitrary transaction, e.g. a win.
    #[must_use]
    pub fn targeting(
        session_token: impl Into<String>,
        transaction_id: impl Into<String>,
        round_id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            session_token: session_token.into(),
            amount,
            transaction_id: new_id(),
            rollback_transaction_id: transaction_id.into(),
            round_id: round_id.into(),
            round_closed: true,
        }
    }
}

/// Body of `POST /tournament`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRequest {
    /// Game session token
    pub session_token: String,
    /// Prize
    pub amount: Decimal,
    /// Provider transaction id
    pub transaction_id: String,
    /// Tournament awarding the prize
    pub tournament_id: String,
    /// Game round
    pub round_id: String,
}

impl TournamentRequest {
    /// A prize from a fresh tournament.
    #[must_use]
    pub fn new(session_token: impl Into<String>, amount: Decimal) -> Self {
        Self {
            session_token: session_token.into(),
            amount,
            transaction_id: new_id(),
            tournament_id: new_id(),
            round_id: new_id(),
        }
    }
}

/// Body of `POST /make-payment` (sportsbook).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakePaymentRequest {
    /// Player token
    pub token: String,
    /// Sportsbook bet id
    pub bet_id: i64,
    /// Amount
    pub amount: Decimal,
    /// Payment type
    #[serde(rename = "type")]
    pub payment_type: BettingPaymentType,
    /// Currency
    pub currency: String,
    /// Bet description shown in history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet_info: Option<String>,
}

impl MakePaymentRequest {
    /// A sportsbook stake on a fresh bet id.
    #[must_use]
    pub fn bet(token: impl Into<String>, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            bet_id: rand::thread_rng().gen_range(1..=i64::MAX),
            amount,
            payment_type: BettingPaymentType::Bet,
            currency: currency.into(),
            bet_info: None,
        }
    }

    /// Settlement of this bet with another payment type.
    #[must_use]
    pub fn settle(&self, payment_type: BettingPaymentType, amount: Decimal) -> Self {
        Self {
            amount,
            payment_type,
            bet_info: None,
            ..self.clone()
        }
    }

    /// Builder: describe the bet
    #[must_use]
    pub fn with_bet_info(mut self, info: impl Into<String>) -> Self {
        self.bet_info = Some(info.into());
        self
    }
}

/// Response of every Manager API transaction endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Platform transaction id
    pub transaction_id: String,
    /// Balance after the transaction
    pub balance: Decimal,
}
