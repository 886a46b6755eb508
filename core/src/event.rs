//! Wallet events published on NATS.
//!
//! Every wallet has its own subject,
//! `{prefix}.wallet.v2.{player_uuid}.{wallet_uuid}`, on a JetStream stream. The
//! event name travels in the `type` header and the body is JSON. The stream
//! sequence of a message is the value the Redis aggregate reports as
//! `LastSeqNumber` once the event is applied, and the value the Kafka
//! projection carries as `seq_number`.
//!
//! Payloads are kept as raw JSON and decoded on demand into the typed structs
//! below, so an event type the suite does not model still flows through
//! expectations untouched.

use crate::event_bus::TypedMessage;
use crate::limit::IntervalType;
use crate::transaction::{BettingPaymentType, GamblingBetType, GamblingWinType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when reading an event payload.
#[derive(Error, Debug)]
pub enum EventError {
    /// Payload did not match the requested type.
    #[error("Failed to decode {event_type} payload: {reason}")]
    DecodeFailed {
        /// Event type being decoded
        event_type: String,
        /// Underlying serde error
        reason: String,
    },
}

/// Names of the wallet events the suite waits for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WalletEventType {
    /// Wallet opened at registration
    WalletCreated,
    /// Back-office balance correction
    BalanceAdjusted,
    /// Casino stake
    BettedFromGamble,
    /// Casino payout
    WonFromGamble,
    /// Casino stake refunded by the provider
    RefundedFromGamble,
    /// Casino stake rolled back
    RollbackedFromGamble,
    /// Tournament prize
    TournamentWonFromGamble,
    /// Sportsbook stake
    BettedFromIframe,
    /// Sportsbook win
    WonFromIframe,
    /// Sportsbook loss
    LostFromIframe,
    /// Sportsbook refund
    RefundedFromIframe,
    /// Limit created or consumed
    LimitChangedV2,
    /// Deposit credited
    DepositedMoney,
    /// Withdrawal hold placed
    BlockAmountStarted,
    /// Back-office gambling/betting blockers changed
    SettingPreventGambleSetted,
    /// Any other event
    Unknown(String),
}

impl WalletEventType {
    /// Name carried in the `type` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::WalletCreated => "wallet_created",
            Self::BalanceAdjusted => "balance_adjusted",
            Self::BettedFromGamble => "betted_from_gamble",
            Self::WonFromGamble => "won_from_gamble",
            Self::RefundedFromGamble => "refunded_from_gamble",
            Self::RollbackedFromGamble => "rollbacked_from_gamble",
            Self::TournamentWonFromGamble => "tournament_won_from_gamble",
            Self::BettedFromIframe => "betted_from_iframe",
            Self::WonFromIframe => "won_from_iframe",
            Self::LostFromIframe => "lost_from_iframe",
            Self::RefundedFromIframe => "refunded_from_iframe",
            Self::LimitChangedV2 => "limit_changed_v2",
            Self::DepositedMoney => "deposited_money",
            Self::BlockAmountStarted => "block_amount_started",
            Self::SettingPreventGambleSetted => "setting_prevent_gamble_setted",
            Self::Unknown(name) => name,
        }
    }
}

impl From<&str> for WalletEventType {
    fn from(name: &str) -> Self {
        match name {
            "wallet_created" => Self::WalletCreated,
            "balance_adjusted" => Self::BalanceAdjusted,
            "betted_from_gamble" => Self::BettedFromGamble,
            "won_from_gamble" => Self::WonFromGamble,
            "refunded_from_gamble" => Self::RefundedFromGamble,
            "rollbacked_from_gamble" => Self::RollbackedFromGamble,
            "tournament_won_from_gamble" => Self::TournamentWonFromGamble,
            "betted_from_iframe" => Self::BettedFromIframe,
            "won_from_iframe" => Self::WonFromIframe,
            "lost_from_iframe" => Self::LostFromIframe,
            "refunded_from_iframe" => Self::RefundedFromIframe,
            "limit_changed_v2" => Self::LimitChangedV2,
            "deposited_money" => Self::DepositedMoney,
            "block_amount_started" => Self::BlockAmountStarted,
            "setting_prevent_gamble_setted" => Self::SettingPreventGambleSetted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for WalletEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject a wallet's events are published on.
#[must_use]
pub fn wallet_subject(prefix: &str, player_uuid: Uuid, wallet_uuid: Uuid) -> String {
    format!("{prefix}.wallet.v2.{player_uuid}.{wallet_uuid}")
}

/// A wallet event as received from NATS.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletEvent {
    /// Name from the `type` header
    pub event_type: WalletEventType,
    /// JetStream stream sequence
    pub sequence: u64,
    /// Subject the event was published on
    pub subject: String,
    /// Raw JSON body
    pub payload: serde_json::Value,
    /// Publication time, when the server reports it
    pub timestamp: Option<DateTime<Utc>>,
}

impl WalletEvent {
    /// Decode the payload into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DecodeFailed`] when the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EventError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| EventError::DecodeFailed {
            event_type: self.event_type.to_string(),
            reason: e.to_string(),
        })
    }

    /// A string field of the payload, if present.
    #[must_use]
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(serde_json::Value::as_str)
    }

    /// Whether the payload refers to the given provider transaction id.
    #[must_use]
    pub fn concerns_transaction(&self, transaction_id: &str) -> bool {
        self.payload_str("transaction_id") == Some(transaction_id)
    }
}

impl TypedMessage for WalletEvent {
    fn type_name(&self) -> &str {
        self.event_type.as_str()
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Payload of `betted_from_gamble`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BettedFromGamble {
    /// Platform transaction id
    pub uuid: Uuid,
    /// Provider transaction id
    pub transaction_id: String,
    /// Stake
    pub amount: Decimal,
    /// Bet type
    #[serde(rename = "type")]
    pub bet_type: GamblingBetType,
    /// Game round
    #[serde(default)]
    pub round_id: String,
    /// Currency
    pub currency: String,
    /// Game played
    #[serde(default)]
    pub game_uuid: Option<Uuid>,
}

/// Payload of `won_from_gamble`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WonFromGamble {
    /// Platform transaction id
    pub uuid: Uuid,
    /// Provider transaction id
    pub transaction_id: String,
    /// Payout
    pub amount: Decimal,
    /// Win type
    #[serde(rename = "type")]
    pub win_type: GamblingWinType,
    /// Game round
    #[serde(default)]
    pub round_id: String,
    /// Currency
    pub currency: String,
}

/// Payload of `refunded_from_gamble`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefundedFromGamble {
    /// Platform transaction id
    pub uuid: Uuid,
    /// Provider transaction id of the refund
    pub transaction_id: String,
    /// Provider transaction id of the refunded bet
    pub bet_transaction_id: String,
    /// Amount returned
    pub amount: Decimal,
    /// Currency
    pub currency: String,
}

/// Payload of `rollbacked_from_gamble`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RollbackedFromGamble {
    /// Platform transaction id
    pub uuid: Uuid,
    /// Provider transaction id of the rollback
    pub transaction_id: String,
    /// Provider transaction id of the rolled-back bet
    pub rollback_transaction_id: String,
    /// Amount returned
    pub amount: Decimal,
    /// Currency
    pub currency: String,
}

/// Payload of `tournament_won_from_gamble`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TournamentWonFromGamble {
    /// Platform transaction id
    pub uuid: Uuid,
    /// Provider transaction id
    pub transaction_id: String,
    /// Tournament awarding the prize
    pub tournament_id: String,
    /// Prize
    pub amount: Decimal,
    /// Currency
    pub currency: String,
}

/// Payload shared by the sportsbook (`*_from_iframe`) events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BettingPayment {
    /// Platform transaction id
    pub uuid: Uuid,
    /// Sportsbook bet id
    pub bet_id: i64,
    /// Amount moved
    pub amount: Decimal,
    /// Payment type
    #[serde(rename = "type")]
    pub payment_type: BettingPaymentType,
    /// Currency
    pub currency: String,
}

/// Payload of `limit_changed_v2`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LimitChanged {
    /// What happened to the limits (`created`, `spent`, ...)
    pub event_type: String,
    /// Limits after the change
    #[serde(default)]
    pub limits: Vec<LimitSnapshot>,
}

impl LimitChanged {
    /// The turnover limit of a period within this change.
    #[must_use]
    pub fn turnover(&self, interval: IntervalType) -> Option<&LimitSnapshot> {
        self.limits
            .iter()
            .find(|l| l.interval_type == interval && l.limit_type.eq_ignore_ascii_case("turnover"))
    }
}

/// One limit inside a `limit_changed_v2` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LimitSnapshot {
    /// Limit identifier
    #[serde(default)]
    pub external_id: String,
    /// Kind of limit
    pub limit_type: String,
    /// Period
    pub interval_type: IntervalType,
    /// Cap
    pub amount: Decimal,
    /// Wagered so far
    pub spent: Decimal,
    /// Remaining headroom
    pub rest: Decimal,
    /// Currency
    #[serde(default)]
    pub currency_code: String,
    /// Whether the limit is in force
    #[serde(default)]
    pub status: bool,
}

/// Payload of `deposited_money`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepositedMoney {
    /// Deposit identifier
    pub uuid: Uuid,
    /// Amount credited
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// Deposit status
    #[serde(default)]
    pub status: String,
    /// Node the deposit was made on
    #[serde(default)]
    pub node_uuid: Option<Uuid>,
    /// Attached bonus
    #[serde(default)]
    pub bonus_id: Option<String>,
}

/// Payload of `block_amount_started`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockAmountStarted {
    /// Hold identifier
    pub uuid: Uuid,
    /// Held amount
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// Withdrawal that caused the hold
    #[serde(default)]
    pub reason_uuid: Option<Uuid>,
    /// Hold reason category
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Hold state
    #[serde(default)]
    pub status: String,
}

/// Payload of `balance_adjusted`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BalanceAdjusted {
    /// Adjustment identifier
    pub uuid: Uuid,
    /// Signed amount
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// `INCREASE` or `DECREASE`
    #[serde(default)]
    pub direction: String,
    /// Operator comment
    #[serde(default)]
    pub comment: String,
}

/// Payload of `wallet_created`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletCreated {
    /// New wallet
    pub wallet_uuid: Uuid,
    /// Owner
    pub player_uuid: Uuid,
    /// Currency
    pub currency: String,
    /// Whether this is the player's default wallet
    #[serde(default)]
    pub is_default: bool,
}

/// Payload of `setting_prevent_gamble_setted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BlockersChanged {
    /// Gambling allowed
    pub is_gambling_active: bool,
    /// Betting allowed
    pub is_betting_active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn event(event_type: &str, payload: serde_json::Value) -> WalletEvent {
        WalletEvent {
            event_type: WalletEventType::from(event_type),
            sequence: 7,
            subject: "qa.wallet.v2.p.w".to_string(),
            payload,
            timestamp: None,
        }
    }

    #[test]
    fn event_names_round_trip() {
        for name in ["betted_from_gamble", "limit_changed_v2", "block_amount_started"] {
            assert_eq!(WalletEventType::from(name).as_str(), name);
        }
        assert_eq!(
            WalletEventType::from("brand_new_event"),
            WalletEventType::Unknown("brand_new_event".to_string())
        );
    }

    #[test]
    fn builds_wallet_subject() {
        let player = Uuid::nil();
        let wallet = Uuid::max();
        assert_eq!(
            wallet_subject("beta", player, wallet),
            format!("beta.wallet.v2.{player}.{wallet}")
        );
    }

    #[test]
    fn decodes_betted_from_gamble() {
        let ev = event(
            "betted_from_gamble",
            json!({
                "uuid": "8e0c3b7d-51a4-4f6e-8c2d-93a1f0b2c4d5",
                "transaction_id": "tx-1",
                "amount": "12.34",
                "type": "TIPS",
                "round_id": "r-1",
                "currency": "EUR"
            }),
        );
        let payload: BettedFromGamble = ev.decode().unwrap();
        assert_eq!(payload.amount, dec!(12.34));
        assert_eq!(payload.bet_type, GamblingBetType::Tips);
        assert!(ev.concerns_transaction("tx-1"));
        assert!(!ev.concerns_transaction("tx-2"));
    }

    #[test]
    fn decode_mismatch_reports_event_type() {
        let ev = event("deposited_money", json!({"unexpected": true}));
        let err = ev.decode::<DepositedMoney>().unwrap_err();
        assert!(err.to_string().contains("deposited_money"));
    }

    #[test]
    fn limit_change_exposes_turnover_by_interval() {
        let ev = event(
            "limit_changed_v2",
            json!({
                "event_type": "spent",
                "limits": [{
                    "external_id": "lim-1",
                    "limit_type": "turnover",
                    "interval_type": "weekly",
                    "amount": "200",
                    "spent": "15",
                    "rest": "185",
                    "currency_code": "EUR",
                    "status": true
                }]
            }),
        );
        let change: LimitChanged = ev.decode().unwrap();
        let weekly = change.turnover(IntervalType::Weekly).unwrap();
        assert_eq!(weekly.rest, dec!(185));
        assert!(change.turnover(IntervalType::Daily).is_none());
    }
}
