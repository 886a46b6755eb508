//! The wallet aggregate as cached in Redis.
//!
//! The wallet service keeps a denormalized view of each wallet in Redis,
//! keyed by wallet UUID. The suite only ever reads it. Keys are PascalCase on
//! the wire and amounts may arrive as strings or numbers.
//!
//! `LastSeqNumber` is the NATS sequence of the last event applied to the
//! snapshot; comparing it with an event's sequence tells whether the cache has
//! caught up with the stream.

use crate::limit::IntervalType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

const fn active_by_default() -> bool {
    true
}

/// Cached wallet snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WalletAggregate {
    /// Wallet identifier (also the Redis key)
    #[serde(rename = "WalletUUID")]
    pub wallet_uuid: Uuid,
    /// Owning player
    #[serde(rename = "PlayerUUID")]
    pub player_uuid: Uuid,
    /// Wallet currency
    #[serde(default)]
    pub currency: String,
    /// Total balance
    pub balance: Decimal,
    /// Part of the balance that can be withdrawn
    #[serde(default)]
    pub available_withdrawal_balance: Decimal,
    /// Gambling allowed by back office
    #[serde(default = "active_by_default")]
    pub is_gambling_active: bool,
    /// Betting allowed by back office
    #[serde(default = "active_by_default")]
    pub is_betting_active: bool,
    /// Most recent gambling transactions, keyed by transaction id
    #[serde(default)]
    pub gambling: HashMap<String, GamblingEntry>,
    /// Deposits and their wagering progress
    #[serde(default)]
    pub deposits: Vec<DepositEntry>,
    /// Turnover limits
    #[serde(default)]
    pub limits: Vec<LimitEntry>,
    /// Withdrawal holds
    #[serde(default)]
    pub blocked_amounts: Vec<BlockedAmount>,
    /// Sequence of the last applied event
    pub last_seq_number: u64,
}

impl WalletAggregate {
    /// Decode a snapshot from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the payload does not
    /// describe a wallet aggregate.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Look up a cached gambling transaction.
    #[must_use]
    pub fn gambling_transaction(&self, transaction_id: &str) -> Option<&GamblingEntry> {
        self.gambling.get(transaction_id)
    }

    /// The turnover limit for a period, if configured.
    #[must_use]
    pub fn turnover_limit(&self, interval: IntervalType) -> Option<&LimitEntry> {
        self.limits
            .iter()
            .find(|l| l.interval_type == interval && l.limit_type.eq_ignore_ascii_case("turnover"))
    }

    /// A deposit by id.
    #[must_use]
    pub fn deposit(&self, deposit_uuid: Uuid) -> Option<&DepositEntry> {
        self.deposits.iter().find(|d| d.uuid == deposit_uuid)
    }

    /// Sum of all held amounts.
    #[must_use]
    pub fn total_blocked(&self) -> Decimal {
        self.blocked_amounts.iter().map(|b| b.amount).sum()
    }
}

/// One cached gambling transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GamblingEntry {
    /// Transaction amount
    pub amount: Decimal,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub created_at: i64,
}

/// Processing state of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    /// Waiting on the payment provider
    Processing,
    /// Money credited
    Success,
    /// Payment failed
    Failed,
    /// Status this suite does not know
    #[serde(other)]
    Unknown,
}

/// A deposit entry with its wagering progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepositEntry {
    /// Deposit identifier
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    /// Node the deposit was made on
    #[serde(rename = "NodeUUID", default)]
    pub node_uuid: Option<Uuid>,
    /// Bonus attached to the deposit
    #[serde(rename = "BonusID", default)]
    pub bonus_id: Option<String>,
    /// Deposited amount
    pub amount: Decimal,
    /// Processing state
    pub status: DepositStatus,
    /// Real-money wagering accumulated against this deposit
    #[serde(default)]
    pub wagering_amount: Decimal,
    /// Deposit currency
    #[serde(default)]
    pub currency_code: String,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub started_at: i64,
}

/// A turnover (or other) limit as stored on the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LimitEntry {
    /// Limit identifier in the limits service
    #[serde(rename = "ExternalID", default)]
    pub external_id: String,
    /// Kind of limit, `turnover` for wagering caps
    pub limit_type: String,
    /// Period
    pub interval_type: IntervalType,
    /// Cap
    pub amount: Decimal,
    /// Wagered in the current period
    pub spent: Decimal,
    /// Remaining headroom
    pub rest: Decimal,
    /// Currency
    #[serde(default)]
    pub currency_code: String,
    /// Whether the limit is in force
    #[serde(default = "active_by_default")]
    pub status: bool,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub started_at: i64,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub expires_at: i64,
}

/// A hold placed on part of the balance, e.g. a pending withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockedAmount {
    /// Hold identifier
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    /// Hold reason category (`withdrawal`, ...)
    #[serde(rename = "Type", default)]
    pub kind: String,
    /// Hold state
    #[serde(default)]
    pub status: String,
    /// Held amount
    pub amount: Decimal,
    /// How much the hold reduced the withdrawable balance
    #[serde(default)]
    pub delta_available_withdrawal_balance: Decimal,
    /// Entity that caused the hold (withdrawal id)
    #[serde(rename = "ReasonUUID", default)]
    pub reason_uuid: Option<Uuid>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub created_at: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SNAPSHOT: &str = r#"{
        "WalletUUID": "5d7b8a1c-0d7e-4f5a-9a3e-2f4f1b6c9e11",
        "PlayerUUID": "8e0c3b7d-51a4-4f6e-8c2d-93a1f0b2c4d5",
        "Currency": "EUR",
        "Balance": "150.50",
        "AvailableWithdrawalBalance": 100,
        "Gambling": {
            "tx-1": {"Amount": "10.00", "CreatedAt": 1735689600}
        },
        "Deposits": [{
            "UUID": "0b9f0c2e-7d1a-4c3b-8f5e-6a2d1e0f9c8b",
            "Amount": "50",
            "Status": "SUCCESS",
            "WageringAmount": "12.5",
            "CurrencyCode": "EUR"
        }],
        "Limits": [{
            "ExternalID": "lim-1",
            "LimitType": "turnover",
            "IntervalType": "daily",
            "Amount": "100",
            "Spent": "10",
            "Rest": "90",
            "CurrencyCode": "EUR"
        }],
        "BlockedAmounts": [],
        "LastSeqNumber": 42
    }"#;

    #[test]
    fn decodes_wallet_snapshot() {
        let aggregate = WalletAggregate::from_json(SNAPSHOT).unwrap();
        assert_eq!(aggregate.balance, dec!(150.50));
        assert_eq!(aggregate.available_withdrawal_balance, dec!(100));
        assert_eq!(aggregate.last_seq_number, 42);
        assert!(aggregate.is_gambling_active);
        assert_eq!(
            aggregate.gambling_transaction("tx-1").map(|e| e.amount),
            Some(dec!(10.00))
        );
    }

    #[test]
    fn finds_turnover_limit_and_deposit() {
        let aggregate = WalletAggregate::from_json(SNAPSHOT).unwrap();
        let limit = aggregate.turnover_limit(IntervalType::Daily).unwrap();
        assert_eq!(limit.rest, dec!(90));
        assert!(aggregate.turnover_limit(IntervalType::Weekly).is_none());

        let deposit_uuid = aggregate.deposits[0].uuid;
        let deposit = aggregate.deposit(deposit_uuid).unwrap();
        assert_eq!(deposit.status, DepositStatus::Success);
        assert_eq!(deposit.wagering_amount, dec!(12.5));
    }

    #[test]
    fn unknown_deposit_status_does_not_fail_decoding() {
        let raw = SNAPSHOT.replace("\"SUCCESS\"", "\"CHARGEBACK\"");
        let aggregate = WalletAggregate::from_json(&raw).unwrap();
        assert_eq!(aggregate.deposits[0].status, DepositStatus::Unknown);
    }
}
