//! CAP admin API request and response bodies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wallet_e2e_core::limit::IntervalType;

/// Body of `PATCH /players/{player}/blockers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockersRequest {
    /// Allow casino play
    pub gambling_enabled: bool,
    /// Allow sportsbook play
    pub betting_enabled: bool,
}

/// Direction of a balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    /// Credit
    Increase,
    /// Debit
    Decrease,
}

/// Body of `POST /wallet/{player}/create-balance-adjustment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAdjustmentRequest {
    /// Wallet currency
    pub currency: String,
    /// Absolute amount
    pub amount: Decimal,
    /// Credit or debit
    pub direction: AdjustmentDirection,
    /// Operation category
    pub operation_type: String,
    /// Back-office reason
    pub reason: String,
    /// Free-text comment
    pub comment: String,
}

impl BalanceAdjustmentRequest {
    /// A correction credit, as used to fund test players.
    #[must_use]
    pub fn credit(currency: impl Into<String>, amount: Decimal) -> Self {
        Self {
            currency: currency.into(),
            amount,
            direction: AdjustmentDirection::Increase,
            operation_type: "CORRECTION".to_string(),
            reason: "OPERATIONAL_MISTAKE".to_string(),
            comment: "e2e funding".to_string(),
        }
    }

    /// A correction debit.
    #[must_use]
    pub fn debit(currency: impl Into<String>, amount: Decimal) -> Self {
        Self {
            direction: AdjustmentDirection::Decrease,
            comment: "e2e debit".to_string(),
            ..Self::credit(currency, amount)
        }
    }

    /// Signed amount as the wallet sees it.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            AdjustmentDirection::Increase => self.amount,
            AdjustmentDirection::Decrease => -self.amount,
        }
    }
}

/// Response of `GET /player/{player}/limits`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerLimitsResponse {
    /// Limits of the player
    #[serde(default)]
    pub data: Vec<PlayerLimit>,
}

impl PlayerLimitsResponse {
    /// Turnover limit of a period, if any.
    #[must_use]
    pub fn turnover(&self, interval: IntervalType) -> Option<&PlayerLimit> {
        self.data
            .iter()
            .find(|l| l.interval == interval && l.limit_type.eq_ignore_ascii_case("turnover"))
    }
}

/// One limit as reported by CAP.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLimit {
    /// Limit id
    #[serde(default)]
    pub id: String,
    /// Kind of limit
    #[serde(rename = "type")]
    pub limit_type: String,
    /// Period
    #[serde(rename = "intervalType")]
    pub interval: IntervalType,
    /// Cap
    pub amount: Decimal,
    /// Wagered in the current period
    pub spent: Decimal,
    /// Remaining headroom
    pub rest: Decimal,
    /// Currency
    #[serde(default)]
    pub currency: String,
    /// Whether the limit is in force
    #[serde(default)]
    pub status: bool,
}
