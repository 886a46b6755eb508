//! Rows of the transaction-history projections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// One row of `gambling_projection_transaction_history`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GamblingTransactionRow {
    /// Row id
    pub uuid: Uuid,
    /// Owning player
    pub player_uuid: Uuid,
    /// Wallet the transaction moved money on
    pub wallet_uuid: Uuid,
    /// Provider transaction id
    pub transaction_id: String,
    /// Operation name (`bet`, `win`, `refund`, `rollback`, `tournament`, ...)
    pub operation: String,
    /// Amount moved
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// Game played, absent for tournament awards
    pub game_uuid: Option<Uuid>,
    /// Provider round id
    pub round_id: Option<String>,
    /// NATS sequence of the event the row was projected from
    pub seqnumber: i64,
    /// Projection time
    pub created_at: DateTime<Utc>,
}

impl GamblingTransactionRow {
    /// The NATS sequence as an unsigned number.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        u64::try_from(self.seqnumber).unwrap_or_default()
    }

    /// Whether the row records `operation`, ignoring case.
    #[must_use]
    pub fn is_operation(&self, operation: &str) -> bool {
        self.operation.eq_ignore_ascii_case(operation)
    }
}

/// One row of `betting_projection_transaction_history`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BettingTransactionRow {
    /// Row id
    pub uuid: Uuid,
    /// Owning player
    pub player_uuid: Uuid,
    /// Wallet the payment moved money on
    pub wallet_uuid: Uuid,
    /// Sportsbook bet id
    pub bet_id: i64,
    /// Payment type (`bet`, `win`, `loss`, `refund`)
    pub operation: String,
    /// Amount moved
    pub amount: Decimal,
    /// Currency
    pub currency: String,
    /// NATS sequence of the event the row was projected from
    pub seqnumber: i64,
    /// Projection time
    pub created_at: DateTime<Utc>,
}

impl BettingTransactionRow {
    /// The NATS sequence as an unsigned number.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        u64::try_from(self.seqnumber).unwrap_or_default()
    }
}
