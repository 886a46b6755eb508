//! Queries against the transaction-history projections.

use crate::error::{DatabaseError, Result};
use crate::rows::{BettingTransactionRow, GamblingTransactionRow};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;
use wallet_e2e_core::retry::{PollError, RetryPolicy, poll_until};

const GAMBLING_COLUMNS: &str = "uuid, player_uuid, wallet_uuid, transaction_id, operation, amount, \
     currency, game_uuid, round_id, seqnumber, created_at";

const BETTING_COLUMNS: &str =
    "uuid, player_uuid, wallet_uuid, bet_id, operation, amount, currency, seqnumber, created_at";

/// Read-only client of the transaction-history database.
///
/// This is the cold store: transactions evicted from the Redis aggregate are
/// still found here.
#[derive(Debug, Clone)]
pub struct WalletDatabaseClient {
    pool: PgPool,
}

impl WalletDatabaseClient {
    /// Open a pool of at most `max_connections` connections.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ConnectionFailed`] if the database cannot be
    /// reached.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        tracing::info!(max_connections, "Connected to transaction-history database");
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The gambling transaction with a provider transaction id.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`] if the query fails.
    pub async fn find_gambling_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<GamblingTransactionRow>> {
        let sql = format!(
            "SELECT {GAMBLING_COLUMNS} FROM gambling_projection_transaction_history \
             WHERE transaction_id = $1 ORDER BY seqnumber DESC LIMIT 1"
        );
        sqlx::query_as::<_, GamblingTransactionRow>(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("find_gambling_transaction", &e))
    }

    /// Every payment recorded for a sportsbook bet, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`] if the query fails.
    pub async fn find_betting_transaction(
        &self,
        bet_id: i64,
    ) -> Result<Vec<BettingTransactionRow>> {
        let sql = format!(
            "SELECT {BETTING_COLUMNS} FROM betting_projection_transaction_history \
             WHERE bet_id = $1 ORDER BY seqnumber"
        );
        sqlx::query_as::<_, BettingTransactionRow>(&sql)
            .bind(bet_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("find_betting_transaction", &e))
    }

    /// Gambling history of a wallet in event order.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`] if the query fails.
    pub async fn gambling_history(&self, wallet_uuid: Uuid) -> Result<Vec<GamblingTransactionRow>> {
        let sql = format!(
            "SELECT {GAMBLING_COLUMNS} FROM gambling_projection_transaction_history \
             WHERE wallet_uuid = $1 ORDER BY seqnumber"
        );
        let rows = sqlx::query_as::<_, GamblingTransactionRow>(&sql)
            .bind(wallet_uuid)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("gambling_history", &e))?;

        tracing::debug!(%wallet_uuid, rows = rows.len(), "Read gambling history");
        Ok(rows)
    }

    /// Poll until the gambling transaction has been projected.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotRecorded`] once `policy` is exhausted, or
    /// the error of the final read if it failed.
    pub async fn wait_for_gambling_transaction(
        &self,
        transaction_id: &str,
        policy: &RetryPolicy,
    ) -> Result<GamblingTransactionRow> {
        let not_recorded = |attempts: usize| DatabaseError::NotRecorded {
            what: format!("gambling transaction {transaction_id}"),
            attempts,
        };

        match poll_until(
            policy,
            || self.find_gambling_transaction(transaction_id),
            Option::is_some,
        )
        .await
        {
            Ok(row) => row.ok_or_else(|| not_recorded(1)),
            Err(PollError::ConditionNotMet { attempts, .. }) => Err(not_recorded(attempts)),
            Err(PollError::Failed { error, .. }) => Err(error),
        }
    }
}
