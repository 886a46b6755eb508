//! Wallet aggregate reads.
//!
//! Aggregates are stored as JSON strings under `{key_prefix}{wallet_uuid}`.

use crate::error::{CacheError, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;
use wallet_e2e_core::aggregate::{GamblingEntry, WalletAggregate};
use wallet_e2e_core::retry::{PollError, RetryPolicy, poll_until};

/// Read-only client of the wallet aggregate cache.
#[derive(Clone)]
pub struct RedisWalletClient {
    conn_manager: ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisWalletClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisWalletClient")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl RedisWalletClient {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `key_prefix` - prepended to the wallet UUID to form the key (e.g., "wallet:")
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionFailed`] if the URL is invalid or the
    /// server cannot be reached.
    pub async fn new(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionFailed(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionFailed(format!("Failed to create Redis connection manager: {e}"))
        })?;

        let key_prefix = key_prefix.into();
        tracing::info!(key_prefix = %key_prefix, "Connected to wallet aggregate cache");

        Ok(Self {
            conn_manager,
            key_prefix,
        })
    }

    /// Key the aggregate of `wallet_uuid` is stored under.
    #[must_use]
    pub fn aggregate_key(&self, wallet_uuid: Uuid) -> String {
        format!("{}{wallet_uuid}", self.key_prefix)
    }

    /// The raw cached JSON, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CommandFailed`] if the `GET` fails.
    pub async fn get_raw(&self, wallet_uuid: Uuid) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();
        let key = self.aggregate_key(wallet_uuid);
        conn.get::<_, Option<String>>(&key)
            .await
            .map_err(|e| CacheError::CommandFailed {
                key,
                reason: e.to_string(),
            })
    }

    /// The current aggregate of a wallet.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if nothing is cached yet and
    /// [`CacheError::Decode`] if the value is not an aggregate.
    pub async fn get_aggregate(&self, wallet_uuid: Uuid) -> Result<WalletAggregate> {
        let key = self.aggregate_key(wallet_uuid);
        let raw = self
            .get_raw(wallet_uuid)
            .await?
            .ok_or_else(|| CacheError::NotFound { key: key.clone() })?;

        let aggregate = WalletAggregate::from_json(&raw).map_err(|e| CacheError::Decode {
            key,
            reason: e.to_string(),
        })?;

        tracing::debug!(
            %wallet_uuid,
            last_seq_number = aggregate.last_seq_number,
            balance = %aggregate.balance,
            "Read wallet aggregate"
        );
        Ok(aggregate)
    }

    /// Poll until the aggregate has applied the event with `sequence`.
    ///
    /// Missing or undecodable snapshots count as "not there yet".
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::SequenceNotReached`] once `policy` is exhausted,
    /// or the error of the final read if it was a Redis failure.
    pub async fn wait_for_sequence(
        &self,
        wallet_uuid: Uuid,
        sequence: u64,
        policy: &RetryPolicy,
    ) -> Result<WalletAggregate> {
        tracing::debug!(%wallet_uuid, sequence, "Waiting for aggregate to catch up");

        let polled = poll_until(
            policy,
            || self.get_aggregate(wallet_uuid),
            |aggregate| aggregate.last_seq_number >= sequence,
        )
        .await;

        match polled {
            Ok(aggregate) => Ok(aggregate),
            Err(PollError::ConditionNotMet { attempts, last }) => {
                Err(CacheError::SequenceNotReached {
                    wallet_uuid,
                    expected: sequence,
                    last_seen: Some(last.last_seq_number),
                    attempts,
                })
            }
            Err(PollError::Failed {
                attempts,
                error: CacheError::NotFound { .. } | CacheError::Decode { .. },
            }) => Err(CacheError::SequenceNotReached {
                wallet_uuid,
                expected: sequence,
                last_seen: None,
                attempts,
            }),
            Err(PollError::Failed { error, .. }) => Err(error),
        }
    }

    /// A gambling transaction if it is still in the cached window.
    ///
    /// # Errors
    ///
    /// Propagates [`RedisWalletClient::get_aggregate`] failures.
    pub async fn gambling_transaction(
        &self,
        wallet_uuid: Uuid,
        transaction_id: &str,
    ) -> Result<Option<GamblingEntry>> {
        let aggregate = self.get_aggregate(wallet_uuid).await?;
        Ok(aggregate.gambling_transaction(transaction_id).cloned())
    }
}
