//! Tests for [`RedisWalletClient`] against a real Redis.
//!
//! Marked `#[ignore]` because they need Docker:
//!
//! ```bash
//! cargo test -p wallet-e2e-redis --test aggregate_cache -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use redis::AsyncCommands;
use rust_decimal_macros::dec;
use std::time::Duration;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::redis::{REDIS_PORT, Redis};
use uuid::Uuid;
use wallet_e2e_core::retry::RetryPolicy;
use wallet_e2e_redis::{CacheError, RedisWalletClient};

const PREFIX: &str = "wallet:";

async fn start_redis() -> (ContainerAsync<Redis>, String) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start Redis container");
    let host = container.get_host().await.expect("host");
    let port = container
        .get_host_port_ipv4(REDIS_PORT)
        .await
        .expect("port");
    (container, format!("redis://{host}:{port}"))
}

fn aggregate_json(wallet: Uuid, seq: u64, balance: &str) -> String {
    serde_json::json!({
        "WalletUUID": wallet,
        "PlayerUUID": Uuid::nil(),
        "Currency": "EUR",
        "Balance": balance,
        "AvailableWithdrawalBalance": balance,
        "Gambling": {
            "tx-1": {"Amount": "5.00", "CreatedAt": 1_700_000_000}
        },
        "LastSeqNumber": seq
    })
    .to_string()
}

async fn put(url: &str, key: &str, value: &str) {
    let client = redis::Client::open(url).expect("client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("connection");
    let () = conn.set(key, value).await.expect("SET");
}

fn quick_policy() -> RetryPolicy {
    RetryPolicy::fixed(Duration::from_millis(50), 20)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn reads_cached_aggregate() {
    let (_container, url) = start_redis().await;
    let wallet = Uuid::new_v4();
    put(&url, &format!("{PREFIX}{wallet}"), &aggregate_json(wallet, 4, "95.00")).await;

    let client = RedisWalletClient::new(&url, PREFIX).await.expect("client");
    let aggregate = client.get_aggregate(wallet).await.expect("aggregate");

    assert_eq!(aggregate.wallet_uuid, wallet);
    assert_eq!(aggregate.balance, dec!(95));
    assert_eq!(aggregate.last_seq_number, 4);

    let entry = client
        .gambling_transaction(wallet, "tx-1")
        .await
        .expect("read")
        .expect("cached transaction");
    assert_eq!(entry.amount, dec!(5));
    assert!(
        client
            .gambling_transaction(wallet, "tx-2")
            .await
            .expect("read")
            .is_none()
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn missing_aggregate_is_not_found() {
    let (_container, url) = start_redis().await;
    let client = RedisWalletClient::new(&url, PREFIX).await.expect("client");

    let err = client.get_aggregate(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CacheError::NotFound { .. }));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn wait_returns_once_sequence_is_applied() {
    let (_container, url) = start_redis().await;
    let wallet = Uuid::new_v4();
    let key = format!("{PREFIX}{wallet}");
    put(&url, &key, &aggregate_json(wallet, 1, "100.00")).await;

    let writer_url = url.clone();
    let writer_key = key.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        put(&writer_url, &writer_key, &aggregate_json(wallet, 2, "90.00")).await;
    });

    let client = RedisWalletClient::new(&url, PREFIX).await.expect("client");
    let aggregate = client
        .wait_for_sequence(wallet, 2, &quick_policy())
        .await
        .expect("aggregate caught up");
    writer.await.expect("writer");

    assert_eq!(aggregate.balance, dec!(90));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn wait_reports_last_seen_sequence() {
    let (_container, url) = start_redis().await;
    let wallet = Uuid::new_v4();
    put(&url, &format!("{PREFIX}{wallet}"), &aggregate_json(wallet, 3, "10.00")).await;

    let client = RedisWalletClient::new(&url, PREFIX).await.expect("client");
    let err = client
        .wait_for_sequence(wallet, 9, &RetryPolicy::fixed(Duration::from_millis(10), 3))
        .await
        .unwrap_err();

    match err {
        CacheError::SequenceNotReached {
            expected, last_seen, ..
        } => {
            assert_eq!(expected, 9);
            assert_eq!(last_seen, Some(3));
        }
        other => panic!("expected SequenceNotReached, got {other:?}"),
    }
}
