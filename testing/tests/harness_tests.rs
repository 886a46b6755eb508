//! Offline tests of the waiting primitives over the in-memory source.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::json;
use std::time::Duration;
use uuid::Uuid;
use wallet_e2e_core::event::{WalletEvent, WalletEventType, wallet_subject};
use wallet_e2e_core::event_bus::{BusError, MessageSource};
use wallet_e2e_core::expectation::Expectation;
use wallet_e2e_core::model::WalletCommand;
use wallet_e2e_core::projection::ProjectionMessage;
use wallet_e2e_core::transaction::GamblingBetType;
use wallet_e2e_testing::InMemoryMessageSource;
use wallet_e2e_testing::steps::event_filter;

const SHORT: Duration = Duration::from_millis(150);

fn subject() -> String {
    wallet_subject("wallet", Uuid::nil(), Uuid::nil())
}

fn event(event_type: WalletEventType, sequence: u64, transaction_id: &str) -> WalletEvent {
    WalletEvent {
        event_type,
        sequence,
        subject: subject(),
        payload: json!({ "transaction_id": transaction_id, "amount": "10" }),
        timestamp: None,
    }
}

#[tokio::test]
async fn bet_event_is_found_among_others() {
    let source = InMemoryMessageSource::new();
    source.publish(&subject(), event(WalletEventType::WalletCreated, 1, ""));
    source.publish(&subject(), event(WalletEventType::BettedFromGamble, 2, "tx-other"));
    source.publish(&subject(), event(WalletEventType::BettedFromGamble, 3, "tx-1"));

    let filter = event_filter(&WalletCommand::Bet {
        transaction_id: "tx-1".to_string(),
        amount: rust_decimal::Decimal::TEN,
        bet_type: GamblingBetType::Bet,
    });
    let found = Expectation::new(source.subscribe(&subject()).await.unwrap())
        .of_type(WalletEventType::BettedFromGamble.as_str())
        .matching(filter)
        .within(SHORT)
        .fetch()
        .await
        .unwrap();

    assert_eq!(found.sequence, 3);
}

#[tokio::test]
async fn events_before_the_observed_sequence_are_ignored() {
    let source = InMemoryMessageSource::new();
    source.publish(&subject(), event(WalletEventType::LimitChangedV2, 4, ""));

    let err = Expectation::new(source.subscribe(&subject()).await.unwrap())
        .of_type("limit_changed_v2")
        .after_sequence(5)
        .within(SHORT)
        .fetch()
        .await
        .unwrap_err();

    assert!(matches!(err, BusError::Timeout { skipped: 1, .. }), "{err}");
}

#[tokio::test]
async fn live_event_satisfies_a_pending_wait() {
    let source = InMemoryMessageSource::new();
    let stream = source.subscribe(&subject()).await.unwrap();

    let publisher = source.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.publish(&subject(), event(WalletEventType::WonFromGamble, 9, "win-1"));
    });

    let won = Expectation::new(stream)
        .of_type("won_from_gamble")
        .within(Duration::from_secs(2))
        .fetch()
        .await
        .unwrap();
    assert!(won.concerns_transaction("win-1"));
}

#[tokio::test]
async fn no_limit_change_after_a_win() {
    let source = InMemoryMessageSource::new();
    source.publish(&subject(), event(WalletEventType::WonFromGamble, 2, "win-1"));

    Expectation::new(source.subscribe(&subject()).await.unwrap())
        .of_type("limit_changed_v2")
        .within(SHORT)
        .assert_none()
        .await
        .unwrap();
}

#[tokio::test]
async fn unexpected_limit_change_is_reported() {
    let source = InMemoryMessageSource::new();
    source.publish(&subject(), event(WalletEventType::LimitChangedV2, 3, ""));

    let err = Expectation::new(source.subscribe(&subject()).await.unwrap())
        .of_type("limit_changed_v2")
        .within(SHORT)
        .assert_none()
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::UnexpectedMessage(_)));
}

#[tokio::test]
async fn undecodable_messages_are_skipped() {
    let source = InMemoryMessageSource::new();
    source.publish_error(&subject(), BusError::DeserializationFailed("garbage".to_string()));
    source.publish(&subject(), event(WalletEventType::BettedFromGamble, 2, "tx-1"));

    let events = Expectation::new(source.subscribe(&subject()).await.unwrap())
        .within(SHORT)
        .fetch_all(1)
        .await
        .unwrap();
    assert_eq!(events[0].sequence, 2);
}

#[tokio::test]
async fn projection_is_matched_by_wallet_and_sequence() {
    let wallet_uuid = Uuid::new_v4();
    let nats_event = event(WalletEventType::BettedFromGamble, 12, "tx-1");
    let projection = |wallet_uuid: Uuid, seq_number: u64| ProjectionMessage {
        event_type: "betted_from_gamble".to_string(),
        seq_number,
        wallet_uuid,
        player_uuid: Uuid::nil(),
        node_uuid: None,
        currency: "EUR".to_string(),
        timestamp: 0,
        payload: nats_event.payload.to_string(),
    };

    let source = InMemoryMessageSource::new();
    source.publish("wallet-projections", projection(Uuid::new_v4(), 12));
    source.publish("wallet-projections", projection(wallet_uuid, 11));
    source.publish("wallet-projections", projection(wallet_uuid, 12));

    let found = Expectation::new(source.subscribe("wallet-projections").await.unwrap())
        .of_type("betted_from_gamble")
        .matching(move |m: &ProjectionMessage| m.wallet_uuid == wallet_uuid && m.seq_number == 12)
        .within(SHORT)
        .fetch()
        .await
        .unwrap();

    assert!(found.mirrors(&nats_event));
}
