//! Property tests for the wallet expectation model.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use wallet_e2e_core::error::ErrorCode;
use wallet_e2e_core::limit::{IntervalType, TurnoverLimit};
use wallet_e2e_core::model::{DepositProgress, GAMBLING_CACHE_CAPACITY, WalletCommand, WalletModel};
use wallet_e2e_core::transaction::{BettingPaymentType, GamblingBetType, GamblingWinType};
use wallet_e2e_core::Uuid;

fn amount() -> impl Strategy<Value = Decimal> {
    (1_i64..=5_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn bet_type() -> impl Strategy<Value = GamblingBetType> {
    prop_oneof![
        Just(GamblingBetType::Bet),
        Just(GamblingBetType::Tips),
        Just(GamblingBetType::Freespin),
    ]
}

fn win_type() -> impl Strategy<Value = GamblingWinType> {
    prop_oneof![
        Just(GamblingWinType::Win),
        Just(GamblingWinType::Jackpot),
        Just(GamblingWinType::Freespin),
    ]
}

fn settlement() -> impl Strategy<Value = BettingPaymentType> {
    prop_oneof![
        Just(BettingPaymentType::Win),
        Just(BettingPaymentType::Loss),
        Just(BettingPaymentType::Refund),
    ]
}

/// Commands over a small id space so reversals and settlements regularly hit
/// earlier bets.
fn command() -> impl Strategy<Value = WalletCommand> {
    prop_oneof![
        4 => (0_u8..20, amount(), bet_type()).prop_map(|(id, amount, bet_type)| WalletCommand::Bet {
            transaction_id: format!("bet-{id}"),
            amount,
            bet_type,
        }),
        2 => (0_u8..20, amount(), win_type()).prop_map(|(id, amount, win_type)| WalletCommand::Win {
            transaction_id: format!("win-{id}"),
            amount,
            win_type,
        }),
        1 => (0_u8..20, amount()).prop_map(|(id, amount)| WalletCommand::Tournament {
            transaction_id: format!("tour-{id}"),
            amount,
        }),
        2 => (0_u8..20, 0_u8..20).prop_map(|(id, target)| WalletCommand::Refund {
            transaction_id: format!("refund-{id}"),
            bet_transaction_id: format!("bet-{target}"),
        }),
        2 => (0_u8..20, 0_u8..20).prop_map(|(id, target)| WalletCommand::Rollback {
            transaction_id: format!("rollback-{id}"),
            bet_transaction_id: format!("bet-{target}"),
        }),
        2 => (0_i64..10, amount()).prop_map(|(bet_id, amount)| WalletCommand::BettingPayment {
            bet_id,
            amount,
            payment_type: BettingPaymentType::Bet,
        }),
        2 => (0_i64..10, amount(), settlement()).prop_map(|(bet_id, amount, payment_type)| {
            WalletCommand::BettingPayment {
                bet_id,
                amount,
                payment_type,
            }
        }),
        1 => (any::<u128>(), amount()).prop_map(|(id, amount)| WalletCommand::Deposit {
            deposit_uuid: Uuid::from_u128(id),
            amount,
        }),
        1 => (any::<u128>(), amount()).prop_map(|(id, amount)| WalletCommand::Withdrawal {
            withdrawal_uuid: Uuid::from_u128(id),
            amount,
        }),
    ]
}

fn total_wagering(model: &WalletModel) -> Decimal {
    model.deposits().iter().map(|d| d.wagering).sum()
}

fn funded_model() -> WalletModel {
    let mut model = WalletModel::new("EUR", dec!(500));
    model.set_turnover_limit(TurnoverLimit::new(dec!(300), IntervalType::Daily, "EUR"));
    model
}

proptest! {
    #[test]
    fn balance_equals_sum_of_accepted_movements(commands in prop::collection::vec(command(), 1..60)) {
        let mut model = funded_model();
        let mut expected = model.balance();
        for command in &commands {
            let before = model.balance();
            if let Ok(outcome) = model.execute(command) {
                let delta = outcome.balance - before;
                prop_assert_eq!(delta.abs(), outcome.amount);
                expected += delta;
            } else {
                prop_assert_eq!(model.balance(), before);
            }
        }
        prop_assert_eq!(model.balance(), expected);
        prop_assert!(model.balance() >= Decimal::ZERO);
    }

    #[test]
    fn turnover_only_moves_on_wagering(commands in prop::collection::vec(command(), 1..60)) {
        let mut model = funded_model();
        for command in &commands {
            let spent_before = model.turnover_limit(IntervalType::Daily).unwrap().spent;
            if let Ok(outcome) = model.execute(command) {
                let limit = model.turnover_limit(IntervalType::Daily).unwrap();
                if outcome.kind.is_wagering() {
                    prop_assert_eq!(limit.spent, spent_before + outcome.amount);
                    prop_assert!(outcome.limit_changed);
                } else {
                    prop_assert_eq!(limit.spent, spent_before);
                    prop_assert!(!outcome.limit_changed);
                }
                prop_assert!(limit.rest >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn deposit_wagering_only_moves_on_real_money_wagering(
        commands in prop::collection::vec(command(), 1..80),
    ) {
        let mut model = funded_model();
        for command in &commands {
            let before = total_wagering(&model);
            let open_before = model.deposits().iter().any(DepositProgress::is_open);
            if let Ok(outcome) = model.execute(command) {
                let after = total_wagering(&model);
                if outcome.kind.counts_toward_deposit_wagering() && open_before {
                    prop_assert_eq!(after, before + outcome.amount);
                    prop_assert!(outcome.wagered_deposit.is_some());
                } else {
                    prop_assert_eq!(after, before, "{:?} moved wagering", outcome.kind);
                    prop_assert!(outcome.wagered_deposit.is_none());
                }
            }
        }
    }

    #[test]
    fn a_bet_is_reversed_at_most_once(commands in prop::collection::vec(command(), 1..80)) {
        let mut model = funded_model();
        let mut reversed = std::collections::HashSet::new();
        for command in &commands {
            let target = match command {
                WalletCommand::Refund { bet_transaction_id, .. }
                | WalletCommand::Rollback { bet_transaction_id, .. } => Some(bet_transaction_id.clone()),
                _ => None,
            };
            match (model.execute(command), target) {
                (Ok(_), Some(target)) => {
                    prop_assert!(reversed.insert(target), "bet reversed twice");
                }
                (Err(rejection), Some(target)) if reversed.contains(&target) => {
                    prop_assert_eq!(rejection.code, ErrorCode::RollbackNotAllowed);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn cache_is_bounded(commands in prop::collection::vec(command(), 1..200)) {
        let mut model = funded_model();
        for command in &commands {
            let _ = model.execute(command);
            prop_assert!(model.cached_transactions().count() <= GAMBLING_CACHE_CAPACITY);
        }
    }

    #[test]
    fn win_class_is_never_reversible(amount in amount(), win_type in win_type()) {
        let mut model = funded_model();
        model.execute(&WalletCommand::Win {
            transaction_id: "w".to_string(),
            amount,
            win_type,
        }).unwrap();
        let rejection = model.execute(&WalletCommand::Rollback {
            transaction_id: "r".to_string(),
            bet_transaction_id: "w".to_string(),
        }).unwrap_err();
        prop_assert_eq!(rejection.code, ErrorCode::RollbackNotAllowed);
    }
}

#[test]
fn evicted_bet_can_still_be_rolled_back() {
    let mut model = WalletModel::new("EUR", dec!(1000));
    for i in 0..=GAMBLING_CACHE_CAPACITY {
        let outcome = model
            .execute(&WalletCommand::Bet {
                transaction_id: format!("tx-{i}"),
                amount: dec!(1),
                bet_type: GamblingBetType::Bet,
            })
            .unwrap();
        if i == GAMBLING_CACHE_CAPACITY {
            assert_eq!(outcome.evicted.as_deref(), Some("tx-0"));
        } else {
            assert!(outcome.evicted.is_none());
        }
    }
    assert!(!model.is_cached("tx-0"));
    assert_eq!(model.balance(), dec!(949));

    let outcome = model
        .execute(&WalletCommand::Rollback {
            transaction_id: "rb-0".to_string(),
            bet_transaction_id: "tx-0".to_string(),
        })
        .unwrap();
    assert_eq!(outcome.amount, dec!(1));
    assert_eq!(model.balance(), dec!(950));
    assert_eq!(outcome.evicted.as_deref(), Some("tx-1"));
}
