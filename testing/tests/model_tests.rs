//! Offline Given-When-Then checks of the predictions the live scenarios
//! assert against.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;
use wallet_e2e_core::error::ErrorCode;
use wallet_e2e_core::limit::{IntervalType, TurnoverLimit};
use wallet_e2e_core::model::{WalletCommand, WalletModel};
use wallet_e2e_core::transaction::{BettingPaymentType, GamblingBetType, GamblingWinType};
use wallet_e2e_testing::ModelTest;
use wallet_e2e_testing::fixtures::{CACHE_CAPACITY, INITIAL_BALANCE};

fn funded() -> WalletModel {
    WalletModel::new("EUR", INITIAL_BALANCE)
}

fn with_daily_limit(amount: Decimal) -> WalletModel {
    let mut model = funded();
    model.set_turnover_limit(TurnoverLimit::new(amount, IntervalType::Daily, "EUR"));
    model
}

fn bet(id: &str, amount: Decimal, bet_type: GamblingBetType) -> WalletCommand {
    WalletCommand::Bet {
        transaction_id: id.to_string(),
        amount,
        bet_type,
    }
}

fn win(id: &str, amount: Decimal, win_type: GamblingWinType) -> WalletCommand {
    WalletCommand::Win {
        transaction_id: id.to_string(),
        amount,
        win_type,
    }
}

fn rollback(id: &str, target: &str) -> WalletCommand {
    WalletCommand::Rollback {
        transaction_id: id.to_string(),
        bet_transaction_id: target.to_string(),
    }
}

fn refund(id: &str, target: &str) -> WalletCommand {
    WalletCommand::Refund {
        transaction_id: id.to_string(),
        bet_transaction_id: target.to_string(),
    }
}

fn payment(bet_id: i64, amount: Decimal, payment_type: BettingPaymentType) -> WalletCommand {
    WalletCommand::BettingPayment {
        bet_id,
        amount,
        payment_type,
    }
}

// =============================================================================
// Reversals
// =============================================================================

#[test]
fn rollback_restores_the_stake() {
    ModelTest::new()
        .given_model(funded())
        .given(bet("bet-1", dec!(10), GamblingBetType::Bet))
        .when(rollback("rb-1", "bet-1"))
        .then_outcome(|o| {
            assert_eq!(o.amount, dec!(10));
            assert!(!o.limit_changed);
        })
        .then_model(|m| assert_eq!(m.balance(), dec!(100)))
        .run();
}

#[test]
fn second_rollback_is_rejected() {
    ModelTest::new()
        .given_model(funded())
        .given(bet("bet-1", dec!(10), GamblingBetType::Bet))
        .given(rollback("rb-1", "bet-1"))
        .when(rollback("rb-2", "bet-1"))
        .then_rejected_with(ErrorCode::RollbackNotAllowed)
        .then_model(|m| assert_eq!(m.balance(), dec!(100)))
        .run();
}

#[test]
fn rollback_after_refund_is_rejected() {
    ModelTest::new()
        .given_model(funded())
        .given(bet("bet-1", dec!(15), GamblingBetType::Tips))
        .given(refund("rf-1", "bet-1"))
        .when(rollback("rb-1", "bet-1"))
        .then_rejected_with(ErrorCode::RollbackNotAllowed)
        .run();
}

#[test]
fn win_class_transactions_cannot_be_rolled_back() {
    for win_type in [
        GamblingWinType::Win,
        GamblingWinType::Jackpot,
        GamblingWinType::Freespin,
    ] {
        ModelTest::new()
            .given_model(funded())
            .given(win("win-1", dec!(20), win_type))
            .when(rollback("rb-1", "win-1"))
            .then_rejected_with(ErrorCode::RollbackNotAllowed)
            .then_model(|m| assert_eq!(m.balance(), dec!(120)))
            .run();
    }
}

#[test]
fn tournament_award_cannot_be_rolled_back() {
    ModelTest::new()
        .given_model(funded())
        .given(WalletCommand::Tournament {
            transaction_id: "t-1".to_string(),
            amount: dec!(50),
        })
        .when(rollback("rb-1", "t-1"))
        .then_rejected_with(ErrorCode::RollbackNotAllowed)
        .run();
}

#[test]
fn rollback_of_unknown_bet_is_not_found() {
    ModelTest::new()
        .given_model(funded())
        .when(rollback("rb-1", "never-placed"))
        .then_rejected_with(ErrorCode::TransactionNotFound)
        .run();
}

// =============================================================================
// Turnover limits
// =============================================================================

#[test]
fn wagering_bets_spend_the_turnover_limit() {
    for bet_type in [
        GamblingBetType::Bet,
        GamblingBetType::Tips,
        GamblingBetType::Freespin,
    ] {
        ModelTest::new()
            .given_model(with_daily_limit(dec!(50)))
            .when(bet("bet-1", dec!(20), bet_type))
            .then_outcome(|o| assert!(o.limit_changed))
            .then_model(|m| {
                let limit = m.turnover_limit(IntervalType::Daily).unwrap();
                assert_eq!(limit.spent, dec!(20));
                assert_eq!(limit.rest, dec!(30));
            })
            .run();
    }
}

#[test]
fn credits_leave_the_turnover_limit_alone() {
    ModelTest::new()
        .given_model(with_daily_limit(dec!(50)))
        .given(bet("bet-1", dec!(20), GamblingBetType::Bet))
        .given(win("win-1", dec!(40), GamblingWinType::Win))
        .given(payment(7, dec!(5), BettingPaymentType::Bet))
        .given(payment(7, dec!(0), BettingPaymentType::Loss))
        .when(rollback("rb-1", "bet-1"))
        .then_outcome(|o| assert!(!o.limit_changed))
        .then_model(|m| {
            let limit = m.turnover_limit(IntervalType::Daily).unwrap();
            assert_eq!(limit.spent, dec!(25));
            assert_eq!(limit.rest, dec!(25));
        })
        .run();
}

#[test]
fn bet_over_the_limit_rest_is_rejected() {
    ModelTest::new()
        .given_model(with_daily_limit(dec!(30)))
        .given(bet("bet-1", dec!(25), GamblingBetType::Bet))
        .when(bet("bet-2", dec!(10), GamblingBetType::Bet))
        .then_rejected_with(ErrorCode::LimitReached)
        .run();
}

// =============================================================================
// Deposits and withdrawals
// =============================================================================

#[test]
fn only_real_money_wagering_counts_toward_the_deposit() {
    let deposit_uuid = Uuid::new_v4();
    ModelTest::new()
        .given_model(WalletModel::new("EUR", Decimal::ZERO))
        .given(WalletCommand::Deposit {
            deposit_uuid,
            amount: dec!(100),
        })
        .given(bet("bet-1", dec!(10), GamblingBetType::Bet))
        .given(bet("fs-1", dec!(10), GamblingBetType::Freespin))
        .given(win("win-1", dec!(30), GamblingWinType::Win))
        .given(rollback("rb-1", "fs-1"))
        .when(bet("tips-1", dec!(5), GamblingBetType::Tips))
        .then_outcome(move |o| assert_eq!(o.wagered_deposit, Some(deposit_uuid)))
        .then_model(move |m| assert_eq!(m.deposit(deposit_uuid).unwrap().wagering, dec!(15)))
        .run();
}

#[test]
fn reversals_credits_and_settlements_leave_deposit_wagering_alone() {
    let deposit_uuid = Uuid::new_v4();
    ModelTest::new()
        .given_model(WalletModel::new("EUR", Decimal::ZERO))
        .given(WalletCommand::Deposit {
            deposit_uuid,
            amount: dec!(200),
        })
        .given(bet("bet-1", dec!(10), GamblingBetType::Bet))
        .given(rollback("rb-1", "bet-1"))
        .given(bet("bet-2", dec!(20), GamblingBetType::Bet))
        .given(refund("rf-2", "bet-2"))
        .given(WalletCommand::Tournament {
            transaction_id: "tour-1".to_string(),
            amount: dec!(15),
        })
        .given(payment(1, dec!(7), BettingPaymentType::Bet))
        .given(payment(2, dec!(3), BettingPaymentType::Bet))
        .given(payment(2, dec!(3), BettingPaymentType::Refund))
        .when(payment(1, Decimal::ZERO, BettingPaymentType::Loss))
        .then_outcome(|o| assert_eq!(o.wagered_deposit, None))
        .then_model(move |m| {
            // 10 + 20 casino stakes, 7 + 3 sportsbook stakes
            assert_eq!(m.deposit(deposit_uuid).unwrap().wagering, dec!(40));
            assert_eq!(m.balance(), dec!(208));
        })
        .run();
}

#[test]
fn withdrawal_places_a_hold() {
    let withdrawal_uuid = Uuid::new_v4();
    ModelTest::new()
        .given_model(funded())
        .when(WalletCommand::Withdrawal {
            withdrawal_uuid,
            amount: dec!(40),
        })
        .then_model(move |m| {
            assert_eq!(m.balance(), dec!(60));
            assert_eq!(m.available_withdrawal_balance(), dec!(60));
            assert_eq!(m.holds().len(), 1);
            assert_eq!(m.holds()[0].reason_uuid, withdrawal_uuid);
        })
        .run();
}

#[test]
fn withdrawal_above_withdrawable_is_rejected() {
    ModelTest::new()
        .given_model(funded())
        .when(WalletCommand::Withdrawal {
            withdrawal_uuid: Uuid::new_v4(),
            amount: dec!(100.01),
        })
        .then_rejected_with(ErrorCode::InsufficientBalance)
        .run();
}

// =============================================================================
// Cache window and blockers
// =============================================================================

#[test]
fn bet_past_capacity_evicts_the_oldest_yet_stays_reversible() {
    let bets = (0..=CACHE_CAPACITY).map(|i| bet(&format!("bet-{i}"), dec!(1), GamblingBetType::Bet));
    ModelTest::new()
        .given_model(funded())
        .given_all(bets)
        .when(rollback("rb-1", "bet-0"))
        .then_outcome(|o| assert_eq!(o.evicted.as_deref(), Some("bet-1")))
        .then_model(|m| {
            assert!(!m.is_cached("bet-0"));
            assert_eq!(m.balance(), dec!(50));
        })
        .run();
}

#[test]
fn blocked_gambling_still_allows_rollback() {
    let mut model = funded();
    model.execute(&bet("bet-1", dec!(10), GamblingBetType::Bet)).unwrap();
    model.set_blockers(false, false);

    ModelTest::new()
        .given_model(model.clone())
        .when(rollback("rb-1", "bet-1"))
        .then_model(|m| assert_eq!(m.balance(), dec!(100)))
        .run();

    ModelTest::new()
        .given_model(model)
        .when(bet("bet-2", dec!(10), GamblingBetType::Bet))
        .then_rejected_with(ErrorCode::GamblingBlocked)
        .run();
}

#[test]
fn non_positive_amounts_are_invalid() {
    for amount in [dec!(0), dec!(-5)] {
        ModelTest::new()
            .given_model(funded())
            .when(bet("bet-1", amount, GamblingBetType::Bet))
            .then_rejected_with(ErrorCode::ValidationError)
            .run();
    }
}
