//! Amounts and command builders used across scenarios.

use rust_decimal::Decimal;
use wallet_e2e_clients::dto::manager::{
    BetRequest, MakePaymentRequest, RefundRequest, RollbackRequest, TournamentRequest, WinRequest,
};
use wallet_e2e_core::model::WalletCommand;
use wallet_e2e_core::transaction::GamblingBetType;

/// Balance a scenario player starts with.
pub const INITIAL_BALANCE: Decimal = Decimal::ONE_HUNDRED;

/// Default stake.
pub const STAKE: Decimal = Decimal::TEN;

/// Default win.
pub const PAYOUT: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Gambling transactions the aggregate keeps before evicting.
pub const CACHE_CAPACITY: usize = wallet_e2e_core::model::GAMBLING_CACHE_CAPACITY;

/// `amount` in cents, e.g. `cents(1050)` is 10.50.
#[must_use]
pub fn cents(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

/// Model command of a `/bet` request.
#[must_use]
pub fn bet_command(request: &BetRequest) -> WalletCommand {
    WalletCommand::Bet {
        transaction_id: request.transaction_id.clone(),
        amount: request.amount,
        bet_type: request.bet_type,
    }
}

/// Model command of a `/win` request.
#[must_use]
pub fn win_command(request: &WinRequest) -> WalletCommand {
    WalletCommand::Win {
        transaction_id: request.transaction_id.clone(),
        amount: request.amount,
        win_type: request.win_type,
    }
}

/// Model command of a `/refund` request.
#[must_use]
pub fn refund_command(request: &RefundRequest) -> WalletCommand {
    WalletCommand::Refund {
        transaction_id: request.transaction_id.clone(),
        bet_transaction_id: request.bet_transaction_id.clone(),
    }
}

/// Model command of a `/rollback` request.
#[must_use]
pub fn rollback_command(request: &RollbackRequest) -> WalletCommand {
    WalletCommand::Rollback {
        transaction_id: request.transaction_id.clone(),
        bet_transaction_id: request.rollback_transaction_id.clone(),
    }
}

/// Model command of a `/tournament` request.
#[must_use]
pub fn tournament_command(request: &TournamentRequest) -> WalletCommand {
    WalletCommand::Tournament {
        transaction_id: request.transaction_id.clone(),
        amount: request.amount,
    }
}

/// Model command of a `/make-payment` request.
#[must_use]
pub fn payment_command(request: &MakePaymentRequest) -> WalletCommand {
    WalletCommand::BettingPayment {
        bet_id: request.bet_id,
        amount: request.amount,
        payment_type: request.payment_type,
    }
}

/// `count` bets of `amount` on one session, each in its own round.
#[must_use]
pub fn bet_series(session_token: &str, amount: Decimal, count: usize) -> Vec<BetRequest> {
    (0..count)
        .map(|_| BetRequest::new(session_token, amount).with_type(GamblingBetType::Bet))
        .collect()
}
