//! Classification of wallet-affecting operations.
//!
//! The wallet treats operations differently depending on what they are:
//! only wagering moves turnover limits, only real-money wagering moves deposit
//! wagering, and only bets can be reversed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bet types accepted by the Manager API `/bet` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamblingBetType {
    /// Regular real-money stake
    Bet,
    /// Tip to a live dealer, wagered like a bet
    Tips,
    /// Stake placed from a free-spin award
    Freespin,
}

/// Win types accepted by the Manager API `/win` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamblingWinType {
    /// Regular round win
    Win,
    /// Jackpot payout
    Jackpot,
    /// Win produced by a free-spin round
    Freespin,
}

/// Payment types accepted by the Manager API `/make-payment` (sportsbook) endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BettingPaymentType {
    /// Stake on a sports bet
    Bet,
    /// Settlement of a winning bet
    Win,
    /// Settlement of a losing bet (no balance movement)
    Loss,
    /// Cancellation of a bet, stake returned
    Refund,
}

/// Every operation that can change a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Casino stake
    GamblingBet(GamblingBetType),
    /// Casino payout
    GamblingWin(GamblingWinType),
    /// Tournament prize
    Tournament,
    /// Provider-initiated cancellation of a bet
    Refund,
    /// Platform-initiated reversal of a bet
    Rollback,
    /// Sportsbook payment
    Betting(BettingPaymentType),
    /// Incoming payment
    Deposit,
    /// Outgoing payment (held until processed)
    Withdrawal,
    /// Back-office correction
    BalanceAdjustment,
}

impl OperationKind {
    /// Whether the operation is wagering and therefore spends turnover limits.
    #[must_use]
    pub const fn is_wagering(&self) -> bool {
        matches!(
            self,
            Self::GamblingBet(_) | Self::Betting(BettingPaymentType::Bet)
        )
    }

    /// Whether the operation progresses deposit wagering.
    ///
    /// Free-spin stakes are wagering for limits but are not real money.
    #[must_use]
    pub const fn counts_toward_deposit_wagering(&self) -> bool {
        matches!(
            self,
            Self::GamblingBet(GamblingBetType::Bet | GamblingBetType::Tips)
                | Self::Betting(BettingPaymentType::Bet)
        )
    }

    /// Whether a refund or rollback may target this operation.
    #[must_use]
    pub const fn is_rollbackable(&self) -> bool {
        matches!(self, Self::GamblingBet(_))
    }

    /// Short upper-case label, as used in history tables and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::GamblingBet(GamblingBetType::Bet) | Self::Betting(BettingPaymentType::Bet) => {
                "BET"
            }
            Self::GamblingBet(GamblingBetType::Tips) => "TIPS",
            Self::GamblingBet(GamblingBetType::Freespin) => "FREESPIN",
            Self::GamblingWin(GamblingWinType::Win) | Self::Betting(BettingPaymentType::Win) => {
                "WIN"
            }
            Self::GamblingWin(GamblingWinType::Jackpot) => "JACKPOT",
            Self::GamblingWin(GamblingWinType::Freespin) => "FREESPIN_WIN",
            Self::Tournament => "TOURNAMENT",
            Self::Refund | Self::Betting(BettingPaymentType::Refund) => "REFUND",
            Self::Rollback => "ROLLBACK",
            Self::Betting(BettingPaymentType::Loss) => "LOSS",
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::BalanceAdjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
