//! Expectation model of a single wallet.
//!
//! [`WalletModel`] is the oracle the scenarios assert against. It mirrors the
//! observable state of one wallet (balance, withdrawable balance, turnover
//! limits, deposit wagering, the recent-transaction cache, holds) and predicts
//! what the platform does with each [`WalletCommand`]: either an [`Outcome`]
//! (the event to expect and the state afterwards) or a [`ModelRejection`] (the
//! error code the API must return).
//!
//! Commands are handled in two steps: [`WalletModel::decide`] validates a
//! command against the current state and produces a [`Fact`], then
//! [`WalletModel::apply`] folds the fact into the state. Validation never
//! mutates, so a rejected command leaves the model untouched.

use crate::aggregate::{DepositStatus, WalletAggregate};
use crate::error::ErrorCode;
use crate::event::WalletEventType;
use crate::limit::{IntervalType, TurnoverLimit};
use crate::transaction::{BettingPaymentType, GamblingBetType, GamblingWinType, OperationKind};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;
use uuid::Uuid;

/// Number of gambling transactions the Redis aggregate keeps.
pub const GAMBLING_CACHE_CAPACITY: usize = 50;

/// An operation the suite performs against the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCommand {
    /// Casino stake (`/bet`)
    Bet {
        /// Provider transaction id
        transaction_id: String,
        /// Stake
        amount: Decimal,
        /// Bet type
        bet_type: GamblingBetType,
    },
    /// Casino payout (`/win`)
    Win {
        /// Provider transaction id
        transaction_id: String,
        /// Payout
        amount: Decimal,
        /// Win type
        win_type: GamblingWinType,
    },
    /// Tournament prize (`/tournament`)
    Tournament {
        /// Provider transaction id
        transaction_id: String,
        /// Prize
        amount: Decimal,
    },
    /// Provider refund of a bet (`/refund`)
    Refund {
        /// Provider transaction id of the refund
        transaction_id: String,
        /// Bet being refunded
        bet_transaction_id: String,
    },
    /// Rollback of a bet (`/rollback`)
    Rollback {
        /// Provider transaction id of the rollback
        transaction_id: String,
        /// Bet being rolled back
        bet_transaction_id: String,
    },
    /// Sportsbook payment (`/make-payment`)
    BettingPayment {
        /// Sportsbook bet id
        bet_id: i64,
        /// Amount
        amount: Decimal,
        /// Payment type
        payment_type: BettingPaymentType,
    },
    /// Deposit through the public API
    Deposit {
        /// Deposit id
        deposit_uuid: Uuid,
        /// Amount
        amount: Decimal,
    },
    /// Withdrawal through the public API
    Withdrawal {
        /// Withdrawal id
        withdrawal_uuid: Uuid,
        /// Amount
        amount: Decimal,
    },
    /// Back-office balance adjustment, signed
    AdjustBalance {
        /// Signed amount
        amount: Decimal,
    },
}

impl WalletCommand {
    /// Operation classification of the command.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Bet { bet_type, .. } => OperationKind::GamblingBet(*bet_type),
            Self::Win { win_type, .. } => OperationKind::GamblingWin(*win_type),
            Self::Tournament { .. } => OperationKind::Tournament,
            Self::Refund { .. } => OperationKind::Refund,
            Self::Rollback { .. } => OperationKind::Rollback,
            Self::BettingPayment { payment_type, .. } => OperationKind::Betting(*payment_type),
            Self::Deposit { .. } => OperationKind::Deposit,
            Self::Withdrawal { .. } => OperationKind::Withdrawal,
            Self::AdjustBalance { .. } => OperationKind::BalanceAdjustment,
        }
    }

    /// Event the platform publishes when the command succeeds.
    #[must_use]
    pub const fn expected_event(&self) -> WalletEventType {
        match self {
            Self::Bet { .. } => WalletEventType::BettedFromGamble,
            Self::Win { .. } => WalletEventType::WonFromGamble,
            Self::Tournament { .. } => WalletEventType::TournamentWonFromGamble,
            Self::Refund { .. } => WalletEventType::RefundedFromGamble,
            Self::Rollback { .. } => WalletEventType::RollbackedFromGamble,
            Self::BettingPayment { payment_type, .. } => match payment_type {
                BettingPaymentType::Bet => WalletEventType::BettedFromIframe,
                BettingPaymentType::Win => WalletEventType::WonFromIframe,
                BettingPaymentType::Loss => WalletEventType::LostFromIframe,
                BettingPaymentType::Refund => WalletEventType::RefundedFromIframe,
            },
            Self::Deposit { .. } => WalletEventType::DepositedMoney,
            Self::Withdrawal { .. } => WalletEventType::BlockAmountStarted,
            Self::AdjustBalance { .. } => WalletEventType::BalanceAdjusted,
        }
    }
}

/// Why the platform must reject a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {reason}")]
pub struct ModelRejection {
    /// Error code the API must return
    pub code: ErrorCode,
    /// What the model found wrong
    pub reason: String,
}

impl ModelRejection {
    fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// A validated command, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    kind: OperationKind,
    event: WalletEventType,
    /// Gambling cache key, for casino operations
    cache_key: Option<String>,
    /// Signed balance movement
    delta: Decimal,
    /// Bet reversed by a refund or rollback
    reverses: Option<String>,
    /// Sportsbook bet opened by the payment
    opens_betting: Option<i64>,
    /// Sportsbook bet settled by the payment
    settles_betting: Option<i64>,
    /// Deposit or withdrawal id
    payment_uuid: Option<Uuid>,
}

/// Predicted result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Operation performed
    pub kind: OperationKind,
    /// Event published on the wallet subject
    pub event: WalletEventType,
    /// Absolute amount moved
    pub amount: Decimal,
    /// Balance afterwards
    pub balance: Decimal,
    /// Whether a `limit_changed_v2` event follows
    pub limit_changed: bool,
    /// Deposit the wagering was credited to
    pub wagered_deposit: Option<Uuid>,
    /// Transaction pushed out of the aggregate cache
    pub evicted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GamblingRecord {
    kind: OperationKind,
    amount: Decimal,
    reversed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BettingRecord {
    stake: Decimal,
    settled: bool,
}

/// Expected wagering state of one deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositProgress {
    /// Deposit id
    pub uuid: Uuid,
    /// Deposited amount, also the wagering requirement
    pub amount: Decimal,
    /// Real-money wagering credited so far
    pub wagering: Decimal,
}

impl DepositProgress {
    /// Whether more wagering can be credited to this deposit.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.wagering < self.amount
    }
}

/// Expected withdrawal hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hold {
    /// Withdrawal that caused the hold
    pub reason_uuid: Uuid,
    /// Held amount
    pub amount: Decimal,
}

/// Expected state of one wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletModel {
    currency: String,
    balance: Decimal,
    available_withdrawal_balance: Decimal,
    gambling_active: bool,
    betting_active: bool,
    limits: BTreeMap<IntervalType, TurnoverLimit>,
    deposits: Vec<DepositProgress>,
    holds: Vec<Hold>,
    /// Every casino transaction ever made, evicted or not
    gambling: HashMap<String, GamblingRecord>,
    /// Cache order, oldest first
    cached: VecDeque<String>,
    betting: HashMap<i64, BettingRecord>,
}

impl WalletModel {
    /// An empty, active wallet.
    #[must_use]
    pub fn new(currency: impl Into<String>, balance: Decimal) -> Self {
        Self {
            currency: currency.into(),
            balance,
            available_withdrawal_balance: balance,
            gambling_active: true,
            betting_active: true,
            limits: BTreeMap::new(),
            deposits: Vec::new(),
            holds: Vec::new(),
            gambling: HashMap::new(),
            cached: VecDeque::new(),
            betting: HashMap::new(),
        }
    }

    /// Seed the model from a cached aggregate.
    ///
    /// Cached gambling entries only occupy cache slots: their kind is not
    /// recorded on the aggregate, so they cannot be reversed through the model.
    #[must_use]
    pub fn from_aggregate(aggregate: &WalletAggregate) -> Self {
        let mut model = Self::new(aggregate.currency.clone(), aggregate.balance);
        model.available_withdrawal_balance = aggregate.available_withdrawal_balance;
        model.gambling_active = aggregate.is_gambling_active;
        model.betting_active = aggregate.is_betting_active;

        for entry in aggregate.limits.iter().filter(|l| l.status) {
            if entry.limit_type.eq_ignore_ascii_case("turnover") {
                model.limits.insert(
                    entry.interval_type,
                    TurnoverLimit {
                        amount: entry.amount,
                        spent: entry.spent,
                        rest: entry.rest,
                        interval: entry.interval_type,
                        currency: entry.currency_code.clone(),
                    },
                );
            }
        }

        let mut deposits: Vec<_> = aggregate
            .deposits
            .iter()
            .filter(|d| d.status == DepositStatus::Success)
            .collect();
        deposits.sort_by_key(|d| d.started_at);
        model.deposits = deposits
            .into_iter()
            .map(|d| DepositProgress {
                uuid: d.uuid,
                amount: d.amount,
                wagering: d.wagering_amount,
            })
            .collect();

        model.holds = aggregate
            .blocked_amounts
            .iter()
            .filter_map(|b| {
                b.reason_uuid.map(|reason_uuid| Hold {
                    reason_uuid,
                    amount: b.amount,
                })
            })
            .collect();

        let mut cached: Vec<_> = aggregate.gambling.iter().collect();
        cached.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then_with(|| a.0.cmp(b.0)));
        model.cached = cached.into_iter().map(|(id, _)| id.clone()).collect();

        model
    }

    /// Wallet currency.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Expected balance.
    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Expected withdrawable balance.
    #[must_use]
    pub const fn available_withdrawal_balance(&self) -> Decimal {
        self.available_withdrawal_balance
    }

    /// Whether new casino bets are accepted.
    #[must_use]
    pub const fn is_gambling_active(&self) -> bool {
        self.gambling_active
    }

    /// Whether new sportsbook bets are accepted.
    #[must_use]
    pub const fn is_betting_active(&self) -> bool {
        self.betting_active
    }

    /// Expected turnover limit of a period.
    #[must_use]
    pub fn turnover_limit(&self, interval: IntervalType) -> Option<&TurnoverLimit> {
        self.limits.get(&interval)
    }

    /// All expected turnover limits.
    pub fn turnover_limits(&self) -> impl Iterator<Item = &TurnoverLimit> {
        self.limits.values()
    }

    /// Expected wagering of a deposit.
    #[must_use]
    pub fn deposit(&self, deposit_uuid: Uuid) -> Option<&DepositProgress> {
        self.deposits.iter().find(|d| d.uuid == deposit_uuid)
    }

    /// Every deposit, oldest first.
    #[must_use]
    pub fn deposits(&self) -> &[DepositProgress] {
        &self.deposits
    }

    /// Expected withdrawal holds.
    #[must_use]
    pub fn holds(&self) -> &[Hold] {
        &self.holds
    }

    /// Whether a casino transaction is still in the aggregate cache.
    #[must_use]
    pub fn is_cached(&self, transaction_id: &str) -> bool {
        self.cached.iter().any(|id| id == transaction_id)
    }

    /// Casino transactions expected in the aggregate cache, oldest first.
    pub fn cached_transactions(&self) -> impl Iterator<Item = &str> {
        self.cached.iter().map(String::as_str)
    }

    /// Register a turnover limit created through the public API.
    pub fn set_turnover_limit(&mut self, limit: TurnoverLimit) {
        self.limits.insert(limit.interval, limit);
    }

    /// Apply back-office blockers.
    pub const fn set_blockers(&mut self, gambling_active: bool, betting_active: bool) {
        self.gambling_active = gambling_active;
        self.betting_active = betting_active;
    }

    /// Predict the outcome of `command` without changing the model.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelRejection`] the platform is expected to answer with.
    pub fn predict(&self, command: &WalletCommand) -> Result<Outcome, ModelRejection> {
        let fact = self.decide(command)?;
        Ok(self.clone().apply(fact))
    }

    /// Validate and apply `command`.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelRejection`] the platform is expected to answer with;
    /// the model is left unchanged.
    pub fn execute(&mut self, command: &WalletCommand) -> Result<Outcome, ModelRejection> {
        let fact = self.decide(command)?;
        let outcome = self.apply(fact);
        tracing::debug!(
            kind = %outcome.kind,
            amount = %outcome.amount,
            balance = %outcome.balance,
            "Model applied command"
        );
        Ok(outcome)
    }

    /// Validate a command against the current state.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelRejection`] the platform is expected to answer with.
    pub fn decide(&self, command: &WalletCommand) -> Result<Fact, ModelRejection> {
        let kind = command.kind();
        let mut fact = Fact {
            kind,
            event: command.expected_event(),
            cache_key: None,
            delta: Decimal::ZERO,
            reverses: None,
            opens_betting: None,
            settles_betting: None,
            payment_uuid: None,
        };

        match command {
            WalletCommand::Bet {
                transaction_id,
                amount,
                ..
            } => {
                require_positive(*amount)?;
                if !self.gambling_active {
                    return Err(ModelRejection::new(
                        ErrorCode::GamblingBlocked,
                        "gambling is blocked for the player",
                    ));
                }
                self.require_new_transaction(transaction_id)?;
                self.check_wager(*amount)?;
                fact.cache_key = Some(transaction_id.clone());
                fact.delta = -*amount;
            }
            WalletCommand::Win {
                transaction_id,
                amount,
                ..
            }
            | WalletCommand::Tournament {
                transaction_id,
                amount,
            } => {
                require_positive(*amount)?;
                self.require_new_transaction(transaction_id)?;
                fact.cache_key = Some(transaction_id.clone());
                fact.delta = *amount;
            }
            WalletCommand::Refund {
                transaction_id,
                bet_transaction_id,
            }
            | WalletCommand::Rollback {
                transaction_id,
                bet_transaction_id,
            } => {
                let target = self.gambling.get(bet_transaction_id).ok_or_else(|| {
                    ModelRejection::new(
                        ErrorCode::TransactionNotFound,
                        format!("no transaction {bet_transaction_id}"),
                    )
                })?;
                if !target.kind.is_rollbackable() {
                    return Err(ModelRejection::new(
                        ErrorCode::RollbackNotAllowed,
                        format!("{} {bet_transaction_id} cannot be reversed", target.kind),
                    ));
                }
                if target.reversed {
                    return Err(ModelRejection::new(
                        ErrorCode::RollbackNotAllowed,
                        format!("bet {bet_transaction_id} was already reversed"),
                    ));
                }
                self.require_new_transaction(transaction_id)?;
                fact.cache_key = Some(transaction_id.clone());
                fact.delta = target.amount;
                fact.reverses = Some(bet_transaction_id.clone());
            }
            WalletCommand::BettingPayment {
                bet_id,
                amount,
                payment_type,
            } => self.decide_betting(&mut fact, *bet_id, *amount, *payment_type)?,
            WalletCommand::Deposit {
                deposit_uuid,
                amount,
            } => {
                require_positive(*amount)?;
                fact.delta = *amount;
                fact.payment_uuid = Some(*deposit_uuid);
            }
            WalletCommand::Withdrawal {
                withdrawal_uuid,
                amount,
            } => {
                require_positive(*amount)?;
                if *amount > self.available_withdrawal_balance {
                    return Err(ModelRejection::new(
                        ErrorCode::InsufficientBalance,
                        format!(
                            "withdrawal of {amount} exceeds withdrawable {}",
                            self.available_withdrawal_balance
                        ),
                    ));
                }
                fact.delta = -*amount;
                fact.payment_uuid = Some(*withdrawal_uuid);
            }
            WalletCommand::AdjustBalance { amount } => {
                if amount.is_zero() {
                    return Err(ModelRejection::new(
                        ErrorCode::ValidationError,
                        "adjustment amount must not be zero",
                    ));
                }
                if self.balance + *amount < Decimal::ZERO {
                    return Err(ModelRejection::new(
                        ErrorCode::InsufficientBalance,
                        format!("adjustment {amount} exceeds balance {}", self.balance),
                    ));
                }
                fact.delta = *amount;
            }
        }

        Ok(fact)
    }

    fn decide_betting(
        &self,
        fact: &mut Fact,
        bet_id: i64,
        amount: Decimal,
        payment_type: BettingPaymentType,
    ) -> Result<(), ModelRejection> {
        if payment_type == BettingPaymentType::Loss {
            if amount < Decimal::ZERO {
                return Err(ModelRejection::new(
                    ErrorCode::ValidationError,
                    "amount must not be negative",
                ));
            }
        } else {
            require_positive(amount)?;
        }

        if payment_type == BettingPaymentType::Bet {
            if !self.betting_active {
                return Err(ModelRejection::new(
                    ErrorCode::BettingBlocked,
                    "betting is blocked for the player",
                ));
            }
            if self.betting.contains_key(&bet_id) {
                return Err(ModelRejection::new(
                    ErrorCode::ValidationError,
                    format!("sportsbook bet {bet_id} already exists"),
                ));
            }
            self.check_wager(amount)?;
            fact.delta = -amount;
            fact.opens_betting = Some(bet_id);
            return Ok(());
        }

        let bet = self.betting.get(&bet_id).ok_or_else(|| {
            ModelRejection::new(ErrorCode::TransactionNotFound, format!("no sportsbook bet {bet_id}"))
        })?;
        if bet.settled {
            return Err(ModelRejection::new(
                ErrorCode::RollbackNotAllowed,
                format!("sportsbook bet {bet_id} is already settled"),
            ));
        }
        fact.settles_betting = Some(bet_id);
        fact.delta = match payment_type {
            BettingPaymentType::Loss => Decimal::ZERO,
            BettingPaymentType::Refund => bet.stake,
            BettingPaymentType::Win | BettingPaymentType::Bet => amount,
        };
        Ok(())
    }

    fn require_new_transaction(&self, transaction_id: &str) -> Result<(), ModelRejection> {
        if self.gambling.contains_key(transaction_id) {
            return Err(ModelRejection::new(
                ErrorCode::ValidationError,
                format!("transaction id {transaction_id} was already used"),
            ));
        }
        Ok(())
    }

    fn check_wager(&self, amount: Decimal) -> Result<(), ModelRejection> {
        if amount > self.balance {
            return Err(ModelRejection::new(
                ErrorCode::InsufficientBalance,
                format!("stake {amount} exceeds balance {}", self.balance),
            ));
        }
        if let Some(limit) = self.limits.values().find(|l| !l.allows(amount)) {
            return Err(ModelRejection::new(
                ErrorCode::LimitReached,
                format!("stake {amount} exceeds {} turnover rest {}", limit.interval, limit.rest),
            ));
        }
        Ok(())
    }

    /// Fold a validated fact into the state.
    pub fn apply(&mut self, fact: Fact) -> Outcome {
        let kind = fact.kind;
        let amount = fact.delta.abs();
        self.balance += fact.delta;

        match kind {
            OperationKind::GamblingBet(_) | OperationKind::Betting(BettingPaymentType::Bet) => {
                self.available_withdrawal_balance =
                    self.available_withdrawal_balance.min(self.balance);
            }
            OperationKind::GamblingWin(_)
            | OperationKind::Tournament
            | OperationKind::Betting(BettingPaymentType::Win) => {
                self.available_withdrawal_balance += amount;
            }
            OperationKind::Withdrawal => {
                self.available_withdrawal_balance -= amount;
            }
            OperationKind::BalanceAdjustment => {
                self.available_withdrawal_balance = (self.available_withdrawal_balance
                    + fact.delta)
                    .clamp(Decimal::ZERO, self.balance);
            }
            OperationKind::Refund
            | OperationKind::Rollback
            | OperationKind::Betting(BettingPaymentType::Loss | BettingPaymentType::Refund)
            | OperationKind::Deposit => {}
        }

        let limit_changed = kind.is_wagering() && !self.limits.is_empty();
        if kind.is_wagering() {
            for limit in self.limits.values_mut() {
                limit.spend(amount);
            }
        }

        let wagered_deposit = if kind.counts_toward_deposit_wagering() {
            self.deposits.iter_mut().find(|d| d.is_open()).map(|d| {
                d.wagering += amount;
                d.uuid
            })
        } else {
            None
        };

        if let Some(target) = fact.reverses.as_ref().and_then(|id| self.gambling.get_mut(id)) {
            target.reversed = true;
        }
        if let Some(bet_id) = fact.opens_betting {
            self.betting.insert(
                bet_id,
                BettingRecord {
                    stake: amount,
                    settled: false,
                },
            );
        }
        if let Some(bet) = fact.settles_betting.and_then(|id| self.betting.get_mut(&id)) {
            bet.settled = true;
        }

        match (kind, fact.payment_uuid) {
            (OperationKind::Deposit, Some(uuid)) => self.deposits.push(DepositProgress {
                uuid,
                amount,
                wagering: Decimal::ZERO,
            }),
            (OperationKind::Withdrawal, Some(reason_uuid)) => {
                self.holds.push(Hold {
                    reason_uuid,
                    amount,
                });
            }
            _ => {}
        }

        let evicted = fact.cache_key.and_then(|key| {
            self.gambling.insert(
                key.clone(),
                GamblingRecord {
                    kind,
                    amount,
                    reversed: false,
                },
            );
            self.cache(key)
        });

        Outcome {
            kind,
            event: fact.event,
            amount,
            balance: self.balance,
            limit_changed,
            wagered_deposit,
            evicted,
        }
    }

    fn cache(&mut self, key: String) -> Option<String> {
        if self.cached.contains(&key) {
            return None;
        }
        self.cached.push_back(key);
        if self.cached.len() > GAMBLING_CACHE_CAPACITY {
            self.cached.pop_front()
        } else {
            None
        }
    }
}

fn require_positive(amount: Decimal) -> Result<(), ModelRejection> {
    if amount <= Decimal::ZERO {
        return Err(ModelRejection::new(
            ErrorCode::ValidationError,
            format!("amount must be positive, got {amount}"),
        ));
    }
    Ok(())
}
