//! Turnover limits: player-configured caps on wagered volume per period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Period a turnover limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalType {
    /// Resets every day
    Daily,
    /// Resets every week
    Weekly,
    /// Resets every month
    Monthly,
}

impl IntervalType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected state of one turnover limit.
///
/// `spent + rest == amount` holds until the limit is exhausted; `rest` never
/// goes below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnoverLimit {
    /// Configured cap
    pub amount: Decimal,
    /// Wagered so far in the current period
    pub spent: Decimal,
    /// Remaining headroom
    pub rest: Decimal,
    /// Period
    pub interval: IntervalType,
    /// Currency of the cap
    pub currency: String,
}

impl TurnoverLimit {
    /// A fresh limit with nothing spent.
    #[must_use]
    pub fn new(amount: Decimal, interval: IntervalType, currency: impl Into<String>) -> Self {
        Self {
            amount,
            spent: Decimal::ZERO,
            rest: amount,
            interval,
            currency: currency.into(),
        }
    }

    /// Whether a wager of `amount` fits in the remaining headroom.
    #[must_use]
    pub fn allows(&self, amount: Decimal) -> bool {
        amount <= self.rest
    }

    /// Record a wager against the limit.
    pub fn spend(&mut self, amount: Decimal) {
        self.spent += amount;
        self.rest = (self.amount - self.spent).max(Decimal::ZERO);
    }
}
