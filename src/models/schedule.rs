//! Recurring work: income schedules, transfer schedules and scheduled payments
//!
//! Each item is either Pending or Settled. Transfer schedules linked to a
//! credit card never settle; they stay Recurring and only accumulate events
//! on the transaction record they maintain.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::balance::BalanceRef;
use super::ids::{AccountId, PotId, ScheduleId, TransactionId};
use super::money::Money;
use super::transaction::TransactionEvent;

/// Logical completion state of a recurring item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Pending,
    Settled,
    Recurring,
}

impl fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Settled => write!(f, "Settled"),
            Self::Recurring => write!(f, "Recurring"),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Recurring credit into an account or pot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSchedule {
    pub id: ScheduleId,
    pub name: String,
    pub destination: BalanceRef,
    pub amount: Money,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    /// One event per execution, oldest first
    #[serde(default)]
    pub events: Vec<TransactionEvent>,
}

impl IncomeSchedule {
    pub fn state(&self) -> ScheduleState {
        if self.is_completed {
            ScheduleState::Settled
        } else {
            ScheduleState::Pending
        }
    }

    pub fn references_account(&self, account_id: AccountId) -> bool {
        self.destination.involves_account(account_id)
    }

    pub fn references_pot(&self, pot_id: PotId) -> bool {
        self.destination.involves_pot(pot_id)
    }
}

/// Recurring move of money between two accounts or pots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSchedule {
    pub id: ScheduleId,
    pub name: String,
    pub source: BalanceRef,
    pub destination: BalanceRef,
    pub amount: Money,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Never set for credit-card-linked schedules
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub linked_credit_account_id: Option<AccountId>,
    /// The `creditCardPayment` record this schedule appends to
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
}

impl TransferSchedule {
    pub fn is_card_linked(&self) -> bool {
        self.linked_credit_account_id.is_some()
    }

    pub fn state(&self) -> ScheduleState {
        if self.is_card_linked() {
            ScheduleState::Recurring
        } else if self.is_completed {
            ScheduleState::Settled
        } else {
            ScheduleState::Pending
        }
    }

    pub fn references_account(&self, account_id: AccountId) -> bool {
        self.source.involves_account(account_id)
            || self.destination.involves_account(account_id)
            || self.linked_credit_account_id == Some(account_id)
    }

    pub fn references_pot(&self, pot_id: PotId) -> bool {
        self.source.involves_pot(pot_id) || self.destination.involves_pot(pot_id)
    }
}

/// Day-of-month payment charged to the account that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    pub id: ScheduleId,
    pub name: String,
    pub amount: Money,
    /// 1-31; clamped to the last day of shorter months
    pub day_of_month: u32,
    /// Pot of the owning account to pay from instead of the account itself
    #[serde(default)]
    pub pot_id: Option<PotId>,
    /// Credit account the payment is charged to instead
    #[serde(default)]
    pub linked_credit_account_id: Option<AccountId>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
}

impl ScheduledPayment {
    /// Whether the payment already ran in the calendar month of `today`
    ///
    /// A completion flag without a timestamp (older documents) counts as
    /// processed.
    pub fn processed_in_period(&self, today: NaiveDate) -> bool {
        self.is_completed
            && self.last_executed.map_or(true, |at| {
                let at = at.date_naive();
                at.year() == today.year() && at.month() == today.month()
            })
    }

    /// Whether the configured day has been reached in the month of `today`
    pub fn day_reached(&self, today: NaiveDate) -> bool {
        today.day() >= self.day_of_month.min(days_in_month(today))
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.day_reached(today) && !self.processed_in_period(today)
    }

    pub fn state(&self, today: NaiveDate) -> ScheduleState {
        if self.processed_in_period(today) {
            ScheduleState::Settled
        } else {
            ScheduleState::Pending
        }
    }
}
