//! Core data models for potledger
//!
//! This module contains all the data structures that represent the ledger
//! domain: accounts, pots, schedules, transaction records and logs.

pub mod account;
pub mod balance;
pub mod ids;
pub mod logs;
pub mod money;
pub mod pot;
pub mod schedule;
pub mod transaction;
pub mod yearly_date;

pub use account::{Account, AccountKind};
pub use balance::{Balance, BalanceRef};
pub use ids::{AccountId, EntityKind, EventId, IdCounters, PotId, ScheduleId, TransactionId};
pub use logs::{BalanceReductionLog, ProcessOutcome, ProcessedItemKind, ProcessedTransactionLog};
pub use money::Money;
pub use pot::Pot;
pub use schedule::{IncomeSchedule, ScheduleState, ScheduledPayment, TransferSchedule};
pub use transaction::{TransactionEvent, TransactionKind, TransactionRecord};
pub use yearly_date::YearlyDate;
