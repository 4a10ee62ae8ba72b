//! Service layer for potledger
//!
//! Services hold the business rules. Each one borrows a `LedgerState`
//! draft mutably and either applies a whole operation or returns an error
//! before changing anything; persistence is the engine's job.

pub mod account;
pub mod execution;
pub mod history;
pub mod matching;
pub mod reset;
pub mod schedule;

pub use account::{
    AccountRemoval, AccountService, AccountUpdate, NewAccount, NewPot, NewScheduledPayment,
    PotRemoval, PotUpdate,
};
pub use execution::{ExecutionService, ExecutionSummary, TransferExecution};
pub use history::{EventDeletion, HistoryService};
pub use matching::{find_record, MatchKey};
pub use reset::{PurgeSummary, ResetService, ResetSummary};
pub use schedule::{NewIncomeSchedule, NewTransferSchedule, NewYearlyTransaction, ScheduleService};
