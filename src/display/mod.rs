//! Display formatting for terminal output
//!
//! Plain-text tables and detail views. Nothing here computes balances; it
//! only renders committed state.

pub mod account;
pub mod logs;
pub mod schedule;
pub mod transaction;

pub use account::{format_account_details, format_account_list};
pub use logs::{format_processed_logs, format_reduction_logs};
pub use schedule::{format_income_list, format_transfer_list};
pub use transaction::{format_transaction_details, format_transaction_list};
