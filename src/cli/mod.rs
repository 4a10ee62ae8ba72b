//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the ledger engine.

pub mod account;
pub mod args;
pub mod income;
pub mod logs;
pub mod process;
pub mod transaction;
pub mod transfer;

pub use account::{
    handle_account_command, handle_payment_command, handle_pot_command, AccountCommands,
    PaymentCommands, PotCommands,
};
pub use income::{handle_income_command, IncomeCommands};
pub use logs::{handle_log_command, LogCommands};
pub use process::{handle_process_command, handle_reduce_command, handle_reset_command};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use transfer::{handle_transfer_command, TransferCommands};
