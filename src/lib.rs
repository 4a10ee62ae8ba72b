//! potledger - personal-finance ledger with pots and recurring schedules
//!
//! Accounts hold money directly or in named pots. Income schedules,
//! transfer schedules, monthly scheduled payments and yearly transactions
//! move that money, and every execution is recorded as an event on a
//! transaction record so history can be inspected and pruned later.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, pots, schedules, records, logs)
//! - `state`: The ledger aggregate and its id allocator
//! - `storage`: Snapshot codec and the persistence gateway
//! - `services`: Business rules applied to a ledger draft
//! - `engine`: Single-writer async engine over a snapshot store
//! - `cli`, `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use potledger::engine::LedgerEngine;
//! use potledger::services::NewAccount;
//!
//! let engine = LedgerEngine::open_file(paths.ledger_file()).await?;
//! let account = engine
//!     .create_account(NewAccount { name: "Checking".into(), ..Default::default() })
//!     .await?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use engine::LedgerEngine;
pub use error::{LedgerError, LedgerResult};
