//! Storage layer for potledger
//!
//! Provides the snapshot codec for the single ledger document and the
//! persistence gateway that writes it atomically.

pub mod file_io;
pub mod gateway;
pub mod snapshot;

pub use file_io::{read_optional, write_atomic};
pub use gateway::{JsonFileStore, MemoryStore, SnapshotStore};
pub use snapshot::{decode, encode};
