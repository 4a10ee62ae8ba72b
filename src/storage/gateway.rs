//! Persistence gateway
//!
//! Durable storage for the encoded ledger document. The engine is the only
//! caller; it writes after every successful mutation and treats a failed
//! write as "the mutation never happened".

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{LedgerError, LedgerResult};

use super::file_io::{read_optional, write_atomic};

/// Somewhere a ledger document can be loaded from and saved to
///
/// Implementations are called from the blocking thread pool and may block.
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved document, `None` if nothing was ever saved
    fn load(&self) -> LedgerResult<Option<Vec<u8>>>;

    /// Replace the stored document
    fn save(&self, bytes: &[u8]) -> LedgerResult<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Stores the document as one JSON file, written atomically
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> LedgerResult<Option<Vec<u8>>> {
        read_optional(&self.path)
    }

    fn save(&self, bytes: &[u8]) -> LedgerResult<()> {
        write_atomic(&self.path, bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the document in memory
///
/// Useful for throwaway ledgers. Writes can be made to fail on demand to
/// exercise the engine's rollback path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<Vec<u8>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing document
    pub fn with_document(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Mutex::new(Some(bytes.into())),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of the stored document
    pub fn document(&self) -> Option<Vec<u8>> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.document())
    }

    fn save(&self, bytes: &[u8]) -> LedgerResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence(
                "in-memory store is refusing writes".into(),
            ));
        }
        *self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
