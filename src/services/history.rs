//! Event history maintenance
//!
//! Removing events never reverses balances; it only rewrites history.

use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{EventId, ScheduleId, TransactionEvent, TransactionId, TransactionRecord};
use crate::state::LedgerState;

pub struct HistoryService<'a> {
    state: &'a mut LedgerState,
}

/// What deleting an event did to its record
#[derive(Debug, Clone)]
pub enum EventDeletion {
    /// The record still has other events
    Removed {
        event: TransactionEvent,
        record: TransactionRecord,
    },
    /// That was the last event; the record is gone too
    RecordRemoved {
        event: TransactionEvent,
        record: TransactionRecord,
        unlinked_schedule: Option<ScheduleId>,
    },
}

impl EventDeletion {
    pub fn event(&self) -> &TransactionEvent {
        match self {
            Self::Removed { event, .. } | Self::RecordRemoved { event, .. } => event,
        }
    }

    pub fn record_removed(&self) -> bool {
        matches!(self, Self::RecordRemoved { .. })
    }
}

impl<'a> HistoryService<'a> {
    pub fn new(state: &'a mut LedgerState) -> Self {
        Self { state }
    }

    /// Remove one event from a record
    ///
    /// A record left without events is deleted and any transfer schedule
    /// pointing at it is unlinked.
    pub fn delete_event(
        &mut self,
        transaction_id: TransactionId,
        event_id: EventId,
    ) -> LedgerResult<EventDeletion> {
        let record = self.state.transaction_mut(transaction_id)?;
        let event = record
            .remove_event(event_id)
            .ok_or_else(|| LedgerError::event_not_found(event_id))?;

        if !record.events.is_empty() {
            info!(transaction = %transaction_id, event = %event_id, "event deleted");
            return Ok(EventDeletion::Removed {
                event,
                record: record.clone(),
            });
        }

        let record = self
            .state
            .remove_transaction(transaction_id)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction_id))?;
        info!(
            transaction = %transaction_id,
            event = %event_id,
            "last event deleted, record removed"
        );
        Ok(EventDeletion::RecordRemoved {
            event,
            unlinked_schedule: record.transfer_schedule_id,
            record,
        })
    }

    /// Remove a whole record, unlinking its transfer schedule
    pub fn delete_transaction(&mut self, id: TransactionId) -> LedgerResult<TransactionRecord> {
        let record = self
            .state
            .remove_transaction(id)
            .ok_or_else(|| LedgerError::transaction_not_found(id))?;
        info!(transaction = %id, events = record.execution_count(), "transaction deleted");
        Ok(record)
    }
}
