//! Transaction records and their execution events
//!
//! A record is one logical transaction. Every time it is applied an event is
//! appended, so repeated executions never create duplicate records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::balance::BalanceRef;
use super::ids::{AccountId, EventId, ScheduleId, TransactionId};
use super::money::Money;
use super::schedule::ScheduleState;
use super::yearly_date::{YearlyDate, YearlyDateError};

/// Kind of transaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Scheduled,
    Yearly,
    CreditCardCharge,
    CreditCardPayment,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "Scheduled"),
            Self::Yearly => write!(f, "Yearly"),
            Self::CreditCardCharge => write!(f, "Card Charge"),
            Self::CreditCardPayment => write!(f, "Card Payment"),
        }
    }
}

/// One execution of a transaction record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub id: EventId,
    pub executed_at: DateTime<Utc>,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub kind: TransactionKind,
    /// Display name or vendor
    pub name: String,
    pub amount: Money,
    #[serde(default)]
    pub source: Option<BalanceRef>,
    #[serde(default)]
    pub destination: Option<BalanceRef>,
    #[serde(default)]
    pub linked_credit_account_id: Option<AccountId>,
    /// Transfer schedule that maintains this record
    #[serde(default)]
    pub transfer_schedule_id: Option<ScheduleId>,
    /// Oldest first
    #[serde(default)]
    pub events: Vec<TransactionEvent>,
    /// `DD-MM-YYYY`, yearly records only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Completion for the current year, yearly records only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TransactionRecord {
    /// Create a record with no events yet
    pub fn new(
        id: TransactionId,
        kind: TransactionKind,
        name: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            amount,
            source: None,
            destination: None,
            linked_credit_account_id: None,
            transfer_schedule_id: None,
            events: Vec::new(),
            date: None,
            is_completed: None,
        }
    }

    /// Number of times this record has been applied
    pub fn execution_count(&self) -> usize {
        self.events.len()
    }

    pub fn last_event(&self) -> Option<&TransactionEvent> {
        self.events.last()
    }

    /// Sum of every amount actually applied
    pub fn total_applied(&self) -> Money {
        self.events.iter().map(|e| e.amount).sum()
    }

    pub fn append_event(&mut self, event: TransactionEvent) {
        self.events.push(event);
    }

    /// Remove an event, returning it if it existed
    pub fn remove_event(&mut self, event_id: EventId) -> Option<TransactionEvent> {
        let index = self.events.iter().position(|e| e.id == event_id)?;
        Some(self.events.remove(index))
    }

    /// Parsed yearly date, if this record has one
    pub fn yearly_date(&self) -> Option<Result<YearlyDate, YearlyDateError>> {
        self.date.as_deref().map(YearlyDate::parse)
    }

    pub fn is_yearly_completed(&self) -> bool {
        self.is_completed == Some(true)
    }

    pub fn state(&self) -> ScheduleState {
        match self.kind {
            TransactionKind::Yearly if self.is_yearly_completed() => ScheduleState::Settled,
            TransactionKind::Yearly => ScheduleState::Pending,
            _ if self.transfer_schedule_id.is_some() => ScheduleState::Recurring,
            _ => ScheduleState::Settled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: u64, cents: i64) -> TransactionEvent {
        TransactionEvent {
            id: EventId::new(id),
            executed_at: Utc.with_ymd_and_hms(2026, 1, id as u32, 12, 0, 0).unwrap(),
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_execution_count_tracks_events() {
        let mut record = TransactionRecord::new(
            TransactionId::new(1),
            TransactionKind::CreditCardPayment,
            "Visa",
            Money::from_cents(4000),
        );
        assert_eq!(record.execution_count(), 0);

        record.append_event(event(1, 4000));
        record.append_event(event(2, 4000));
        assert_eq!(record.execution_count(), 2);
        assert_eq!(record.total_applied(), Money::from_cents(8000));
        assert_eq!(record.last_event().map(|e| e.id), Some(EventId::new(2)));
    }

    #[test]
    fn test_remove_event() {
        let mut record = TransactionRecord::new(
            TransactionId::new(1),
            TransactionKind::Scheduled,
            "Gym",
            Money::from_cents(3000),
        );
        record.append_event(event(1, 3000));

        assert!(record.remove_event(EventId::new(9)).is_none());
        assert!(record.remove_event(EventId::new(1)).is_some());
        assert!(record.events.is_empty());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&TransactionKind::CreditCardCharge).unwrap();
        assert_eq!(json, "\"creditCardCharge\"");
    }

    #[test]
    fn test_yearly_fields_omitted_for_other_kinds() {
        let record = TransactionRecord::new(
            TransactionId::new(1),
            TransactionKind::Scheduled,
            "Gym",
            Money::from_cents(3000),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("date").is_none());
        assert!(json.get("isCompleted").is_none());
    }

    #[test]
    fn test_yearly_state() {
        let mut record = TransactionRecord::new(
            TransactionId::new(1),
            TransactionKind::Yearly,
            "Insurance",
            Money::from_cents(50000),
        );
        record.date = Some("25-12-2025".into());
        record.is_completed = Some(false);
        assert_eq!(record.state(), ScheduleState::Pending);
        assert!(matches!(record.yearly_date(), Some(Ok(_))));

        record.is_completed = Some(true);
        assert_eq!(record.state(), ScheduleState::Settled);
    }
}
