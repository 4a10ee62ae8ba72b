//! Transaction record display formatting
//!
//! Formats records and their event histories for terminal output.

use crate::models::{TransactionKind, TransactionRecord};
use crate::state::LedgerState;

/// Format all records as a table
pub fn format_transaction_list(state: &LedgerState, symbol: &str) -> String {
    if state.transactions.is_empty() {
        return "No transactions found.".to_string();
    }

    let records: Vec<&TransactionRecord> = state.transactions.values().collect();
    let name_width = records
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<7}  {:<12}  {:<name_width$}  {:>12}  {:>4}  {:<9}  {}\n",
        "ID",
        "Kind",
        "Name",
        "Amount",
        "Runs",
        "State",
        "Last Run",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<7}  {:-<12}  {:-<name_width$}  {:->12}  {:->4}  {:-<9}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for record in records {
        let last_run = record
            .last_event()
            .map(|e| e.executed_at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<7}  {:<12}  {:<name_width$}  {:>12}  {:>4}  {:<9}  {}\n",
            record.id.to_string(),
            record.kind.to_string(),
            record.name,
            record.amount.format_with_symbol(symbol),
            record.execution_count(),
            record.state().to_string(),
            last_run,
            name_width = name_width,
        ));
    }

    output
}

/// Format one record with its full event history
pub fn format_transaction_details(
    state: &LedgerState,
    record: &TransactionRecord,
    symbol: &str,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", record.name));
    output.push_str(&format!("  ID:        {}\n", record.id));
    output.push_str(&format!("  Kind:      {}\n", record.kind));
    output.push_str(&format!(
        "  Amount:    {}\n",
        record.amount.format_with_symbol(symbol)
    ));
    output.push_str(&format!("  State:     {}\n", record.state()));
    if let Some(source) = record.source {
        output.push_str(&format!("  From:      {}\n", state.ref_name(source)));
    }
    if let Some(destination) = record.destination {
        output.push_str(&format!("  To:        {}\n", state.ref_name(destination)));
    }
    if let Some(card) = record.linked_credit_account_id {
        output.push_str(&format!("  Card:      {}\n", card));
    }
    if let Some(schedule) = record.transfer_schedule_id {
        output.push_str(&format!("  Schedule:  {}\n", schedule));
    }
    if record.kind == TransactionKind::Yearly {
        let date = match record.yearly_date() {
            Some(Ok(date)) => date.to_string(),
            Some(Err(_)) => format!(
                "{} (invalid, never recurs)",
                record.date.as_deref().unwrap_or_default()
            ),
            None => "-".to_string(),
        };
        output.push_str(&format!("  Date:      {}\n", date));
    }

    output.push_str(&format!("\n  Events ({}):\n", record.execution_count()));
    if record.events.is_empty() {
        output.push_str("    (none)\n");
    }
    for event in &record.events {
        output.push_str(&format!(
            "    {:<8}  {}  {:>12}\n",
            event.id.to_string(),
            event.executed_at.format("%Y-%m-%d %H:%M"),
            event.amount.format_with_symbol(symbol)
        ));
    }
    output.push_str(&format!(
        "  Total applied: {}\n",
        record.total_applied().format_with_symbol(symbol)
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventId, Money, TransactionEvent, TransactionId};
    use chrono::{TimeZone, Utc};

    fn record() -> TransactionRecord {
        let mut record = TransactionRecord::new(
            TransactionId::new(4),
            TransactionKind::CreditCardCharge,
            "Netflix",
            Money::from_cents(1599),
        );
        for id in 1..=2 {
            record.append_event(TransactionEvent {
                id: EventId::new(id),
                executed_at: Utc.with_ymd_and_hms(2026, id as u32, 1, 9, 0, 0).unwrap(),
                amount: Money::from_cents(1599),
            });
        }
        record
    }

    #[test]
    fn test_list_shows_run_count() {
        let mut state = LedgerState::new();
        let record = record();
        state.transactions.insert(record.id, record);

        let output = format_transaction_list(&state, "$");
        assert!(output.contains("Netflix"));
        assert!(output.contains("Card Charge"));
        assert!(output.contains("2026-02-01"));
    }

    #[test]
    fn test_details_list_events_and_total() {
        let output = format_transaction_details(&LedgerState::new(), &record(), "$");
        assert!(output.contains("Events (2)"));
        assert!(output.contains("evt-1"));
        assert!(output.contains("Total applied: $31.98"));
    }
}
