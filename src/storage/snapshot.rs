//! Snapshot codec
//!
//! Converts a [`LedgerState`] to and from the single JSON document the
//! ledger is persisted as. Missing collections and fields fall back to their
//! defaults so documents written by older versions keep loading; nothing is
//! migrated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, BalanceReductionLog, IdCounters, IncomeSchedule, ProcessedTransactionLog,
    TransactionRecord, TransferSchedule,
};
use crate::state::LedgerState;

/// Wire shape of the persisted document
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    income_schedules: Vec<IncomeSchedule>,
    #[serde(default)]
    transfer_schedules: Vec<TransferSchedule>,
    #[serde(default)]
    transactions: Vec<TransactionRecord>,
    #[serde(default)]
    processed_transaction_logs: Vec<ProcessedTransactionLog>,
    #[serde(default)]
    balance_reduction_logs: Vec<BalanceReductionLog>,
    #[serde(default)]
    last_reduction_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    counters: IdCounters,
}

fn duplicate(kind: &str, id: impl std::fmt::Display) -> LedgerError {
    LedgerError::MalformedSnapshot(format!("duplicate {} id {}", kind, id))
}

/// Collect entities into an id-keyed map, rejecting duplicate ids
fn index<K: Ord + Copy + std::fmt::Display, V>(
    kind: &str,
    items: Vec<V>,
    key: impl Fn(&V) -> K,
) -> LedgerResult<BTreeMap<K, V>> {
    let mut map = BTreeMap::new();
    for item in items {
        let id = key(&item);
        if map.insert(id, item).is_some() {
            return Err(duplicate(kind, id));
        }
    }
    Ok(map)
}

/// Decode a persisted document
///
/// Empty input yields an empty ledger. Structural problems (unparsable JSON,
/// duplicate ids within a kind) fail with `MalformedSnapshot`.
pub fn decode(bytes: &[u8]) -> LedgerResult<LedgerState> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(LedgerState::new());
    }

    let document: SnapshotDocument = serde_json::from_slice(bytes)?;

    let mut pot_ids = HashSet::new();
    for account in &document.accounts {
        for pot in &account.pots {
            if !pot_ids.insert(pot.id) {
                return Err(duplicate("pot", pot.id));
            }
        }
    }

    let mut schedule_ids = HashSet::new();
    let all_schedule_ids = document
        .income_schedules
        .iter()
        .map(|s| s.id)
        .chain(document.transfer_schedules.iter().map(|s| s.id))
        .chain(
            document
                .accounts
                .iter()
                .flat_map(|a| a.scheduled_payments.iter().map(|p| p.id)),
        );
    for id in all_schedule_ids {
        if !schedule_ids.insert(id) {
            return Err(duplicate("schedule", id));
        }
    }

    let mut state = LedgerState {
        accounts: index("account", document.accounts, |a| a.id)?,
        income_schedules: index("income schedule", document.income_schedules, |s| s.id)?,
        transfer_schedules: index("transfer schedule", document.transfer_schedules, |s| s.id)?,
        transactions: index("transaction", document.transactions, |t| t.id)?,
        processed_logs: document.processed_transaction_logs,
        reduction_logs: document.balance_reduction_logs,
        last_reduction_at: document.last_reduction_at,
        counters: document.counters,
    };

    for kind in state.repair_counters() {
        warn!(%kind, "id counter was behind existing ids; repaired");
    }

    let cleared = state.normalize_links();
    if cleared > 0 {
        warn!(cleared, "cleared one-sided schedule/transaction links");
    }

    Ok(state)
}

/// Encode a ledger as its persisted document
pub fn encode(state: &LedgerState) -> LedgerResult<Vec<u8>> {
    let document = SnapshotDocument {
        accounts: state.accounts.values().cloned().collect(),
        income_schedules: state.income_schedules.values().cloned().collect(),
        transfer_schedules: state.transfer_schedules.values().cloned().collect(),
        transactions: state.transactions.values().cloned().collect(),
        processed_transaction_logs: state.processed_logs.clone(),
        balance_reduction_logs: state.reduction_logs.clone(),
        last_reduction_at: state.last_reduction_at,
        counters: state.counters,
    };

    serde_json::to_vec_pretty(&document)
        .map_err(|e| LedgerError::Persistence(format!("Failed to serialize ledger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AccountId, AccountKind, BalanceRef, EntityKind, Money, Pot, ProcessedItemKind,
        ScheduleId, ScheduledPayment, TransactionEvent, TransactionId, TransactionKind,
    };
    use chrono::TimeZone;

    fn populated_state() -> LedgerState {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap();
        let mut state = LedgerState::new();

        let checking = state.next_account_id();
        let mut account = Account::new(checking, "Checking", AccountKind::Checking);
        account.balance = Money::from_cents(123456);
        account.monthly_baseline = Some(Money::from_cents(5000));
        let pot_id = state.next_pot_id();
        let mut pot = Pot::new(pot_id, "Bills");
        pot.balance = Money::from_cents(-1999);
        pot.exclude_from_reset = true;
        account.pots.push(pot);
        let payment_id = state.next_schedule_id();
        account.scheduled_payments.push(ScheduledPayment {
            id: payment_id,
            name: "Rent".into(),
            amount: Money::from_cents(90000),
            day_of_month: 28,
            pot_id: Some(pot_id),
            linked_credit_account_id: None,
            is_completed: true,
            last_executed: Some(at),
        });
        state.accounts.insert(checking, account);

        let card = state.next_account_id();
        let mut card_account = Account::new(card, "Visa", AccountKind::Credit);
        card_account.credit_limit = Some(Money::from_cents(200000));
        state.accounts.insert(card, card_account);

        let income_id = state.next_schedule_id();
        let income_event = state.new_event(at, Money::from_cents(250000));
        state.income_schedules.insert(
            income_id,
            IncomeSchedule {
                id: income_id,
                name: "Salary".into(),
                destination: BalanceRef::account(checking),
                amount: Money::from_cents(250000),
                is_active: true,
                is_completed: true,
                last_executed: Some(at),
                events: vec![income_event],
            },
        );

        let transfer_id = state.next_schedule_id();
        let txn_id = state.next_transaction_id();
        state.transfer_schedules.insert(
            transfer_id,
            TransferSchedule {
                id: transfer_id,
                name: "Card payoff".into(),
                source: BalanceRef::account(checking),
                destination: BalanceRef::pot(checking, pot_id),
                amount: Money::from_cents(4000),
                is_active: true,
                is_completed: false,
                last_executed: Some(at),
                linked_credit_account_id: Some(card),
                transaction_id: Some(txn_id),
            },
        );
        let mut record = TransactionRecord::new(
            txn_id,
            TransactionKind::CreditCardPayment,
            "Card payoff",
            Money::from_cents(4000),
        );
        record.source = Some(BalanceRef::account(checking));
        record.destination = Some(BalanceRef::pot(checking, pot_id));
        record.linked_credit_account_id = Some(card);
        record.transfer_schedule_id = Some(transfer_id);
        let payment_event = state.new_event(at, Money::from_cents(4000));
        record.events.push(payment_event);
        state.transactions.insert(txn_id, record);

        let yearly_id = state.next_transaction_id();
        let mut yearly = TransactionRecord::new(
            yearly_id,
            TransactionKind::Yearly,
            "Insurance",
            Money::from_cents(45050),
        );
        yearly.source = Some(BalanceRef::account(checking));
        yearly.date = Some("25-12-2025".into());
        yearly.is_completed = Some(false);
        state.transactions.insert(yearly_id, yearly);

        state.processed_logs.push(ProcessedTransactionLog::failed(
            at,
            ProcessedItemKind::TransferSchedule,
            transfer_id.get(),
            "Card payoff",
            Money::from_cents(4000),
            "insufficient balance",
        ));
        state.reduction_logs.push(BalanceReductionLog {
            reduced_at: at,
            target: BalanceRef::account(checking),
            name: "Checking".into(),
            amount: Money::from_cents(5000),
            balance_before: Money::from_cents(128456),
            balance_after: Money::from_cents(123456),
        });
        state.last_reduction_at = Some(at);

        state
    }

    #[test]
    fn test_empty_input_gives_empty_ledger() {
        for input in [&b""[..], &b"  \n"[..]] {
            let state = decode(input).unwrap();
            assert_eq!(state, LedgerState::new());
            assert_eq!(state.counters, IdCounters::default());
        }
    }

    #[test]
    fn test_empty_object_normalizes_collections() {
        let state = decode(b"{}").unwrap();
        assert!(state.accounts.is_empty());
        assert!(state.transactions.is_empty());
        assert_eq!(state.counters.peek(EntityKind::Schedule), 1);
    }

    #[test]
    fn test_round_trip_empty() {
        let state = LedgerState::new();
        assert_eq!(decode(&encode(&state).unwrap()).unwrap(), state);
    }

    #[test]
    fn test_round_trip_populated() {
        let state = populated_state();
        let bytes = encode(&state).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, state);
        // stable under a second pass
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_round_trip_largest_amounts() {
        let mut state = populated_state();
        let top = Money::from_cents(999_999_999_999_999);
        let checking = state.accounts.get_mut(&AccountId::new(1)).unwrap();
        checking.balance = top;
        checking.monthly_baseline = Some(Money::from_cents(123_456_789_012_345));
        checking.pots[0].balance = -top;

        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_amount_out_of_range_is_malformed() {
        let err = decode(
            br#"{"accounts": [{"id": 1, "name": "A", "balance": 123456789012345.67}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_document_layout() {
        let bytes = encode(&populated_state()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert!(json["accounts"][0]["pots"].is_array());
        assert!(json["incomeSchedules"].is_array());
        assert!(json["transferSchedules"].is_array());
        assert!(json["processedTransactionLogs"].is_array());
        assert!(json["balanceReductionLogs"].is_array());
        assert_eq!(json["nextAccountId"], serde_json::json!(3));
        assert_eq!(json["nextScheduleId"], serde_json::json!(4));
        assert_eq!(json["transactions"][1]["date"], serde_json::json!("25-12-2025"));
    }

    #[test]
    fn test_unparsable_input_is_malformed() {
        let err = decode(b"{ not json").unwrap_err();
        assert!(matches!(err, LedgerError::MalformedSnapshot(_)));

        let err = decode(br#"{"accounts": {"id": 1}}"#).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_duplicate_ids_are_malformed() {
        let err = decode(
            br#"{"accounts": [{"id": 1, "name": "A"}, {"id": 1, "name": "B"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::MalformedSnapshot(_)));

        let err = decode(
            br#"{"accounts": [
                {"id": 1, "name": "A", "pots": [{"id": 5, "name": "P"}]},
                {"id": 2, "name": "B", "pots": [{"id": 5, "name": "Q"}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate pot id pot-5"));
    }

    #[test]
    fn test_legacy_document_without_counters_is_repaired() {
        let state = decode(
            br#"{
                "accounts": [
                    {"id": 4, "name": "Checking", "balance": 100,
                     "pots": [{"id": 9, "name": "Bills", "balance": 12.5}]}
                ],
                "transactions": [
                    {"id": 7, "kind": "scheduled", "name": "Gym", "amount": 30,
                     "events": [{"id": 11, "executedAt": "2026-01-05T10:00:00Z", "amount": 30}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(state.counters.peek(EntityKind::Account), 5);
        assert_eq!(state.counters.peek(EntityKind::Pot), 10);
        assert_eq!(state.counters.peek(EntityKind::Transaction), 8);
        assert_eq!(state.counters.peek(EntityKind::Event), 12);
        assert_eq!(state.counters.peek(EntityKind::Schedule), 1);

        let account = &state.accounts[&AccountId::new(4)];
        assert_eq!(account.pots[0].balance, Money::from_cents(1250));
        assert!(state.transactions[&TransactionId::new(7)].linked_credit_account_id.is_none());
    }

    #[test]
    fn test_one_sided_links_are_cleared_on_load() {
        let state = decode(
            br#"{
                "accounts": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
                "transferSchedules": [
                    {"id": 3, "name": "T", "source": {"accountId": 1},
                     "destination": {"accountId": 2}, "amount": 10, "transactionId": 99}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(state.transfer_schedules[&ScheduleId::new(3)].transaction_id, None);
    }

    #[test]
    fn test_events_keep_order() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut state = LedgerState::new();
        let id = state.next_transaction_id();
        let mut record = TransactionRecord::new(id, TransactionKind::Scheduled, "Gym", Money::from_cents(3000));
        for day in [3, 1, 2] {
            record.events.push(TransactionEvent {
                id: state.next_event_id(),
                executed_at: at + chrono::Duration::days(day),
                amount: Money::from_cents(3000),
            });
        }
        state.transactions.insert(id, record.clone());

        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded.transactions[&id].events, record.events);
    }
}
