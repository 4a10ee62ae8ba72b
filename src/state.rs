//! In-memory ledger state
//!
//! `LedgerState` is the whole object graph behind one persisted document.
//! The engine clones it, mutates the clone, and only publishes the clone once
//! it has been written; nothing here performs I/O.

use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, Balance, BalanceRef, BalanceReductionLog, EntityKind, EventId, IdCounters,
    IncomeSchedule, Money, PotId, ProcessedTransactionLog, ScheduleId, TransactionEvent,
    TransactionId, TransactionRecord, TransferSchedule,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerState {
    pub accounts: BTreeMap<AccountId, Account>,
    pub income_schedules: BTreeMap<ScheduleId, IncomeSchedule>,
    pub transfer_schedules: BTreeMap<ScheduleId, TransferSchedule>,
    pub transactions: BTreeMap<TransactionId, TransactionRecord>,
    pub processed_logs: Vec<ProcessedTransactionLog>,
    pub reduction_logs: Vec<BalanceReductionLog>,
    /// When the monthly reduction last ran
    pub last_reduction_at: Option<DateTime<Utc>>,
    pub counters: IdCounters,
}

impl LedgerState {
    /// An empty ledger with every counter at 1
    pub fn new() -> Self {
        Self::default()
    }

    // ----- identity -----

    pub fn next_account_id(&mut self) -> AccountId {
        AccountId::new(self.counters.next(EntityKind::Account))
    }

    pub fn next_pot_id(&mut self) -> PotId {
        PotId::new(self.counters.next(EntityKind::Pot))
    }

    pub fn next_transaction_id(&mut self) -> TransactionId {
        TransactionId::new(self.counters.next(EntityKind::Transaction))
    }

    pub fn next_event_id(&mut self) -> EventId {
        EventId::new(self.counters.next(EntityKind::Event))
    }

    pub fn next_schedule_id(&mut self) -> ScheduleId {
        ScheduleId::new(self.counters.next(EntityKind::Schedule))
    }

    /// Build an event with a freshly allocated id
    pub fn new_event(&mut self, executed_at: DateTime<Utc>, amount: Money) -> TransactionEvent {
        TransactionEvent {
            id: self.next_event_id(),
            executed_at,
            amount,
        }
    }

    /// Largest id in use for each entity kind
    pub fn max_id(&self, kind: EntityKind) -> Option<u64> {
        match kind {
            EntityKind::Account => self.accounts.keys().map(|id| id.get()).max(),
            EntityKind::Pot => self
                .accounts
                .values()
                .flat_map(|a| a.pots.iter().map(|p| p.id.get()))
                .max(),
            EntityKind::Transaction => self.transactions.keys().map(|id| id.get()).max(),
            EntityKind::Event => self
                .transactions
                .values()
                .flat_map(|t| t.events.iter().map(|e| e.id.get()))
                .chain(
                    self.income_schedules
                        .values()
                        .flat_map(|s| s.events.iter().map(|e| e.id.get())),
                )
                .max(),
            EntityKind::Schedule => self
                .income_schedules
                .keys()
                .chain(self.transfer_schedules.keys())
                .map(|id| id.get())
                .chain(
                    self.accounts
                        .values()
                        .flat_map(|a| a.scheduled_payments.iter().map(|p| p.id.get())),
                )
                .max(),
        }
    }

    /// Raise every stale counter past the ids already present
    pub fn repair_counters(&mut self) -> Vec<EntityKind> {
        let mut repaired = Vec::new();
        for kind in EntityKind::ALL {
            let max = self.max_id(kind);
            if self.counters.repair(kind, max) {
                repaired.push(kind);
            }
        }
        repaired
    }

    /// Whether the monthly reduction already ran in the calendar month of `at`
    pub fn reduced_in_month(&self, at: DateTime<Utc>) -> bool {
        self.last_reduction_at
            .is_some_and(|last| last.year() == at.year() && last.month() == at.month())
    }

    // ----- lookups -----

    pub fn account(&self, id: AccountId) -> LedgerResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    pub fn account_mut(&mut self, id: AccountId) -> LedgerResult<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Find the account that owns a pot
    pub fn pot_owner(&self, pot_id: PotId) -> Option<AccountId> {
        self.accounts
            .values()
            .find(|a| a.pot(pot_id).is_some())
            .map(|a| a.id)
    }

    pub fn income_schedule(&self, id: ScheduleId) -> LedgerResult<&IncomeSchedule> {
        self.income_schedules
            .get(&id)
            .ok_or_else(|| LedgerError::schedule_not_found(id))
    }

    pub fn income_schedule_mut(&mut self, id: ScheduleId) -> LedgerResult<&mut IncomeSchedule> {
        self.income_schedules
            .get_mut(&id)
            .ok_or_else(|| LedgerError::schedule_not_found(id))
    }

    pub fn transfer_schedule(&self, id: ScheduleId) -> LedgerResult<&TransferSchedule> {
        self.transfer_schedules
            .get(&id)
            .ok_or_else(|| LedgerError::schedule_not_found(id))
    }

    pub fn transfer_schedule_mut(&mut self, id: ScheduleId) -> LedgerResult<&mut TransferSchedule> {
        self.transfer_schedules
            .get_mut(&id)
            .ok_or_else(|| LedgerError::schedule_not_found(id))
    }

    pub fn transaction(&self, id: TransactionId) -> LedgerResult<&TransactionRecord> {
        self.transactions
            .get(&id)
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    pub fn transaction_mut(&mut self, id: TransactionId) -> LedgerResult<&mut TransactionRecord> {
        self.transactions
            .get_mut(&id)
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    /// Current balance behind a reference
    pub fn balance_of(&self, target: BalanceRef) -> LedgerResult<Money> {
        let account = self.account(target.account_id)?;
        match target.pot_id {
            Some(pot_id) => account
                .pot(pot_id)
                .map(|p| p.balance)
                .ok_or_else(|| LedgerError::pot_not_found(pot_id)),
            None => Ok(account.balance),
        }
    }

    /// Check that a reference points at an existing account or pot
    pub fn ensure_ref(&self, target: BalanceRef) -> LedgerResult<()> {
        self.balance_of(target).map(|_| ())
    }

    /// Display name of the account or pot behind a reference
    pub fn ref_name(&self, target: BalanceRef) -> String {
        let Ok(account) = self.account(target.account_id) else {
            return target.to_string();
        };
        match target.pot_id.and_then(|pot_id| account.pot(pot_id)) {
            Some(pot) => format!("{} / {}", account.name, pot.name),
            None => account.name.clone(),
        }
    }

    // ----- mutation primitive -----

    /// Balance a reference would have after a delta, without applying it
    ///
    /// Fails with `InvalidOperation` when the result leaves the supported
    /// amount range. Callers moving money between two balances check both
    /// legs here before touching either.
    pub fn check_delta(&self, target: BalanceRef, delta: Money) -> LedgerResult<Money> {
        self.balance_of(target)?
            .checked_add(delta)
            .ok_or_else(|| self.out_of_range(target, delta))
    }

    /// Apply a signed delta to the account or pot behind a reference
    ///
    /// Returns the new balance. Nothing changes on error.
    pub fn apply_delta(&mut self, target: BalanceRef, delta: Money) -> LedgerResult<Money> {
        let account = self.account_mut(target.account_id)?;
        let next = match target.pot_id {
            Some(pot_id) => account
                .pot_mut(pot_id)
                .ok_or_else(|| LedgerError::pot_not_found(pot_id))?
                .apply_delta(delta),
            None => account.apply_delta(delta),
        };
        next.ok_or_else(|| self.out_of_range(target, delta))
    }

    fn out_of_range(&self, target: BalanceRef, delta: Money) -> LedgerError {
        LedgerError::invalid(format!(
            "Moving {} would take the balance of {} beyond the largest supported amount",
            delta,
            self.ref_name(target)
        ))
    }

    // ----- links -----

    /// Clear the schedule side of a record link, if the schedule still exists
    pub fn unlink_schedule(&mut self, schedule_id: ScheduleId, transaction_id: TransactionId) {
        if let Some(schedule) = self.transfer_schedules.get_mut(&schedule_id) {
            if schedule.transaction_id == Some(transaction_id) {
                schedule.transaction_id = None;
            }
        }
    }

    /// Clear the record side of a schedule link, if the record still exists
    pub fn unlink_record(&mut self, transaction_id: TransactionId, schedule_id: ScheduleId) {
        if let Some(record) = self.transactions.get_mut(&transaction_id) {
            if record.transfer_schedule_id == Some(schedule_id) {
                record.transfer_schedule_id = None;
            }
        }
    }

    /// Clear links where the two sides disagree
    ///
    /// Returns how many one-sided links were dropped.
    pub fn normalize_links(&mut self) -> usize {
        let mut dangling_schedules = Vec::new();
        for schedule in self.transfer_schedules.values() {
            if let Some(txn_id) = schedule.transaction_id {
                let agrees = self
                    .transactions
                    .get(&txn_id)
                    .is_some_and(|t| t.transfer_schedule_id == Some(schedule.id));
                if !agrees {
                    dangling_schedules.push(schedule.id);
                }
            }
        }

        let mut dangling_records = Vec::new();
        for record in self.transactions.values() {
            if let Some(schedule_id) = record.transfer_schedule_id {
                let agrees = self
                    .transfer_schedules
                    .get(&schedule_id)
                    .is_some_and(|s| s.transaction_id == Some(record.id));
                if !agrees {
                    dangling_records.push(record.id);
                }
            }
        }

        for id in &dangling_schedules {
            if let Some(schedule) = self.transfer_schedules.get_mut(id) {
                schedule.transaction_id = None;
            }
        }
        for id in &dangling_records {
            if let Some(record) = self.transactions.get_mut(id) {
                record.transfer_schedule_id = None;
            }
        }

        dangling_schedules.len() + dangling_records.len()
    }

    // ----- cascades -----

    /// Drop every schedule that references `account_id`
    ///
    /// Returns the ids of the dropped income and transfer schedules and
    /// scheduled payments.
    pub fn drop_schedules_for_account(&mut self, account_id: AccountId) -> Vec<ScheduleId> {
        let mut dropped = Vec::new();

        self.income_schedules.retain(|id, s| {
            let keep = !s.references_account(account_id);
            if !keep {
                dropped.push(*id);
            }
            keep
        });

        let transfers: Vec<ScheduleId> = self
            .transfer_schedules
            .values()
            .filter(|s| s.references_account(account_id))
            .map(|s| s.id)
            .collect();
        for id in transfers {
            self.remove_transfer_schedule(id);
            dropped.push(id);
        }

        for account in self.accounts.values_mut() {
            account.scheduled_payments.retain(|p| {
                let keep = p.linked_credit_account_id != Some(account_id);
                if !keep {
                    dropped.push(p.id);
                }
                keep
            });
        }

        dropped
    }

    /// Drop every schedule that references `pot_id`
    pub fn drop_schedules_for_pot(&mut self, pot_id: PotId) -> Vec<ScheduleId> {
        let mut dropped = Vec::new();

        self.income_schedules.retain(|id, s| {
            let keep = !s.references_pot(pot_id);
            if !keep {
                dropped.push(*id);
            }
            keep
        });

        let transfers: Vec<ScheduleId> = self
            .transfer_schedules
            .values()
            .filter(|s| s.references_pot(pot_id))
            .map(|s| s.id)
            .collect();
        for id in transfers {
            self.remove_transfer_schedule(id);
            dropped.push(id);
        }

        for account in self.accounts.values_mut() {
            account.scheduled_payments.retain(|p| {
                let keep = p.pot_id != Some(pot_id);
                if !keep {
                    dropped.push(p.id);
                }
                keep
            });
        }

        dropped
    }

    /// Remove a transfer schedule, unlinking its record
    pub fn remove_transfer_schedule(&mut self, id: ScheduleId) -> Option<TransferSchedule> {
        let schedule = self.transfer_schedules.remove(&id)?;
        if let Some(txn_id) = schedule.transaction_id {
            self.unlink_record(txn_id, id);
        }
        Some(schedule)
    }

    /// Remove a transaction record, unlinking its schedule
    pub fn remove_transaction(&mut self, id: TransactionId) -> Option<TransactionRecord> {
        let record = self.transactions.remove(&id)?;
        if let Some(schedule_id) = record.transfer_schedule_id {
            self.unlink_schedule(schedule_id, id);
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, Pot, TransactionKind};

    fn state_with_accounts() -> LedgerState {
        let mut state = LedgerState::new();
        for name in ["Checking", "Savings"] {
            let id = state.next_account_id();
            state
                .accounts
                .insert(id, Account::new(id, name, AccountKind::Checking));
        }
        let pot_id = state.next_pot_id();
        if let Some(account) = state.accounts.get_mut(&AccountId::new(2)) {
            account.pots.push(Pot::new(pot_id, "Holiday"));
        }
        state
    }

    fn transfer(state: &mut LedgerState, source: BalanceRef, destination: BalanceRef) -> ScheduleId {
        let id = state.next_schedule_id();
        state.transfer_schedules.insert(
            id,
            TransferSchedule {
                id,
                name: "Move".into(),
                source,
                destination,
                amount: Money::from_cents(1000),
                is_active: true,
                is_completed: false,
                last_executed: None,
                linked_credit_account_id: None,
                transaction_id: None,
            },
        );
        id
    }

    #[test]
    fn test_apply_delta_on_account_and_pot() {
        let mut state = state_with_accounts();
        let pot = BalanceRef::pot(AccountId::new(2), PotId::new(1));

        state
            .apply_delta(BalanceRef::account(AccountId::new(1)), Money::from_cents(500))
            .unwrap();
        state.apply_delta(pot, Money::from_cents(250)).unwrap();

        assert_eq!(state.balance_of(BalanceRef::account(AccountId::new(1))).unwrap(), Money::from_cents(500));
        assert_eq!(state.balance_of(pot).unwrap(), Money::from_cents(250));
    }

    #[test]
    fn test_apply_delta_unknown_targets() {
        let mut state = state_with_accounts();
        let err = state
            .apply_delta(BalanceRef::account(AccountId::new(9)), Money::from_cents(1))
            .unwrap_err();
        assert!(err.is_not_found());

        let err = state
            .apply_delta(BalanceRef::pot(AccountId::new(1), PotId::new(1)), Money::from_cents(1))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_apply_delta_beyond_supported_range() {
        let mut state = state_with_accounts();
        let target = BalanceRef::account(AccountId::new(1));
        let top = Money::parse("9999999999999.99").unwrap();

        assert_eq!(state.check_delta(target, top).unwrap(), top);
        state.apply_delta(target, top).unwrap();

        let err = state.check_delta(target, Money::from_cents(1)).unwrap_err();
        assert!(err.is_invalid_operation());
        let err = state.apply_delta(target, Money::from_cents(1)).unwrap_err();
        assert!(err.is_invalid_operation());
        assert!(!err.is_retryable());
        assert_eq!(state.balance_of(target).unwrap(), top);

        state.apply_delta(target, -top).unwrap();
        state.apply_delta(target, -top).unwrap();
        assert!(state.apply_delta(target, -top).unwrap_err().is_invalid_operation());
        assert_eq!(state.balance_of(target).unwrap(), -top);
    }

    #[test]
    fn test_reduced_in_month() {
        use chrono::TimeZone;

        let mut state = LedgerState::new();
        let march = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        assert!(!state.reduced_in_month(march));

        state.last_reduction_at = Some(march);
        assert!(state.reduced_in_month(Utc.with_ymd_and_hms(2026, 3, 31, 23, 0, 0).unwrap()));
        assert!(!state.reduced_in_month(Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()));
        assert!(!state.reduced_in_month(Utc.with_ymd_and_hms(2027, 3, 2, 8, 0, 0).unwrap()));
    }

    #[test]
    fn test_repair_counters() {
        let mut state = state_with_accounts();
        state.counters = IdCounters::default();

        let repaired = state.repair_counters();
        assert!(repaired.contains(&EntityKind::Account));
        assert!(repaired.contains(&EntityKind::Pot));
        assert_eq!(state.next_account_id(), AccountId::new(3));
        assert_eq!(state.next_pot_id(), PotId::new(2));
    }

    #[test]
    fn test_drop_schedules_for_account_unlinks_records() {
        let mut state = state_with_accounts();
        let schedule_id = transfer(
            &mut state,
            BalanceRef::account(AccountId::new(1)),
            BalanceRef::account(AccountId::new(2)),
        );
        let txn_id = state.next_transaction_id();
        let mut record = TransactionRecord::new(
            txn_id,
            TransactionKind::CreditCardPayment,
            "Move",
            Money::from_cents(1000),
        );
        record.transfer_schedule_id = Some(schedule_id);
        state.transactions.insert(txn_id, record);
        if let Some(s) = state.transfer_schedules.get_mut(&schedule_id) {
            s.transaction_id = Some(txn_id);
        }

        let dropped = state.drop_schedules_for_account(AccountId::new(2));
        assert_eq!(dropped, vec![schedule_id]);
        assert!(state.transfer_schedules.is_empty());
        assert_eq!(state.transactions[&txn_id].transfer_schedule_id, None);
    }

    #[test]
    fn test_drop_schedules_for_pot() {
        let mut state = state_with_accounts();
        let pot = BalanceRef::pot(AccountId::new(2), PotId::new(1));
        transfer(&mut state, BalanceRef::account(AccountId::new(1)), pot);
        let keep = transfer(
            &mut state,
            BalanceRef::account(AccountId::new(1)),
            BalanceRef::account(AccountId::new(2)),
        );

        state.drop_schedules_for_pot(PotId::new(1));
        assert_eq!(state.transfer_schedules.keys().copied().collect::<Vec<_>>(), vec![keep]);
    }

    #[test]
    fn test_normalize_links_clears_one_sided_links() {
        let mut state = state_with_accounts();
        let schedule_id = transfer(
            &mut state,
            BalanceRef::account(AccountId::new(1)),
            BalanceRef::account(AccountId::new(2)),
        );
        if let Some(s) = state.transfer_schedules.get_mut(&schedule_id) {
            s.transaction_id = Some(TransactionId::new(77));
        }

        assert_eq!(state.normalize_links(), 1);
        assert_eq!(state.transfer_schedules[&schedule_id].transaction_id, None);
        assert_eq!(state.normalize_links(), 0);
    }

    #[test]
    fn test_ref_name() {
        let state = state_with_accounts();
        assert_eq!(state.ref_name(BalanceRef::pot(AccountId::new(2), PotId::new(1))), "Savings / Holiday");
        assert_eq!(state.ref_name(BalanceRef::account(AccountId::new(1))), "Checking");
        assert_eq!(state.ref_name(BalanceRef::account(AccountId::new(5))), "acc-5");
    }
}
