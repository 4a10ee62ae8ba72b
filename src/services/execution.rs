//! Execution service
//!
//! Decides whether a recurring item is due and applies its effects. Every
//! single-item operation checks all of its guards before touching a balance,
//! so a rejected item leaves the ledger exactly as it was; `execute_all`
//! relies on that to process items independently in one draft.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccountId, AccountKind, BalanceRef, IncomeSchedule, Money, ProcessedItemKind,
    ProcessedTransactionLog, ScheduleId, TransactionId, TransactionKind, TransactionRecord,
    TransferSchedule,
};
use crate::state::LedgerState;

use super::matching::{find_record, MatchKey};

/// Counts reported by a bulk run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub executed: usize,
    pub failed: usize,
}

impl ExecutionSummary {
    pub fn attempted(&self) -> usize {
        self.executed + self.failed
    }
}

/// Result of executing a transfer schedule
#[derive(Debug, Clone)]
pub struct TransferExecution {
    pub schedule: TransferSchedule,
    /// The `creditCardPayment` record, for card-linked schedules
    pub record: Option<TransactionRecord>,
}

/// One item picked up by a bulk run
#[derive(Debug, Clone)]
enum DueItem {
    Income(ScheduleId),
    Transfer(ScheduleId),
    Payment(AccountId, ScheduleId),
    Yearly(TransactionId),
}

fn same_month(at: DateTime<Utc>, today: NaiveDate) -> bool {
    let at = at.date_naive();
    at.year() == today.year() && at.month() == today.month()
}

pub struct ExecutionService<'a> {
    state: &'a mut LedgerState,
}

impl<'a> ExecutionService<'a> {
    pub fn new(state: &'a mut LedgerState) -> Self {
        Self { state }
    }

    /// Credit an income schedule's destination
    pub fn execute_income(
        &mut self,
        id: ScheduleId,
        at: DateTime<Utc>,
    ) -> LedgerResult<IncomeSchedule> {
        let schedule = self.state.income_schedule(id)?;
        if !schedule.is_active {
            return Err(LedgerError::invalid(format!(
                "Income schedule '{}' is inactive",
                schedule.name
            )));
        }
        if schedule.is_completed {
            return Err(LedgerError::invalid(format!(
                "Income schedule '{}' has already been received",
                schedule.name
            )));
        }
        let (destination, amount) = (schedule.destination, schedule.amount);
        self.state.ensure_ref(destination)?;

        self.state.apply_delta(destination, amount)?;
        let event = self.state.new_event(at, amount);
        let schedule = self.state.income_schedule_mut(id)?;
        schedule.events.push(event);
        schedule.is_completed = true;
        schedule.last_executed = Some(at);

        info!(schedule = %id, %destination, %amount, "income applied");
        Ok(schedule.clone())
    }

    /// Move money along a transfer schedule
    ///
    /// Plain schedules settle after one run. Card-linked schedules stay
    /// recurring and append an event to their payment record on every run.
    pub fn execute_transfer(
        &mut self,
        id: ScheduleId,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransferExecution> {
        let schedule = self.state.transfer_schedule(id)?.clone();
        if !schedule.is_active {
            return Err(LedgerError::invalid(format!(
                "Transfer schedule '{}' is inactive",
                schedule.name
            )));
        }
        if !schedule.is_card_linked() && schedule.is_completed {
            return Err(LedgerError::invalid(format!(
                "Transfer schedule '{}' has already been executed",
                schedule.name
            )));
        }
        self.state.ensure_ref(schedule.destination)?;
        if let Some(card_id) = schedule.linked_credit_account_id {
            self.state.account(card_id)?;
        }
        let available = self.state.balance_of(schedule.source)?;
        if available < schedule.amount {
            return Err(LedgerError::invalid(format!(
                "Insufficient balance in {}: {} available, {} needed",
                self.state.ref_name(schedule.source),
                available,
                schedule.amount
            )));
        }

        self.state.check_delta(schedule.source, -schedule.amount)?;
        self.state
            .check_delta(schedule.destination, schedule.amount)?;

        self.state.apply_delta(schedule.source, -schedule.amount)?;
        self.state
            .apply_delta(schedule.destination, schedule.amount)?;

        let record = if schedule.is_card_linked() {
            Some(self.append_payment_record(&schedule, at)?)
        } else {
            None
        };

        let updated = self.state.transfer_schedule_mut(id)?;
        updated.last_executed = Some(at);
        if !updated.is_card_linked() {
            updated.is_completed = true;
        }
        if let Some(record) = &record {
            updated.transaction_id = Some(record.id);
        }

        info!(
            schedule = %id,
            source = %schedule.source,
            destination = %schedule.destination,
            amount = %schedule.amount,
            "transfer applied"
        );
        Ok(TransferExecution {
            schedule: updated.clone(),
            record,
        })
    }

    /// Append an event to the schedule's payment record, creating it if needed
    fn append_payment_record(
        &mut self,
        schedule: &TransferSchedule,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        let linked = schedule
            .transaction_id
            .filter(|txn_id| self.state.transactions.contains_key(txn_id));
        let existing = linked.or_else(|| {
            let key = MatchKey::new(
                TransactionKind::CreditCardPayment,
                &schedule.name,
                schedule.linked_credit_account_id,
            );
            // records owned by another schedule are not candidates
            find_record(
                self.state.transactions.values().filter(|r| {
                    r.transfer_schedule_id.is_none() || r.transfer_schedule_id == Some(schedule.id)
                }),
                &key,
            )
        });

        let event = self.state.new_event(at, schedule.amount);
        let txn_id = match existing {
            Some(txn_id) => txn_id,
            None => {
                let txn_id = self.state.next_transaction_id();
                let mut record = TransactionRecord::new(
                    txn_id,
                    TransactionKind::CreditCardPayment,
                    schedule.name.clone(),
                    schedule.amount,
                );
                record.source = Some(schedule.source);
                record.destination = Some(schedule.destination);
                record.linked_credit_account_id = schedule.linked_credit_account_id;
                self.state.transactions.insert(txn_id, record);
                debug!(transaction = %txn_id, schedule = %schedule.id, "payment record created");
                txn_id
            }
        };

        let record = self.state.transaction_mut(txn_id)?;
        record.transfer_schedule_id = Some(schedule.id);
        record.append_event(event);
        Ok(record.clone())
    }

    /// Run a day-of-month payment owned by `account_id`
    pub fn execute_scheduled_payment(
        &mut self,
        account_id: AccountId,
        payment_id: ScheduleId,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        let today = at.date_naive();
        let payment = self
            .state
            .account(account_id)?
            .scheduled_payment(payment_id)
            .cloned()
            .ok_or_else(|| LedgerError::schedule_not_found(payment_id))?;

        if !payment.day_reached(today) {
            return Err(LedgerError::invalid(format!(
                "'{}' is not due until day {} of the month",
                payment.name, payment.day_of_month
            )));
        }
        if payment.processed_in_period(today) {
            return Err(LedgerError::invalid(format!(
                "'{}' has already been paid this month",
                payment.name
            )));
        }

        let (charged, kind) = match payment.linked_credit_account_id {
            Some(card_id) => {
                let card = self.state.account(card_id)?;
                if !card.within_credit_limit(payment.amount) {
                    return Err(LedgerError::invalid(format!(
                        "'{}' would exceed the credit limit of '{}'",
                        payment.name, card.name
                    )));
                }
                (BalanceRef::account(card_id), TransactionKind::CreditCardCharge)
            }
            None => {
                let source = BalanceRef {
                    account_id,
                    pot_id: payment.pot_id,
                };
                self.state.ensure_ref(source)?;
                (source, TransactionKind::Scheduled)
            }
        };

        self.state.apply_delta(charged, -payment.amount)?;
        let record = match kind {
            TransactionKind::CreditCardCharge => self.merge_charge(
                &payment.name,
                payment.amount,
                charged,
                at,
            )?,
            _ => {
                let txn_id = self.state.next_transaction_id();
                let mut record =
                    TransactionRecord::new(txn_id, kind, payment.name.clone(), payment.amount);
                record.source = Some(charged);
                let event = self.state.new_event(at, payment.amount);
                record.append_event(event);
                self.state.transactions.insert(txn_id, record.clone());
                record
            }
        };

        if let Some(stored) = self
            .state
            .account_mut(account_id)?
            .scheduled_payment_mut(payment_id)
        {
            stored.is_completed = true;
            stored.last_executed = Some(at);
        }

        info!(
            account = %account_id,
            payment = %payment_id,
            charged = %charged,
            amount = %payment.amount,
            "scheduled payment applied"
        );
        Ok(record)
    }

    /// Charge a one-off purchase to a credit account
    pub fn record_card_charge(
        &mut self,
        card_id: AccountId,
        name: &str,
        amount: Money,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::invalid("Charge name cannot be empty"));
        }
        if !amount.is_positive() {
            return Err(LedgerError::invalid(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }
        let card = self.state.account(card_id)?;
        if card.kind != AccountKind::Credit {
            return Err(LedgerError::invalid(format!(
                "'{}' is not a credit account",
                card.name
            )));
        }
        if !card.within_credit_limit(amount) {
            return Err(LedgerError::invalid(format!(
                "Charge would exceed the credit limit of '{}'",
                card.name
            )));
        }

        let charged = BalanceRef::account(card_id);
        self.state.apply_delta(charged, -amount)?;
        let record = self.merge_charge(name, amount, charged, at)?;

        info!(card = %card_id, transaction = %record.id, %amount, "card charge recorded");
        Ok(record)
    }

    /// Append a charge event to the matching record, or start a new one
    fn merge_charge(
        &mut self,
        name: &str,
        amount: Money,
        card: BalanceRef,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        let key = MatchKey::new(
            TransactionKind::CreditCardCharge,
            name,
            Some(card.account_id),
        );
        let txn_id = match find_record(self.state.transactions.values(), &key) {
            Some(txn_id) => txn_id,
            None => {
                let txn_id = self.state.next_transaction_id();
                let mut record = TransactionRecord::new(
                    txn_id,
                    TransactionKind::CreditCardCharge,
                    name,
                    amount,
                );
                record.source = Some(card);
                record.linked_credit_account_id = Some(card.account_id);
                self.state.transactions.insert(txn_id, record);
                txn_id
            }
        };

        let event = self.state.new_event(at, amount);
        let record = self.state.transaction_mut(txn_id)?;
        record.append_event(event);
        Ok(record.clone())
    }

    /// Apply a yearly transaction on its day
    pub fn execute_yearly(
        &mut self,
        id: TransactionId,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        let today = at.date_naive();
        let record = self.state.transaction(id)?;
        if record.kind != TransactionKind::Yearly {
            return Err(LedgerError::invalid(format!(
                "'{}' is not a yearly transaction",
                record.name
            )));
        }
        let date = match record.yearly_date() {
            Some(Ok(date)) => date,
            Some(Err(e)) => {
                return Err(LedgerError::invalid(format!(
                    "'{}' has an invalid date: {}",
                    record.name, e
                )))
            }
            None => {
                return Err(LedgerError::invalid(format!(
                    "'{}' has no date",
                    record.name
                )))
            }
        };
        if !date.recurs_on(today) {
            return Err(LedgerError::invalid(format!(
                "'{}' is due on {:02}-{:02}, not today",
                record.name, date.day, date.month
            )));
        }
        if record.is_yearly_completed() {
            return Err(LedgerError::invalid(format!(
                "'{}' has already been applied this year",
                record.name
            )));
        }
        let source = record
            .source
            .ok_or_else(|| LedgerError::invalid(format!("'{}' has no source", record.name)))?;
        let destination = record.destination;
        let amount = record.amount;
        self.state.check_delta(source, -amount)?;
        if let Some(destination) = destination {
            self.state.check_delta(destination, amount)?;
        }

        self.state.apply_delta(source, -amount)?;
        if let Some(destination) = destination {
            self.state.apply_delta(destination, amount)?;
        }
        let event = self.state.new_event(at, amount);
        let record = self.state.transaction_mut(id)?;
        record.append_event(event);
        record.is_completed = Some(true);

        info!(transaction = %id, %source, %amount, "yearly transaction applied");
        Ok(record.clone())
    }

    /// Make a yearly transaction pending again
    pub fn reset_for_next_year(&mut self, id: TransactionId) -> LedgerResult<TransactionRecord> {
        let record = self.state.transaction_mut(id)?;
        if record.kind != TransactionKind::Yearly {
            return Err(LedgerError::invalid(format!(
                "'{}' is not a yearly transaction",
                record.name
            )));
        }
        record.is_completed = Some(false);
        debug!(transaction = %id, "yearly transaction reset");
        Ok(record.clone())
    }

    /// Everything due at `at`, income first so transfers can draw on it
    ///
    /// Card-linked transfers are picked up at most once per calendar month.
    fn due_items(&self, at: DateTime<Utc>) -> Vec<DueItem> {
        let today = at.date_naive();
        let mut items = Vec::new();

        for schedule in self.state.income_schedules.values() {
            if schedule.is_active && !schedule.is_completed {
                items.push(DueItem::Income(schedule.id));
            }
        }

        for schedule in self.state.transfer_schedules.values() {
            let due = if schedule.is_card_linked() {
                !schedule.last_executed.is_some_and(|last| same_month(last, today))
            } else {
                !schedule.is_completed
            };
            if schedule.is_active && due {
                items.push(DueItem::Transfer(schedule.id));
            }
        }

        for account in self.state.accounts.values() {
            for payment in &account.scheduled_payments {
                if payment.is_due(today) {
                    items.push(DueItem::Payment(account.id, payment.id));
                }
            }
        }

        for record in self.state.transactions.values() {
            if record.kind != TransactionKind::Yearly || record.is_yearly_completed() {
                continue;
            }
            match record.yearly_date() {
                Some(Ok(date)) if date.recurs_on(today) => items.push(DueItem::Yearly(record.id)),
                Some(Err(e)) => {
                    debug!(transaction = %record.id, error = %e, "yearly date does not recur")
                }
                _ => {}
            }
        }

        items
    }

    /// Kind, id, name and amount of a due item, for the processed log
    fn describe(&self, item: &DueItem) -> (ProcessedItemKind, u64, String, Money) {
        let (kind, item_id) = match *item {
            DueItem::Income(id) => (ProcessedItemKind::IncomeSchedule, id.get()),
            DueItem::Transfer(id) => (ProcessedItemKind::TransferSchedule, id.get()),
            DueItem::Payment(_, id) => (ProcessedItemKind::ScheduledPayment, id.get()),
            DueItem::Yearly(id) => (ProcessedItemKind::YearlyTransaction, id.get()),
        };
        let (name, amount) = self.name_and_amount(item).unwrap_or_default();
        (kind, item_id, name, amount)
    }

    /// Name and amount of a due item, if it still exists
    fn name_and_amount(&self, item: &DueItem) -> Option<(String, Money)> {
        match *item {
            DueItem::Income(id) => self
                .state
                .income_schedules
                .get(&id)
                .map(|s| (s.name.clone(), s.amount)),
            DueItem::Transfer(id) => self
                .state
                .transfer_schedules
                .get(&id)
                .map(|s| (s.name.clone(), s.amount)),
            DueItem::Payment(account_id, id) => self
                .state
                .accounts
                .get(&account_id)
                .and_then(|a| a.scheduled_payment(id))
                .map(|p| (p.name.clone(), p.amount)),
            DueItem::Yearly(id) => self
                .state
                .transactions
                .get(&id)
                .map(|r| (r.name.clone(), r.amount)),
        }
    }

    /// Execute everything due at `at`
    ///
    /// Items succeed or fail independently; every attempt lands in the
    /// processed log.
    pub fn execute_all(&mut self, at: DateTime<Utc>) -> ExecutionSummary {
        let mut summary = ExecutionSummary::default();

        for item in self.due_items(at) {
            let (kind, item_id, name, amount) = self.describe(&item);
            let result = match item {
                DueItem::Income(id) => self.execute_income(id, at).map(|_| ()),
                DueItem::Transfer(id) => self.execute_transfer(id, at).map(|_| ()),
                DueItem::Payment(account_id, id) => {
                    self.execute_scheduled_payment(account_id, id, at).map(|_| ())
                }
                DueItem::Yearly(id) => self.execute_yearly(id, at).map(|_| ()),
            };

            let log = match result {
                Ok(()) => {
                    summary.executed += 1;
                    ProcessedTransactionLog::applied(at, kind, item_id, name, amount)
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(item = %kind, id = item_id, error = %e, "due item failed");
                    ProcessedTransactionLog::failed(at, kind, item_id, name, amount, e.to_string())
                }
            };
            self.state.processed_logs.push(log);
        }

        info!(
            executed = summary.executed,
            failed = summary.failed,
            "bulk execution finished"
        );
        summary
    }
}
