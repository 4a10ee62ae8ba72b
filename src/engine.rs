//! The ledger engine
//!
//! `LedgerEngine` is the only writer of the ledger document. Writes are
//! serialized by an async mutex; each one clones the committed state into a
//! draft, applies a service operation to the draft, persists the encoded
//! draft and only then publishes it. Readers take the published `Arc`
//! without waiting on queued writers.
//!
//! Every write runs on its own spawned task, so dropping the future returned
//! by an engine method does not cancel a write that already started.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, Instrument, Span};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountId, BalanceReductionLog, EventId, IncomeSchedule, Money, Pot, PotId,
    ScheduleId, ScheduledPayment, TransactionId, TransactionRecord, TransferSchedule,
};
use crate::services::{
    AccountRemoval, AccountService, AccountUpdate, EventDeletion, ExecutionService,
    ExecutionSummary, HistoryService, NewAccount, NewIncomeSchedule, NewPot,
    NewScheduledPayment, NewTransferSchedule, NewYearlyTransaction, PotRemoval, PotUpdate,
    PurgeSummary, ResetService, ResetSummary, ScheduleService, TransferExecution,
};
use crate::state::LedgerState;
use crate::storage::{decode, encode, JsonFileStore, MemoryStore, SnapshotStore};

/// Handle to the ledger; cheap to clone, all clones share one writer
#[derive(Clone)]
pub struct LedgerEngine {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn SnapshotStore>,
    writer: Mutex<()>,
    committed: RwLock<Arc<LedgerState>>,
}

fn join_failure(context: &str, err: tokio::task::JoinError) -> LedgerError {
    LedgerError::Persistence(format!("{} did not complete: {}", context, err))
}

impl Inner {
    fn current(&self) -> Arc<LedgerState> {
        Arc::clone(&self.committed.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, state: LedgerState) {
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
    }

    /// Run one write: draft, mutate, persist, publish
    async fn commit<T, F>(&self, operation: &'static str, apply: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LedgerState) -> LedgerResult<T>,
    {
        let _writer = self.writer.lock().await;

        let mut draft = LedgerState::clone(&self.current());
        let value = match apply(&mut draft) {
            Ok(value) => value,
            Err(e) => {
                debug!(operation, error = %e, "operation rejected");
                return Err(e);
            }
        };

        let bytes = encode(&draft)?;
        let store = Arc::clone(&self.store);
        let saved = tokio::task::spawn_blocking(move || store.save(&bytes))
            .await
            .map_err(|e| join_failure("snapshot write", e))
            .and_then(|result| result);
        if let Err(e) = saved {
            error!(operation, store = %self.store.describe(), error = %e, "snapshot write failed, mutation discarded");
            return Err(e);
        }

        self.publish(draft);
        debug!(operation, "committed");
        Ok(value)
    }
}

impl LedgerEngine {
    /// Load the ledger from `store`, starting empty if nothing was saved yet
    #[instrument(skip(store), fields(location = %store.describe()))]
    pub async fn open(store: Arc<dyn SnapshotStore>) -> LedgerResult<Self> {
        let loader = Arc::clone(&store);
        let bytes = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| join_failure("snapshot read", e))??;

        let state = match bytes {
            Some(bytes) => decode(&bytes)?,
            None => LedgerState::new(),
        };
        info!(
            accounts = state.accounts.len(),
            transactions = state.transactions.len(),
            "ledger opened"
        );

        Ok(Self::with_state(store, state))
    }

    /// Open (or start) the JSON document at `path`
    pub async fn open_file(path: PathBuf) -> LedgerResult<Self> {
        Self::open(Arc::new(JsonFileStore::new(path))).await
    }

    /// An empty ledger kept in memory
    pub fn in_memory() -> Self {
        Self::with_state(Arc::new(MemoryStore::new()), LedgerState::new())
    }

    fn with_state(store: Arc<dyn SnapshotStore>, state: LedgerState) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                writer: Mutex::new(()),
                committed: RwLock::new(Arc::new(state)),
            }),
        }
    }

    /// The last committed state
    ///
    /// Writes still queued or in flight are not visible.
    pub fn snapshot(&self) -> Arc<LedgerState> {
        self.inner.current()
    }

    async fn mutate<T, F>(&self, operation: &'static str, apply: F) -> LedgerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut LedgerState) -> LedgerResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(
            async move { inner.commit(operation, apply).await }.instrument(Span::current()),
        );
        task.await.map_err(|e| join_failure(operation, e))?
    }

    // ----- accounts and pots -----

    #[instrument(skip(self))]
    pub async fn create_account(&self, new: NewAccount) -> LedgerResult<Account> {
        self.mutate("create_account", move |state| {
            AccountService::new(state).create(new)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_account(&self, id: AccountId, update: AccountUpdate) -> LedgerResult<Account> {
        self.mutate("update_account", move |state| {
            AccountService::new(state).update(id, update)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: AccountId) -> LedgerResult<AccountRemoval> {
        self.mutate("delete_account", move |state| {
            AccountService::new(state).delete(id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn create_pot(&self, account_id: AccountId, new: NewPot) -> LedgerResult<Pot> {
        self.mutate("create_pot", move |state| {
            AccountService::new(state).create_pot(account_id, new)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_pot(
        &self,
        account_id: AccountId,
        pot_id: PotId,
        update: PotUpdate,
    ) -> LedgerResult<Pot> {
        self.mutate("update_pot", move |state| {
            AccountService::new(state).update_pot(account_id, pot_id, update)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_pot(&self, account_id: AccountId, pot_id: PotId) -> LedgerResult<PotRemoval> {
        self.mutate("delete_pot", move |state| {
            AccountService::new(state).delete_pot(account_id, pot_id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn add_scheduled_payment(
        &self,
        account_id: AccountId,
        new: NewScheduledPayment,
    ) -> LedgerResult<ScheduledPayment> {
        self.mutate("add_scheduled_payment", move |state| {
            AccountService::new(state).add_scheduled_payment(account_id, new)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn remove_scheduled_payment(
        &self,
        account_id: AccountId,
        payment_id: ScheduleId,
    ) -> LedgerResult<ScheduledPayment> {
        self.mutate("remove_scheduled_payment", move |state| {
            AccountService::new(state).remove_scheduled_payment(account_id, payment_id)
        })
        .await
    }

    // ----- schedule definitions -----

    #[instrument(skip(self))]
    pub async fn create_income_schedule(
        &self,
        new: NewIncomeSchedule,
    ) -> LedgerResult<IncomeSchedule> {
        self.mutate("create_income_schedule", move |state| {
            ScheduleService::new(state).create_income(new)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_income_active(&self, id: ScheduleId, active: bool) -> LedgerResult<IncomeSchedule> {
        self.mutate("set_income_active", move |state| {
            ScheduleService::new(state).set_income_active(id, active)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_income_schedule(&self, id: ScheduleId) -> LedgerResult<IncomeSchedule> {
        self.mutate("delete_income_schedule", move |state| {
            ScheduleService::new(state).delete_income(id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn create_transfer_schedule(
        &self,
        new: NewTransferSchedule,
    ) -> LedgerResult<TransferSchedule> {
        self.mutate("create_transfer_schedule", move |state| {
            ScheduleService::new(state).create_transfer(new)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_transfer_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> LedgerResult<TransferSchedule> {
        self.mutate("set_transfer_active", move |state| {
            ScheduleService::new(state).set_transfer_active(id, active)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_transfer_schedule(&self, id: ScheduleId) -> LedgerResult<TransferSchedule> {
        self.mutate("delete_transfer_schedule", move |state| {
            ScheduleService::new(state).delete_transfer(id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn create_yearly_transaction(
        &self,
        new: NewYearlyTransaction,
    ) -> LedgerResult<TransactionRecord> {
        self.mutate("create_yearly_transaction", move |state| {
            ScheduleService::new(state).create_yearly(new)
        })
        .await
    }

    // ----- execution -----

    #[instrument(skip(self))]
    pub async fn execute_income(
        &self,
        id: ScheduleId,
        at: DateTime<Utc>,
    ) -> LedgerResult<IncomeSchedule> {
        self.mutate("execute_income", move |state| {
            ExecutionService::new(state).execute_income(id, at)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn execute_transfer(
        &self,
        id: ScheduleId,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransferExecution> {
        self.mutate("execute_transfer", move |state| {
            ExecutionService::new(state).execute_transfer(id, at)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn execute_scheduled_payment(
        &self,
        account_id: AccountId,
        payment_id: ScheduleId,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        self.mutate("execute_scheduled_payment", move |state| {
            ExecutionService::new(state).execute_scheduled_payment(account_id, payment_id, at)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn execute_yearly(
        &self,
        id: TransactionId,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        self.mutate("execute_yearly", move |state| {
            ExecutionService::new(state).execute_yearly(id, at)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn record_card_charge(
        &self,
        card_id: AccountId,
        name: String,
        amount: Money,
        at: DateTime<Utc>,
    ) -> LedgerResult<TransactionRecord> {
        self.mutate("record_card_charge", move |state| {
            ExecutionService::new(state).record_card_charge(card_id, &name, amount, at)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn reset_for_next_year(&self, id: TransactionId) -> LedgerResult<TransactionRecord> {
        self.mutate("reset_for_next_year", move |state| {
            ExecutionService::new(state).reset_for_next_year(id)
        })
        .await
    }

    /// Execute everything due at `at`; per-item outcomes go to the processed log
    #[instrument(skip(self))]
    pub async fn execute_all(&self, at: DateTime<Utc>) -> LedgerResult<ExecutionSummary> {
        self.mutate("execute_all", move |state| {
            Ok(ExecutionService::new(state).execute_all(at))
        })
        .await
    }

    // ----- history -----

    #[instrument(skip(self))]
    pub async fn delete_event(
        &self,
        transaction_id: TransactionId,
        event_id: EventId,
    ) -> LedgerResult<EventDeletion> {
        self.mutate("delete_event", move |state| {
            HistoryService::new(state).delete_event(transaction_id, event_id)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, id: TransactionId) -> LedgerResult<TransactionRecord> {
        self.mutate("delete_transaction", move |state| {
            HistoryService::new(state).delete_transaction(id)
        })
        .await
    }

    // ----- resets and reductions -----

    #[instrument(skip(self))]
    pub async fn reset_balances(&self) -> LedgerResult<ResetSummary> {
        self.mutate("reset_balances", |state| {
            ResetService::new(state).reset_balances()
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn apply_monthly_reduction(
        &self,
        at: DateTime<Utc>,
    ) -> LedgerResult<Vec<BalanceReductionLog>> {
        self.mutate("apply_monthly_reduction", move |state| {
            ResetService::new(state).apply_monthly_reduction(at)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn purge_logs(&self, before: DateTime<Utc>) -> LedgerResult<PurgeSummary> {
        self.mutate("purge_logs", move |state| {
            Ok(ResetService::new(state).purge_logs(before))
        })
        .await
    }
}
