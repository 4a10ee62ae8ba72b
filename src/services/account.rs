//! Account service
//!
//! Business logic for accounts, their pots and their scheduled payments.
//! Deleting an account or pot cascades to every schedule that references it.

use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::models::account::validate_name;
use crate::models::{
    Account, AccountId, AccountKind, BalanceRef, Money, Pot, PotId, ScheduleId, ScheduledPayment,
};
use crate::state::LedgerState;

/// Service for account, pot and scheduled-payment management
pub struct AccountService<'a> {
    state: &'a mut LedgerState,
}

/// Fields for a new account
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub opening_balance: Money,
    pub exclude_from_reset: bool,
    pub credit_limit: Option<Money>,
    pub monthly_baseline: Option<Money>,
}

/// Changes to an existing account; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub exclude_from_reset: Option<bool>,
    pub credit_limit: Option<Option<Money>>,
    pub monthly_baseline: Option<Option<Money>>,
}

/// Fields for a new pot
#[derive(Debug, Clone, Default)]
pub struct NewPot {
    pub name: String,
    pub opening_balance: Money,
    pub exclude_from_reset: bool,
    pub monthly_baseline: Option<Money>,
}

#[derive(Debug, Clone, Default)]
pub struct PotUpdate {
    pub name: Option<String>,
    pub exclude_from_reset: Option<bool>,
    pub monthly_baseline: Option<Option<Money>>,
}

/// Fields for a new scheduled payment
#[derive(Debug, Clone)]
pub struct NewScheduledPayment {
    pub name: String,
    pub amount: Money,
    pub day_of_month: u32,
    pub pot_id: Option<PotId>,
    pub linked_credit_account_id: Option<AccountId>,
}

/// What an account deletion took with it
#[derive(Debug, Clone)]
pub struct AccountRemoval {
    pub account: Account,
    pub dropped_schedules: Vec<ScheduleId>,
}

#[derive(Debug, Clone)]
pub struct PotRemoval {
    pub account_id: AccountId,
    pub pot: Pot,
    pub dropped_schedules: Vec<ScheduleId>,
}

/// Find an account by id (`acc-3` or `3`) or by name (case-insensitive)
pub fn find_account<'s>(state: &'s LedgerState, identifier: &str) -> Option<&'s Account> {
    if let Ok(id) = identifier.parse::<AccountId>() {
        if let Some(account) = state.accounts.get(&id) {
            return Some(account);
        }
    }

    let wanted = identifier.trim().to_lowercase();
    state
        .accounts
        .values()
        .find(|a| a.name.to_lowercase() == wanted)
}

/// Find a pot of `account` by id or name
pub fn find_pot<'a>(account: &'a Account, identifier: &str) -> Option<&'a Pot> {
    if let Ok(id) = identifier.parse::<PotId>() {
        if let Some(pot) = account.pot(id) {
            return Some(pot);
        }
    }

    let wanted = identifier.trim().to_lowercase();
    account.pots.iter().find(|p| p.name.to_lowercase() == wanted)
}

fn check_name(name: &str) -> LedgerResult<String> {
    validate_name(name).map_err(|e| LedgerError::invalid(e.to_string()))?;
    Ok(name.trim().to_string())
}

fn check_non_negative(label: &str, amount: Option<Money>) -> LedgerResult<()> {
    match amount {
        Some(value) if value.is_negative() => Err(LedgerError::invalid(format!(
            "{} cannot be negative",
            label
        ))),
        _ => Ok(()),
    }
}

impl<'a> AccountService<'a> {
    pub fn new(state: &'a mut LedgerState) -> Self {
        Self { state }
    }

    fn name_taken(&self, name: &str, except: Option<AccountId>) -> bool {
        let wanted = name.to_lowercase();
        self.state
            .accounts
            .values()
            .any(|a| Some(a.id) != except && a.name.to_lowercase() == wanted)
    }

    /// Create a new account
    pub fn create(&mut self, new: NewAccount) -> LedgerResult<Account> {
        let name = check_name(&new.name)?;

        if self.name_taken(&name, None) {
            return Err(LedgerError::invalid(format!(
                "An account named '{}' already exists",
                name
            )));
        }

        let id = self.state.next_account_id();
        let mut account = Account::new(id, name, new.kind);
        account.exclude_from_reset = new.exclude_from_reset;
        account.credit_limit = new.credit_limit;
        account.monthly_baseline = new.monthly_baseline;
        account
            .validate()
            .map_err(|e| LedgerError::invalid(e.to_string()))?;

        self.state.accounts.insert(id, account);
        if !new.opening_balance.is_zero() {
            self.state
                .apply_delta(BalanceRef::account(id), new.opening_balance)?;
        }

        let account = self.state.account(id)?.clone();
        info!(account = %account.id, name = %account.name, "account created");
        Ok(account)
    }

    /// Edit an account; the balance is never touched here
    pub fn update(&mut self, id: AccountId, update: AccountUpdate) -> LedgerResult<Account> {
        let name = update.name.as_deref().map(check_name).transpose()?;
        if let Some(name) = &name {
            if self.name_taken(name, Some(id)) {
                return Err(LedgerError::invalid(format!(
                    "An account named '{}' already exists",
                    name
                )));
            }
        }

        let mut account = self.state.account(id)?.clone();
        if let Some(name) = name {
            account.name = name;
        }
        if let Some(exclude) = update.exclude_from_reset {
            account.exclude_from_reset = exclude;
        }
        if let Some(limit) = update.credit_limit {
            account.credit_limit = limit;
        }
        if let Some(baseline) = update.monthly_baseline {
            account.monthly_baseline = baseline;
        }
        account
            .validate()
            .map_err(|e| LedgerError::invalid(e.to_string()))?;

        *self.state.account_mut(id)? = account.clone();
        debug!(account = %id, "account updated");
        Ok(account)
    }

    /// Delete an account together with every schedule that references it
    ///
    /// Transaction records keep their history even when they mention the
    /// account.
    pub fn delete(&mut self, id: AccountId) -> LedgerResult<AccountRemoval> {
        let account = self
            .state
            .accounts
            .remove(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        let dropped_schedules = self.state.drop_schedules_for_account(id);

        info!(
            account = %id,
            dropped = dropped_schedules.len(),
            "account deleted"
        );
        Ok(AccountRemoval {
            account,
            dropped_schedules,
        })
    }

    /// Add a pot to an account
    pub fn create_pot(&mut self, account_id: AccountId, new: NewPot) -> LedgerResult<Pot> {
        let name = check_name(&new.name)?;
        check_non_negative("Monthly baseline", new.monthly_baseline)?;

        let account = self.state.account(account_id)?;
        let wanted = name.to_lowercase();
        if account.pots.iter().any(|p| p.name.to_lowercase() == wanted) {
            return Err(LedgerError::invalid(format!(
                "'{}' already has a pot named '{}'",
                account.name, name
            )));
        }

        let pot_id = self.state.next_pot_id();
        let mut pot = Pot::new(pot_id, name);
        pot.exclude_from_reset = new.exclude_from_reset;
        pot.monthly_baseline = new.monthly_baseline;
        self.state.account_mut(account_id)?.pots.push(pot);

        let target = BalanceRef::pot(account_id, pot_id);
        if !new.opening_balance.is_zero() {
            self.state.apply_delta(target, new.opening_balance)?;
        }

        info!(account = %account_id, pot = %pot_id, "pot created");
        self.pot(target)
    }

    pub fn update_pot(
        &mut self,
        account_id: AccountId,
        pot_id: PotId,
        update: PotUpdate,
    ) -> LedgerResult<Pot> {
        let name = update.name.as_deref().map(check_name).transpose()?;
        if let Some(baseline) = update.monthly_baseline {
            check_non_negative("Monthly baseline", baseline)?;
        }

        let account = self.state.account(account_id)?;
        if account.pot(pot_id).is_none() {
            return Err(LedgerError::pot_not_found(pot_id));
        }
        if let Some(name) = &name {
            let wanted = name.to_lowercase();
            if account
                .pots
                .iter()
                .any(|p| p.id != pot_id && p.name.to_lowercase() == wanted)
            {
                return Err(LedgerError::invalid(format!(
                    "'{}' already has a pot named '{}'",
                    account.name, name
                )));
            }
        }

        let pot = self
            .state
            .account_mut(account_id)?
            .pot_mut(pot_id)
            .ok_or_else(|| LedgerError::pot_not_found(pot_id))?;
        if let Some(name) = name {
            pot.name = name;
        }
        if let Some(exclude) = update.exclude_from_reset {
            pot.exclude_from_reset = exclude;
        }
        if let Some(baseline) = update.monthly_baseline {
            pot.monthly_baseline = baseline;
        }

        debug!(account = %account_id, pot = %pot_id, "pot updated");
        self.pot(BalanceRef::pot(account_id, pot_id))
    }

    /// Delete a pot and every schedule that references it
    pub fn delete_pot(&mut self, account_id: AccountId, pot_id: PotId) -> LedgerResult<PotRemoval> {
        let account = self.state.account_mut(account_id)?;
        let index = account
            .pots
            .iter()
            .position(|p| p.id == pot_id)
            .ok_or_else(|| LedgerError::pot_not_found(pot_id))?;
        let pot = account.pots.remove(index);
        let dropped_schedules = self.state.drop_schedules_for_pot(pot_id);

        info!(
            account = %account_id,
            pot = %pot_id,
            dropped = dropped_schedules.len(),
            "pot deleted"
        );
        Ok(PotRemoval {
            account_id,
            pot,
            dropped_schedules,
        })
    }

    /// Attach a day-of-month payment to an account
    pub fn add_scheduled_payment(
        &mut self,
        account_id: AccountId,
        new: NewScheduledPayment,
    ) -> LedgerResult<ScheduledPayment> {
        let name = check_name(&new.name)?;
        if !new.amount.is_positive() {
            return Err(LedgerError::invalid("Payment amount must be positive"));
        }
        if !(1..=31).contains(&new.day_of_month) {
            return Err(LedgerError::invalid(format!(
                "Day of month must be between 1 and 31, got {}",
                new.day_of_month
            )));
        }

        let account = self.state.account(account_id)?;
        if let Some(pot_id) = new.pot_id {
            if account.pot(pot_id).is_none() {
                return Err(LedgerError::pot_not_found(pot_id));
            }
        }
        if let Some(card_id) = new.linked_credit_account_id {
            let card = self.state.account(card_id)?;
            if card.kind != AccountKind::Credit {
                return Err(LedgerError::invalid(format!(
                    "'{}' is not a credit account",
                    card.name
                )));
            }
        }

        let payment = ScheduledPayment {
            id: self.state.next_schedule_id(),
            name,
            amount: new.amount,
            day_of_month: new.day_of_month,
            pot_id: new.pot_id,
            linked_credit_account_id: new.linked_credit_account_id,
            is_completed: false,
            last_executed: None,
        };
        self.state
            .account_mut(account_id)?
            .scheduled_payments
            .push(payment.clone());

        info!(account = %account_id, payment = %payment.id, "scheduled payment added");
        Ok(payment)
    }

    pub fn remove_scheduled_payment(
        &mut self,
        account_id: AccountId,
        payment_id: ScheduleId,
    ) -> LedgerResult<ScheduledPayment> {
        let account = self.state.account_mut(account_id)?;
        let index = account
            .scheduled_payments
            .iter()
            .position(|p| p.id == payment_id)
            .ok_or_else(|| LedgerError::schedule_not_found(payment_id))?;
        let payment = account.scheduled_payments.remove(index);

        info!(account = %account_id, payment = %payment_id, "scheduled payment removed");
        Ok(payment)
    }

    fn pot(&self, target: BalanceRef) -> LedgerResult<Pot> {
        let pot_id = target
            .pot_id
            .ok_or_else(|| LedgerError::invalid("not a pot reference"))?;
        self.state
            .account(target.account_id)?
            .pot(pot_id)
            .cloned()
            .ok_or_else(|| LedgerError::pot_not_found(pot_id))
    }
}
