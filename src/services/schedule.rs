//! Schedule service
//!
//! Creates, removes and toggles income and transfer schedules, and defines
//! yearly transaction records. Execution lives in [`super::execution`].

use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::models::account::validate_name;
use crate::models::{
    AccountId, AccountKind, BalanceRef, IncomeSchedule, Money, ScheduleId, TransactionKind,
    TransactionRecord, TransferSchedule, YearlyDate,
};
use crate::state::LedgerState;

pub struct ScheduleService<'a> {
    state: &'a mut LedgerState,
}

#[derive(Debug, Clone)]
pub struct NewIncomeSchedule {
    pub name: String,
    pub destination: BalanceRef,
    pub amount: Money,
}

#[derive(Debug, Clone)]
pub struct NewTransferSchedule {
    pub name: String,
    pub source: BalanceRef,
    pub destination: BalanceRef,
    pub amount: Money,
    /// Makes the schedule a recurring credit-card payment
    pub linked_credit_account_id: Option<AccountId>,
}

#[derive(Debug, Clone)]
pub struct NewYearlyTransaction {
    pub name: String,
    pub amount: Money,
    /// `DD-MM-YYYY`
    pub date: String,
    pub source: BalanceRef,
    pub destination: Option<BalanceRef>,
}

fn check_name(name: &str) -> LedgerResult<String> {
    validate_name(name).map_err(|e| LedgerError::invalid(e.to_string()))?;
    Ok(name.trim().to_string())
}

fn check_amount(amount: Money) -> LedgerResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::invalid(format!(
            "Amount must be positive, got {}",
            amount
        )))
    }
}

impl<'a> ScheduleService<'a> {
    pub fn new(state: &'a mut LedgerState) -> Self {
        Self { state }
    }

    fn ensure_credit_account(&self, id: AccountId) -> LedgerResult<()> {
        let account = self.state.account(id)?;
        if account.kind == AccountKind::Credit {
            Ok(())
        } else {
            Err(LedgerError::invalid(format!(
                "'{}' is not a credit account",
                account.name
            )))
        }
    }

    // ----- income -----

    pub fn create_income(&mut self, new: NewIncomeSchedule) -> LedgerResult<IncomeSchedule> {
        let name = check_name(&new.name)?;
        check_amount(new.amount)?;
        self.state.ensure_ref(new.destination)?;

        let schedule = IncomeSchedule {
            id: self.state.next_schedule_id(),
            name,
            destination: new.destination,
            amount: new.amount,
            is_active: true,
            is_completed: false,
            last_executed: None,
            events: Vec::new(),
        };
        self.state
            .income_schedules
            .insert(schedule.id, schedule.clone());

        info!(schedule = %schedule.id, destination = %schedule.destination, "income schedule created");
        Ok(schedule)
    }

    pub fn set_income_active(&mut self, id: ScheduleId, active: bool) -> LedgerResult<IncomeSchedule> {
        let schedule = self.state.income_schedule_mut(id)?;
        schedule.is_active = active;
        debug!(schedule = %id, active, "income schedule toggled");
        Ok(schedule.clone())
    }

    pub fn delete_income(&mut self, id: ScheduleId) -> LedgerResult<IncomeSchedule> {
        let schedule = self
            .state
            .income_schedules
            .remove(&id)
            .ok_or_else(|| LedgerError::schedule_not_found(id))?;
        info!(schedule = %id, "income schedule deleted");
        Ok(schedule)
    }

    // ----- transfers -----

    pub fn create_transfer(&mut self, new: NewTransferSchedule) -> LedgerResult<TransferSchedule> {
        let name = check_name(&new.name)?;
        check_amount(new.amount)?;
        if new.source == new.destination {
            return Err(LedgerError::invalid(
                "Source and destination must be different",
            ));
        }
        self.state.ensure_ref(new.source)?;
        self.state.ensure_ref(new.destination)?;
        if let Some(card_id) = new.linked_credit_account_id {
            self.ensure_credit_account(card_id)?;
        }

        let schedule = TransferSchedule {
            id: self.state.next_schedule_id(),
            name,
            source: new.source,
            destination: new.destination,
            amount: new.amount,
            is_active: true,
            is_completed: false,
            last_executed: None,
            linked_credit_account_id: new.linked_credit_account_id,
            transaction_id: None,
        };
        self.state
            .transfer_schedules
            .insert(schedule.id, schedule.clone());

        info!(
            schedule = %schedule.id,
            source = %schedule.source,
            destination = %schedule.destination,
            card_linked = schedule.is_card_linked(),
            "transfer schedule created"
        );
        Ok(schedule)
    }

    pub fn set_transfer_active(
        &mut self,
        id: ScheduleId,
        active: bool,
    ) -> LedgerResult<TransferSchedule> {
        let schedule = self.state.transfer_schedule_mut(id)?;
        schedule.is_active = active;
        debug!(schedule = %id, active, "transfer schedule toggled");
        Ok(schedule.clone())
    }

    /// Delete a transfer schedule; its payment record stays, unlinked
    pub fn delete_transfer(&mut self, id: ScheduleId) -> LedgerResult<TransferSchedule> {
        let schedule = self
            .state
            .remove_transfer_schedule(id)
            .ok_or_else(|| LedgerError::schedule_not_found(id))?;
        info!(schedule = %id, "transfer schedule deleted");
        Ok(schedule)
    }

    // ----- yearly -----

    /// Define a once-a-year transaction
    pub fn create_yearly(&mut self, new: NewYearlyTransaction) -> LedgerResult<TransactionRecord> {
        let name = check_name(&new.name)?;
        check_amount(new.amount)?;
        let date = YearlyDate::parse(&new.date)
            .map_err(|e| LedgerError::invalid(format!("Invalid date '{}': {}", new.date, e)))?;
        self.state.ensure_ref(new.source)?;
        if let Some(destination) = new.destination {
            if destination == new.source {
                return Err(LedgerError::invalid(
                    "Source and destination must be different",
                ));
            }
            self.state.ensure_ref(destination)?;
        }

        let id = self.state.next_transaction_id();
        let mut record = TransactionRecord::new(id, TransactionKind::Yearly, name, new.amount);
        record.source = Some(new.source);
        record.destination = new.destination;
        record.date = Some(date.to_string());
        record.is_completed = Some(false);
        self.state.transactions.insert(id, record.clone());

        info!(transaction = %id, date = %date, "yearly transaction created");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Pot, PotId};

    fn state() -> LedgerState {
        let mut state = LedgerState::new();
        for (name, kind) in [
            ("Checking", AccountKind::Checking),
            ("Savings", AccountKind::Savings),
            ("Visa", AccountKind::Credit),
        ] {
            let id = state.next_account_id();
            state.accounts.insert(id, Account::new(id, name, kind));
        }
        let pot_id = state.next_pot_id();
        if let Some(account) = state.accounts.get_mut(&AccountId::new(2)) {
            account.pots.push(Pot::new(pot_id, "Holiday"));
        }
        state
    }

    fn checking() -> BalanceRef {
        BalanceRef::account(AccountId::new(1))
    }

    fn holiday() -> BalanceRef {
        BalanceRef::pot(AccountId::new(2), PotId::new(1))
    }

    #[test]
    fn test_create_income_into_pot() {
        let mut state = state();
        let schedule = ScheduleService::new(&mut state)
            .create_income(NewIncomeSchedule {
                name: "Salary".into(),
                destination: holiday(),
                amount: Money::from_cents(250000),
            })
            .unwrap();

        assert!(schedule.is_active);
        assert!(!schedule.is_completed);
        assert_eq!(state.income_schedule(schedule.id).unwrap().destination, holiday());
    }

    #[test]
    fn test_create_income_rejects_missing_pot() {
        let mut state = state();
        let err = ScheduleService::new(&mut state)
            .create_income(NewIncomeSchedule {
                name: "Salary".into(),
                // pot 1 belongs to account 2, not account 1
                destination: BalanceRef::pot(AccountId::new(1), PotId::new(1)),
                amount: Money::from_cents(100),
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(state.income_schedules.is_empty());
    }

    #[test]
    fn test_create_transfer_validation() {
        let mut state = state();
        let mut service = ScheduleService::new(&mut state);
        let transfer = |source, linked| NewTransferSchedule {
            name: "Move".into(),
            source,
            destination: holiday(),
            amount: Money::from_cents(100),
            linked_credit_account_id: linked,
        };

        assert!(service
            .create_transfer(transfer(holiday(), None))
            .unwrap_err()
            .is_invalid_operation());
        assert!(service
            .create_transfer(transfer(checking(), Some(AccountId::new(2))))
            .unwrap_err()
            .is_invalid_operation());

        let linked = service
            .create_transfer(transfer(checking(), Some(AccountId::new(3))))
            .unwrap();
        assert!(linked.is_card_linked());
    }

    #[test]
    fn test_toggle_and_delete() {
        let mut state = state();
        let mut service = ScheduleService::new(&mut state);
        let income = service
            .create_income(NewIncomeSchedule {
                name: "Salary".into(),
                destination: checking(),
                amount: Money::from_cents(100),
            })
            .unwrap();

        assert!(!service.set_income_active(income.id, false).unwrap().is_active);
        service.delete_income(income.id).unwrap();
        assert!(service.delete_income(income.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_yearly_validates_date() {
        let mut state = state();
        let mut service = ScheduleService::new(&mut state);
        let yearly = |date: &str| NewYearlyTransaction {
            name: "Insurance".into(),
            amount: Money::from_cents(45000),
            date: date.into(),
            source: checking(),
            destination: None,
        };

        assert!(service
            .create_yearly(yearly("31-02-2026"))
            .unwrap_err()
            .is_invalid_operation());
        assert!(service
            .create_yearly(yearly("2026-03-01"))
            .unwrap_err()
            .is_invalid_operation());

        let record = service.create_yearly(yearly("1-3-2026")).unwrap();
        assert_eq!(record.date.as_deref(), Some("01-03-2026"));
        assert_eq!(record.is_completed, Some(false));
        assert_eq!(record.kind, TransactionKind::Yearly);
    }
}
