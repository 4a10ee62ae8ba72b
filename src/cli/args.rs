//! Argument parsing shared by the CLI handlers
//!
//! Turns the strings clap hands us into ids, amounts, balance references
//! and timestamps, resolving names against a ledger snapshot.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, BalanceRef, EventId, Money, ScheduleId, TransactionId};
use crate::services::account::{find_account, find_pot};
use crate::state::LedgerState;

/// Parse a user-entered amount such as `"1000"`, `"12.50"` or `"$12.50"`
pub fn parse_amount(input: &str) -> LedgerResult<Money> {
    Money::parse(input).map_err(|e| {
        LedgerError::invalid(format!(
            "Invalid amount format: '{}'. Use format like '100.00' or '100'. Error: {}",
            input, e
        ))
    })
}

pub fn parse_optional_amount(input: Option<&str>) -> LedgerResult<Option<Money>> {
    input.map(parse_amount).transpose()
}

/// Timestamp for an execution: midnight UTC of `--date`, or now
pub fn parse_at(date: Option<&str>) -> LedgerResult<DateTime<Utc>> {
    match date {
        Some(text) => {
            let day = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
                LedgerError::invalid(format!("Invalid date format: '{}'. Use YYYY-MM-DD", text))
            })?;
            Ok(day.and_time(NaiveTime::MIN).and_utc())
        }
        None => Ok(Utc::now()),
    }
}

fn parse_id<T: FromStr>(label: &str, input: &str) -> LedgerResult<T> {
    input
        .parse()
        .map_err(|_| LedgerError::invalid(format!("Invalid {} id: '{}'", label, input)))
}

pub fn parse_schedule_id(input: &str) -> LedgerResult<ScheduleId> {
    parse_id("schedule", input)
}

pub fn parse_transaction_id(input: &str) -> LedgerResult<TransactionId> {
    parse_id("transaction", input)
}

pub fn parse_event_id(input: &str) -> LedgerResult<EventId> {
    parse_id("event", input)
}

/// Resolve an account name or id
pub fn resolve_account(state: &LedgerState, identifier: &str) -> LedgerResult<AccountId> {
    find_account(state, identifier)
        .map(|account| account.id)
        .ok_or_else(|| LedgerError::account_not_found(identifier))
}

/// Resolve an account, or one of its pots when `pot` is given
pub fn resolve_target(
    state: &LedgerState,
    account: &str,
    pot: Option<&str>,
) -> LedgerResult<BalanceRef> {
    let found = find_account(state, account).ok_or_else(|| LedgerError::account_not_found(account))?;
    match pot {
        Some(pot) => {
            let found_pot = find_pot(found, pot).ok_or_else(|| LedgerError::pot_not_found(pot))?;
            Ok(BalanceRef::pot(found.id, found_pot.id))
        }
        None => Ok(BalanceRef::account(found.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountKind, Pot, PotId};
    use chrono::{Datelike, Timelike};

    fn state() -> LedgerState {
        let mut state = LedgerState::new();
        let mut account = Account::new(AccountId::new(3), "Main", AccountKind::Checking);
        account.pots.push(Pot::new(PotId::new(7), "Holiday"));
        state.accounts.insert(account.id, account);
        state
    }

    #[test]
    fn test_resolve_target_by_name_and_id() {
        let state = state();
        assert_eq!(
            resolve_target(&state, "main", None).unwrap(),
            BalanceRef::account(AccountId::new(3))
        );
        assert_eq!(
            resolve_target(&state, "acc-3", Some("pot-7")).unwrap(),
            BalanceRef::pot(AccountId::new(3), PotId::new(7))
        );
        assert!(resolve_target(&state, "Main", Some("Rent"))
            .unwrap_err()
            .is_not_found());
        assert!(resolve_account(&state, "Savings").unwrap_err().is_not_found());
    }

    #[test]
    fn test_parse_at_uses_midnight_utc() {
        let at = parse_at(Some("2026-02-28")).unwrap();
        assert_eq!((at.year(), at.month(), at.day(), at.hour()), (2026, 2, 28, 0));
        assert!(parse_at(Some("28/02/2026")).unwrap_err().is_invalid_operation());
    }

    #[test]
    fn test_parse_ids_and_amounts() {
        assert_eq!(parse_schedule_id("sch-4").unwrap(), ScheduleId::new(4));
        assert_eq!(parse_event_id("9").unwrap(), EventId::new(9));
        assert!(parse_transaction_id("txn-x").is_err());
        assert_eq!(parse_amount("12.50").unwrap(), Money::from_cents(1250));
        assert!(parse_amount("twelve").is_err());
        assert_eq!(parse_optional_amount(None).unwrap(), None);
    }
}
