//! Account display formatting
//!
//! Formats accounts, their pots and scheduled payments for terminal output.

use chrono::NaiveDate;

use crate::models::{Account, BalanceRef, Money};
use crate::state::LedgerState;

/// Format every account as a table with a total row
pub fn format_account_list(state: &LedgerState, symbol: &str) -> String {
    if state.accounts.is_empty() {
        return "No accounts found.".to_string();
    }

    let accounts: Vec<&Account> = state.accounts.values().collect();
    let name_width = accounts
        .iter()
        .map(|a| a.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let type_width = accounts
        .iter()
        .map(|a| a.kind.to_string().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<7}  {:<name_width$}  {:<type_width$}  {:>12}  {:>12}  {}\n",
        "ID",
        "Name",
        "Type",
        "Balance",
        "With Pots",
        "Flags",
        name_width = name_width,
        type_width = type_width,
    ));
    output.push_str(&format!(
        "{:-<7}  {:-<name_width$}  {:-<type_width$}  {:->12}  {:->12}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
        type_width = type_width,
    ));

    for account in &accounts {
        let flags = if account.exclude_from_reset {
            "excluded"
        } else {
            ""
        };
        output.push_str(&format!(
            "{:<7}  {:<name_width$}  {:<type_width$}  {:>12}  {:>12}  {}\n",
            account.id.to_string(),
            account.name,
            account.kind.to_string(),
            account.balance.format_with_symbol(symbol),
            account.total_balance().format_with_symbol(symbol),
            flags,
            name_width = name_width,
            type_width = type_width,
        ));
    }

    let total: Money = accounts.iter().map(|a| a.total_balance()).sum();
    output.push_str(&format!(
        "{:<7}  {:<name_width$}  {:<type_width$}  {:>12}  {:>12}\n",
        "",
        "TOTAL",
        "",
        "",
        total.format_with_symbol(symbol),
        name_width = name_width,
        type_width = type_width,
    ));

    output
}

/// Format a single account with its pots and scheduled payments
pub fn format_account_details(
    state: &LedgerState,
    account: &Account,
    symbol: &str,
    today: NaiveDate,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:             {}\n", account.id));
    output.push_str(&format!("  Type:           {}\n", account.kind));
    output.push_str(&format!(
        "  Balance:        {}\n",
        account.balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Excluded:       {}\n",
        if account.exclude_from_reset { "Yes" } else { "No" }
    ));
    if let Some(limit) = account.credit_limit {
        output.push_str(&format!(
            "  Credit Limit:   {}\n",
            limit.format_with_symbol(symbol)
        ));
    }
    if let Some(baseline) = account.monthly_baseline {
        output.push_str(&format!(
            "  Monthly Base:   {}\n",
            baseline.format_with_symbol(symbol)
        ));
    }

    if !account.pots.is_empty() {
        output.push_str("\n  Pots:\n");
        for pot in &account.pots {
            output.push_str(&format!(
                "    {:<7}  {:<20}  {:>12}{}\n",
                pot.id.to_string(),
                pot.name,
                pot.balance.format_with_symbol(symbol),
                if pot.exclude_from_reset { "  (excluded)" } else { "" }
            ));
        }
    }

    if !account.scheduled_payments.is_empty() {
        output.push_str("\n  Scheduled Payments:\n");
        for payment in &account.scheduled_payments {
            let charged = match payment.linked_credit_account_id {
                Some(card) => format!("  -> {}", state.ref_name(BalanceRef::account(card))),
                None => String::new(),
            };
            output.push_str(&format!(
                "    {:<7}  {:<20}  {:>12}  day {:>2}  {:<8}{}\n",
                payment.id.to_string(),
                payment.name,
                payment.amount.format_with_symbol(symbol),
                payment.day_of_month,
                payment.state(today).to_string(),
                charged
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, AccountKind, Pot, PotId};

    fn state() -> LedgerState {
        let mut state = LedgerState::new();
        let mut checking = Account::new(AccountId::new(1), "Checking", AccountKind::Checking);
        checking.balance = Money::from_cents(12345);
        let mut pot = Pot::new(PotId::new(1), "Bills");
        pot.balance = Money::from_cents(500);
        checking.pots.push(pot);
        state.accounts.insert(checking.id, checking);
        state
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_account_list(&LedgerState::new(), "$"), "No accounts found.");
    }

    #[test]
    fn test_list_includes_total() {
        let output = format_account_list(&state(), "$");
        assert!(output.contains("Checking"));
        assert!(output.contains("$123.45"));
        assert!(output.contains("TOTAL"));
        assert!(output.contains("$128.45"));
    }

    #[test]
    fn test_details_list_pots() {
        let state = state();
        let account = state.account(AccountId::new(1)).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let output = format_account_details(&state, account, "€", today);
        assert!(output.contains("Pots:"));
        assert!(output.contains("Bills"));
        assert!(output.contains("€5.00"));
    }
}
