//! Account CLI commands
//!
//! Implements CLI commands for accounts, their pots and scheduled payments.

use chrono::Utc;
use clap::Subcommand;

use super::args::{
    parse_amount, parse_at, parse_optional_amount, parse_schedule_id, resolve_account,
};
use crate::config::Settings;
use crate::display::account::{format_account_details, format_account_list};
use crate::engine::LedgerEngine;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountKind, Money};
use crate::services::account::find_pot;
use crate::services::{AccountUpdate, NewAccount, NewPot, NewScheduledPayment, PotUpdate};

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Account type (checking, savings, investment, credit)
        #[arg(short = 't', long, default_value = "checking")]
        account_type: String,
        /// Opening balance (e.g., "1000.00" or "1000")
        #[arg(short, long, default_value = "0")]
        balance: String,
        /// Credit limit, for credit accounts
        #[arg(long)]
        limit: Option<String>,
        /// Balance the monthly reduction brings this account back to
        #[arg(long)]
        baseline: Option<String>,
        /// Leave this account alone on reset and reduction
        #[arg(long)]
        exclude: bool,
    },
    /// List all accounts
    List,
    /// Show account details
    Show {
        /// Account name or ID
        account: String,
    },
    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New credit limit ("none" clears it)
        #[arg(long)]
        limit: Option<String>,
        /// New monthly baseline ("none" clears it)
        #[arg(long)]
        baseline: Option<String>,
        /// Exclude from reset and reduction (true/false)
        #[arg(long)]
        exclude: Option<bool>,
    },
    /// Delete an account with its pots and the schedules that use it
    Delete {
        /// Account name or ID
        account: String,
    },
}

/// Pot subcommands
#[derive(Subcommand)]
pub enum PotCommands {
    /// Create a pot inside an account
    Create {
        /// Owning account name or ID
        account: String,
        /// Pot name
        name: String,
        #[arg(short, long, default_value = "0")]
        balance: String,
        #[arg(long)]
        baseline: Option<String>,
        #[arg(long)]
        exclude: bool,
    },
    /// Edit a pot
    Edit {
        account: String,
        /// Pot name or ID
        pot: String,
        #[arg(short, long)]
        name: Option<String>,
        /// New monthly baseline ("none" clears it)
        #[arg(long)]
        baseline: Option<String>,
        #[arg(long)]
        exclude: Option<bool>,
    },
    /// Delete a pot and the schedules that use it
    Delete {
        account: String,
        /// Pot name or ID
        pot: String,
    },
}

/// Scheduled payment subcommands
#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Add a monthly payment to an account
    Add {
        /// Paying account name or ID
        account: String,
        name: String,
        amount: String,
        /// Day of the month the payment falls due (1-31)
        #[arg(short, long)]
        day: u32,
        /// Pay from this pot instead of the account
        #[arg(long)]
        pot: Option<String>,
        /// Charge this credit card instead
        #[arg(long)]
        card: Option<String>,
    },
    /// Remove a scheduled payment
    Remove {
        account: String,
        /// Payment ID
        payment: String,
    },
    /// Execute a scheduled payment now
    Run {
        account: String,
        payment: String,
        /// Execution date (YYYY-MM-DD), defaults to now
        #[arg(long)]
        date: Option<String>,
    },
}

/// `none` clears an optional amount, anything else sets it
fn parse_clearable(input: Option<&str>) -> LedgerResult<Option<Option<Money>>> {
    match input {
        Some(text) if text.trim().eq_ignore_ascii_case("none") => Ok(Some(None)),
        other => Ok(parse_optional_amount(other)?.map(Some)),
    }
}

/// Handle an account command
pub async fn handle_account_command(
    engine: &LedgerEngine,
    settings: &Settings,
    cmd: AccountCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        AccountCommands::Create {
            name,
            account_type,
            balance,
            limit,
            baseline,
            exclude,
        } => {
            let kind = AccountKind::parse(&account_type).ok_or_else(|| {
                LedgerError::invalid(format!(
                    "Invalid account type: '{}'. Valid types: checking, savings, investment, credit",
                    account_type
                ))
            })?;

            let mut opening_balance = parse_amount(&balance)?;
            // Debt is entered as a positive number but stored negative
            if kind.is_liability() && opening_balance.is_positive() {
                opening_balance = -opening_balance;
            }

            let account = engine
                .create_account(NewAccount {
                    name,
                    kind,
                    opening_balance,
                    exclude_from_reset: exclude,
                    credit_limit: parse_optional_amount(limit.as_deref())?,
                    monthly_baseline: parse_optional_amount(baseline.as_deref())?,
                })
                .await?;

            println!("Created account: {}", account.name);
            println!("  Type: {}", account.kind);
            println!(
                "  Opening Balance: {}",
                account.balance.format_with_symbol(symbol)
            );
            println!("  ID: {}", account.id);
        }

        AccountCommands::List => {
            print!("{}", format_account_list(&engine.snapshot(), symbol));
        }

        AccountCommands::Show { account } => {
            let state = engine.snapshot();
            let id = resolve_account(&state, &account)?;
            let found = state.account(id)?;
            let today = Utc::now().date_naive();
            print!("{}", format_account_details(&state, found, symbol, today));
        }

        AccountCommands::Edit {
            account,
            name,
            limit,
            baseline,
            exclude,
        } => {
            let id = resolve_account(&engine.snapshot(), &account)?;
            let update = AccountUpdate {
                name,
                exclude_from_reset: exclude,
                credit_limit: parse_clearable(limit.as_deref())?,
                monthly_baseline: parse_clearable(baseline.as_deref())?,
            };

            if update.name.is_none()
                && update.exclude_from_reset.is_none()
                && update.credit_limit.is_none()
                && update.monthly_baseline.is_none()
            {
                println!("No changes specified. Use --name, --limit, --baseline or --exclude.");
                return Ok(());
            }

            let updated = engine.update_account(id, update).await?;
            println!("Updated account: {}", updated.name);
        }

        AccountCommands::Delete { account } => {
            let id = resolve_account(&engine.snapshot(), &account)?;
            let removal = engine.delete_account(id).await?;
            println!("Deleted account: {}", removal.account.name);
            if !removal.dropped_schedules.is_empty() {
                println!(
                    "  Removed {} schedule(s) that used it",
                    removal.dropped_schedules.len()
                );
            }
        }
    }

    Ok(())
}

/// Handle a pot command
pub async fn handle_pot_command(
    engine: &LedgerEngine,
    settings: &Settings,
    cmd: PotCommands,
) -> LedgerResult<()> {
    match cmd {
        PotCommands::Create {
            account,
            name,
            balance,
            baseline,
            exclude,
        } => {
            let account_id = resolve_account(&engine.snapshot(), &account)?;
            let pot = engine
                .create_pot(
                    account_id,
                    NewPot {
                        name,
                        opening_balance: parse_amount(&balance)?,
                        exclude_from_reset: exclude,
                        monthly_baseline: parse_optional_amount(baseline.as_deref())?,
                    },
                )
                .await?;
            println!(
                "Created pot: {} ({}) with {}",
                pot.name,
                pot.id,
                pot.balance.format_with_symbol(&settings.currency_symbol)
            );
        }

        PotCommands::Edit {
            account,
            pot,
            name,
            baseline,
            exclude,
        } => {
            let (account_id, pot_id) = {
                let state = engine.snapshot();
                let account_id = resolve_account(&state, &account)?;
                let owner = state.account(account_id)?;
                let found = find_pot(owner, &pot).ok_or_else(|| LedgerError::pot_not_found(&pot))?;
                (account_id, found.id)
            };
            let update = PotUpdate {
                name,
                exclude_from_reset: exclude,
                monthly_baseline: parse_clearable(baseline.as_deref())?,
            };
            let updated = engine.update_pot(account_id, pot_id, update).await?;
            println!("Updated pot: {}", updated.name);
        }

        PotCommands::Delete { account, pot } => {
            let (account_id, pot_id) = {
                let state = engine.snapshot();
                let account_id = resolve_account(&state, &account)?;
                let owner = state.account(account_id)?;
                let found = find_pot(owner, &pot).ok_or_else(|| LedgerError::pot_not_found(&pot))?;
                (account_id, found.id)
            };
            let removal = engine.delete_pot(account_id, pot_id).await?;
            println!("Deleted pot: {}", removal.pot.name);
            if !removal.dropped_schedules.is_empty() {
                println!(
                    "  Removed {} schedule(s) that used it",
                    removal.dropped_schedules.len()
                );
            }
        }
    }

    Ok(())
}

/// Handle a scheduled payment command
pub async fn handle_payment_command(
    engine: &LedgerEngine,
    settings: &Settings,
    cmd: PaymentCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        PaymentCommands::Add {
            account,
            name,
            amount,
            day,
            pot,
            card,
        } => {
            let (account_id, pot_id, card_id) = {
                let state = engine.snapshot();
                let account_id = resolve_account(&state, &account)?;
                let pot_id = match pot.as_deref() {
                    Some(pot) => {
                        let owner = state.account(account_id)?;
                        let found =
                            find_pot(owner, pot).ok_or_else(|| LedgerError::pot_not_found(pot))?;
                        Some(found.id)
                    }
                    None => None,
                };
                let card_id = card
                    .as_deref()
                    .map(|card| resolve_account(&state, card))
                    .transpose()?;
                (account_id, pot_id, card_id)
            };

            let payment = engine
                .add_scheduled_payment(
                    account_id,
                    NewScheduledPayment {
                        name,
                        amount: parse_amount(&amount)?,
                        day_of_month: day,
                        pot_id,
                        linked_credit_account_id: card_id,
                    },
                )
                .await?;
            println!(
                "Added payment: {} {} on day {} ({})",
                payment.name,
                payment.amount.format_with_symbol(symbol),
                payment.day_of_month,
                payment.id
            );
        }

        PaymentCommands::Remove { account, payment } => {
            let account_id = resolve_account(&engine.snapshot(), &account)?;
            let removed = engine
                .remove_scheduled_payment(account_id, parse_schedule_id(&payment)?)
                .await?;
            println!("Removed payment: {}", removed.name);
        }

        PaymentCommands::Run {
            account,
            payment,
            date,
        } => {
            let account_id = resolve_account(&engine.snapshot(), &account)?;
            let record = engine
                .execute_scheduled_payment(
                    account_id,
                    parse_schedule_id(&payment)?,
                    parse_at(date.as_deref())?,
                )
                .await?;
            println!(
                "Paid {} {} (record {}, {} run(s))",
                record.name,
                record.amount.format_with_symbol(symbol),
                record.id,
                record.execution_count()
            );
        }
    }

    Ok(())
}
