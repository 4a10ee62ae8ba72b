//! Transaction record CLI commands
//!
//! Yearly items, card charges and history maintenance.

use clap::Subcommand;

use super::args::{
    parse_amount, parse_at, parse_event_id, parse_transaction_id, resolve_account, resolve_target,
};
use crate::config::Settings;
use crate::display::transaction::{format_transaction_details, format_transaction_list};
use crate::engine::LedgerEngine;
use crate::error::LedgerResult;
use crate::services::{EventDeletion, NewYearlyTransaction};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a yearly transaction
    Yearly {
        name: String,
        amount: String,
        /// Date it falls on (DD-MM-YYYY); only day and month recur
        #[arg(long)]
        date: String,
        /// Paying account name or ID
        #[arg(long)]
        from: String,
        #[arg(long)]
        from_pot: Option<String>,
        /// Receiving account, if the money stays in the ledger
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        to_pot: Option<String>,
    },
    /// Record a charge on a credit card
    Charge {
        /// Credit card name or ID
        card: String,
        /// Merchant or description
        name: String,
        amount: String,
        /// Charge date (YYYY-MM-DD), defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Execute a yearly transaction now
    Run {
        /// Transaction ID
        transaction: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Let a yearly transaction run again next year
    ResetYear { transaction: String },
    /// List all transaction records
    List,
    /// Show a record with its events
    Show { transaction: String },
    /// Delete a record and all its events
    Delete { transaction: String },
    /// Delete one event from a record's history
    DeleteEvent {
        transaction: String,
        /// Event ID
        event: String,
    },
}

/// Handle a transaction command
pub async fn handle_transaction_command(
    engine: &LedgerEngine,
    settings: &Settings,
    cmd: TransactionCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        TransactionCommands::Yearly {
            name,
            amount,
            date,
            from,
            from_pot,
            to,
            to_pot,
        } => {
            let new = {
                let state = engine.snapshot();
                NewYearlyTransaction {
                    name,
                    amount: parse_amount(&amount)?,
                    date,
                    source: resolve_target(&state, &from, from_pot.as_deref())?,
                    destination: to
                        .as_deref()
                        .map(|to| resolve_target(&state, to, to_pot.as_deref()))
                        .transpose()?,
                }
            };
            let record = engine.create_yearly_transaction(new).await?;
            println!(
                "Created yearly transaction: {} {} on {} ({})",
                record.name,
                record.amount.format_with_symbol(symbol),
                record.date.as_deref().unwrap_or_default(),
                record.id
            );
        }

        TransactionCommands::Charge {
            card,
            name,
            amount,
            date,
        } => {
            let card_id = resolve_account(&engine.snapshot(), &card)?;
            let record = engine
                .record_card_charge(
                    card_id,
                    name,
                    parse_amount(&amount)?,
                    parse_at(date.as_deref())?,
                )
                .await?;
            println!(
                "Charged {} to {} (record {}, {} charge(s))",
                record.amount.format_with_symbol(symbol),
                card,
                record.id,
                record.execution_count()
            );
        }

        TransactionCommands::Run { transaction, date } => {
            let record = engine
                .execute_yearly(
                    parse_transaction_id(&transaction)?,
                    parse_at(date.as_deref())?,
                )
                .await?;
            println!(
                "Executed {} {}",
                record.name,
                record.amount.format_with_symbol(symbol)
            );
        }

        TransactionCommands::ResetYear { transaction } => {
            let record = engine
                .reset_for_next_year(parse_transaction_id(&transaction)?)
                .await?;
            println!("{} will run again next year", record.name);
        }

        TransactionCommands::List => {
            print!("{}", format_transaction_list(&engine.snapshot(), symbol));
        }

        TransactionCommands::Show { transaction } => {
            let state = engine.snapshot();
            let record = state.transaction(parse_transaction_id(&transaction)?)?;
            print!("{}", format_transaction_details(&state, record, symbol));
        }

        TransactionCommands::Delete { transaction } => {
            let removed = engine
                .delete_transaction(parse_transaction_id(&transaction)?)
                .await?;
            println!(
                "Deleted transaction: {} ({} event(s))",
                removed.name,
                removed.execution_count()
            );
        }

        TransactionCommands::DeleteEvent { transaction, event } => {
            let deletion = engine
                .delete_event(
                    parse_transaction_id(&transaction)?,
                    parse_event_id(&event)?,
                )
                .await?;
            println!("Deleted event: {}", deletion.event().id);
            if let EventDeletion::RecordRemoved {
                record,
                unlinked_schedule,
                ..
            } = &deletion
            {
                println!("  {} had no events left and was removed", record.name);
                if let Some(schedule) = unlinked_schedule {
                    println!("  Schedule {} is no longer linked to a record", schedule);
                }
            }
        }
    }

    Ok(())
}
