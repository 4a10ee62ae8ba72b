//! Transfer schedule CLI commands
//!
//! Moves between accounts and pots. A transfer linked to a credit card is
//! a card payment and accumulates its runs on one payment record.

use clap::Subcommand;

use super::args::{parse_amount, parse_at, parse_schedule_id, resolve_account, resolve_target};
use crate::config::Settings;
use crate::display::schedule::format_transfer_list;
use crate::engine::LedgerEngine;
use crate::error::LedgerResult;
use crate::services::NewTransferSchedule;

/// Transfer subcommands
#[derive(Subcommand)]
pub enum TransferCommands {
    /// Add a transfer schedule
    Add {
        name: String,
        amount: String,
        /// Source account name or ID
        #[arg(long)]
        from: String,
        /// Take from this pot of the source account
        #[arg(long)]
        from_pot: Option<String>,
        /// Destination account name or ID
        #[arg(long)]
        to: String,
        /// Put into this pot of the destination account
        #[arg(long)]
        to_pot: Option<String>,
        /// Credit card this transfer pays off
        #[arg(long)]
        card: Option<String>,
    },
    /// List transfer schedules
    List,
    /// Execute a transfer now
    Run {
        /// Schedule ID
        schedule: String,
        /// Execution date (YYYY-MM-DD), defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Include a schedule in `process` runs again
    Activate { schedule: String },
    /// Skip a schedule in `process` runs
    Deactivate { schedule: String },
    /// Delete a transfer schedule
    Delete { schedule: String },
}

/// Handle a transfer command
pub async fn handle_transfer_command(
    engine: &LedgerEngine,
    settings: &Settings,
    cmd: TransferCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        TransferCommands::Add {
            name,
            amount,
            from,
            from_pot,
            to,
            to_pot,
            card,
        } => {
            let new = {
                let state = engine.snapshot();
                NewTransferSchedule {
                    name,
                    source: resolve_target(&state, &from, from_pot.as_deref())?,
                    destination: resolve_target(&state, &to, to_pot.as_deref())?,
                    amount: parse_amount(&amount)?,
                    linked_credit_account_id: card
                        .as_deref()
                        .map(|card| resolve_account(&state, card))
                        .transpose()?,
                }
            };
            let schedule = engine.create_transfer_schedule(new).await?;
            println!(
                "Created transfer: {} {} ({})",
                schedule.name,
                schedule.amount.format_with_symbol(symbol),
                schedule.id
            );
        }

        TransferCommands::List => {
            print!("{}", format_transfer_list(&engine.snapshot(), symbol));
        }

        TransferCommands::Run { schedule, date } => {
            let result = engine
                .execute_transfer(parse_schedule_id(&schedule)?, parse_at(date.as_deref())?)
                .await?;
            println!(
                "Transferred {} for {}",
                result.schedule.amount.format_with_symbol(symbol),
                result.schedule.name
            );
            if let Some(record) = result.record {
                println!(
                    "  Payment record {} now has {} run(s)",
                    record.id,
                    record.execution_count()
                );
            }
        }

        TransferCommands::Activate { schedule } => {
            let schedule = engine
                .set_transfer_active(parse_schedule_id(&schedule)?, true)
                .await?;
            println!("Activated transfer: {}", schedule.name);
        }

        TransferCommands::Deactivate { schedule } => {
            let schedule = engine
                .set_transfer_active(parse_schedule_id(&schedule)?, false)
                .await?;
            println!("Deactivated transfer: {}", schedule.name);
        }

        TransferCommands::Delete { schedule } => {
            let removed = engine
                .delete_transfer_schedule(parse_schedule_id(&schedule)?)
                .await?;
            println!("Deleted transfer: {}", removed.name);
        }
    }

    Ok(())
}
