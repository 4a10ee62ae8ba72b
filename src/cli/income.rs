//! Income schedule CLI commands

use clap::Subcommand;

use super::args::{parse_amount, parse_at, parse_schedule_id, resolve_target};
use crate::config::Settings;
use crate::display::schedule::format_income_list;
use crate::engine::LedgerEngine;
use crate::error::LedgerResult;
use crate::services::NewIncomeSchedule;

/// Income subcommands
#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Add an income schedule
    Add {
        name: String,
        amount: String,
        /// Receiving account name or ID
        #[arg(long)]
        to: String,
        /// Receive into this pot of the account
        #[arg(long)]
        pot: Option<String>,
    },
    /// List income schedules
    List,
    /// Credit an income schedule now
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
    /// Delete an income schedule
    Delete { schedule: String },
}

/// Handle an income command
pub async fn handle_income_command(
    engine: &LedgerEngine,
    settings: &Settings,
    cmd: IncomeCommands,
) -> LedgerResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        IncomeCommands::Add {
            name,
            amount,
            to,
            pot,
        } => {
            let destination = resolve_target(&engine.snapshot(), &to, pot.as_deref())?;
            let schedule = engine
                .create_income_schedule(NewIncomeSchedule {
                    name,
                    destination,
                    amount: parse_amount(&amount)?,
                })
                .await?;
            println!(
                "Created income: {} {} ({})",
                schedule.name,
                schedule.amount.format_with_symbol(symbol),
                schedule.id
            );
        }

        IncomeCommands::List => {
            print!("{}", format_income_list(&engine.snapshot(), symbol));
        }

        IncomeCommands::Run { schedule, date } => {
            let schedule = engine
                .execute_income(parse_schedule_id(&schedule)?, parse_at(date.as_deref())?)
                .await?;
            println!(
                "Received {} from {}",
                schedule.amount.format_with_symbol(symbol),
                schedule.name
            );
        }

        IncomeCommands::Activate { schedule } => {
            let schedule = engine
                .set_income_active(parse_schedule_id(&schedule)?, true)
                .await?;
            println!("Activated income: {}", schedule.name);
        }

        IncomeCommands::Deactivate { schedule } => {
            let schedule = engine
                .set_income_active(parse_schedule_id(&schedule)?, false)
                .await?;
            println!("Deactivated income: {}", schedule.name);
        }

        IncomeCommands::Delete { schedule } => {
            let removed = engine
                .delete_income_schedule(parse_schedule_id(&schedule)?)
                .await?;
            println!("Deleted income: {}", removed.name);
        }
    }

    Ok(())
}
