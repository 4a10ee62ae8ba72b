//! Processed-transaction and reduction log commands

use clap::Subcommand;

use super::args::parse_at;
use crate::display::logs::{format_processed_logs, format_reduction_logs};
use crate::engine::LedgerEngine;
use crate::error::LedgerResult;

/// Log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// Show recent log entries
    Show {
        /// Number of entries of each kind to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
        /// Only show balance reductions
        #[arg(long)]
        reductions: bool,
    },
    /// Drop log entries older than a date
    Purge {
        /// Cutoff date (YYYY-MM-DD); entries before it are removed
        #[arg(long)]
        before: String,
    },
}

/// Handle a logs command
pub async fn handle_log_command(engine: &LedgerEngine, cmd: LogCommands) -> LedgerResult<()> {
    match cmd {
        LogCommands::Show { count, reductions } => {
            let state = engine.snapshot();
            if !reductions {
                println!("Processed transactions:");
                println!("{}", format_processed_logs(&state.processed_logs, count));
            }
            println!("Balance reductions:");
            println!("{}", format_reduction_logs(&state.reduction_logs, count));
        }

        LogCommands::Purge { before } => {
            let summary = engine.purge_logs(parse_at(Some(&before))?).await?;
            println!(
                "Removed {} processed and {} reduction log entries",
                summary.processed_removed, summary.reductions_removed
            );
        }
    }

    Ok(())
}
