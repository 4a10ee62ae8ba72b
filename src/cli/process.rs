//! Bulk processing, reset and reduction commands

use tracing::info;

use super::args::parse_at;
use crate::config::Settings;
use crate::engine::LedgerEngine;
use crate::error::LedgerResult;
use crate::models::BalanceReductionLog;

fn print_reductions(logs: &[BalanceReductionLog]) {
    if logs.is_empty() {
        println!("No balances needed reducing.");
        return;
    }
    for log in logs {
        println!("  {}", log.format_human_readable());
    }
}

/// Run every due item, then the monthly reduction when settings call for it
pub async fn handle_process_command(
    engine: &LedgerEngine,
    settings: &Settings,
    date: Option<String>,
) -> LedgerResult<()> {
    let at = parse_at(date.as_deref())?;
    let summary = engine.execute_all(at).await?;

    if summary.attempted() == 0 {
        println!("Nothing due.");
    } else {
        println!(
            "Processed {} item(s): {} executed, {} failed",
            summary.attempted(),
            summary.executed,
            summary.failed
        );
        if summary.failed > 0 {
            println!("  See `potledger logs show` for the failures.");
        }
    }

    let already_reduced = engine.snapshot().reduced_in_month(at);
    if settings.reduction_due(at.date_naive()) && !already_reduced {
        info!("applying monthly reduction");
        let logs = engine.apply_monthly_reduction(at).await?;
        println!("Monthly reduction applied:");
        print_reductions(&logs);
    }

    Ok(())
}

/// Zero every balance not excluded from reset
pub async fn handle_reset_command(engine: &LedgerEngine, yes: bool) -> LedgerResult<()> {
    if !yes {
        println!("This zeroes every account and pot not excluded from reset.");
        println!("Run again with --yes to confirm.");
        return Ok(());
    }

    let summary = engine.reset_balances().await?;
    println!(
        "Reset {} account(s) and {} pot(s); {} schedule(s) made pending again",
        summary.accounts_zeroed, summary.pots_zeroed, summary.schedules_cleared
    );
    Ok(())
}

/// Apply the monthly reduction regardless of the configured day
pub async fn handle_reduce_command(engine: &LedgerEngine, date: Option<String>) -> LedgerResult<()> {
    let logs = engine
        .apply_monthly_reduction(parse_at(date.as_deref())?)
        .await?;
    println!("Monthly reduction applied:");
    print_reductions(&logs);
    Ok(())
}
