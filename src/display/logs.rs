//! Processed-transaction and reduction log display

use crate::models::{BalanceReductionLog, ProcessedTransactionLog};

/// Newest `limit` processed entries, oldest first
pub fn format_processed_logs(logs: &[ProcessedTransactionLog], limit: usize) -> String {
    if logs.is_empty() {
        return "No processed transactions logged.".to_string();
    }

    let skip = logs.len().saturating_sub(limit);
    let mut output = String::new();
    for log in &logs[skip..] {
        output.push_str(&log.format_human_readable());
        output.push('\n');
    }
    output
}

pub fn format_reduction_logs(logs: &[BalanceReductionLog], limit: usize) -> String {
    if logs.is_empty() {
        return "No balance reductions logged.".to_string();
    }

    let skip = logs.len().saturating_sub(limit);
    let mut output = String::new();
    for log in &logs[skip..] {
        output.push_str(&log.format_human_readable());
        output.push('\n');
    }
    output
}
