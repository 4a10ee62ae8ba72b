//! Income and transfer schedule display formatting

use crate::models::{IncomeSchedule, TransferSchedule};
use crate::state::LedgerState;

fn active_label(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}

pub fn format_income_list(state: &LedgerState, symbol: &str) -> String {
    if state.income_schedules.is_empty() {
        return "No income schedules found.".to_string();
    }

    let schedules: Vec<&IncomeSchedule> = state.income_schedules.values().collect();
    let name_width = schedules
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<7}  {:<name_width$}  {:>12}  {:<8}  {:<8}  {:>4}  {}\n",
        "ID",
        "Name",
        "Amount",
        "State",
        "Status",
        "Runs",
        "Destination",
        name_width = name_width,
    ));

    for schedule in schedules {
        output.push_str(&format!(
            "{:<7}  {:<name_width$}  {:>12}  {:<8}  {:<8}  {:>4}  {}\n",
            schedule.id.to_string(),
            schedule.name,
            schedule.amount.format_with_symbol(symbol),
            schedule.state().to_string(),
            active_label(schedule.is_active),
            schedule.events.len(),
            state.ref_name(schedule.destination),
            name_width = name_width,
        ));
    }

    output
}

pub fn format_transfer_list(state: &LedgerState, symbol: &str) -> String {
    if state.transfer_schedules.is_empty() {
        return "No transfer schedules found.".to_string();
    }

    let schedules: Vec<&TransferSchedule> = state.transfer_schedules.values().collect();
    let name_width = schedules
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<7}  {:<name_width$}  {:>12}  {:<9}  {:<8}  {}\n",
        "ID",
        "Name",
        "Amount",
        "State",
        "Status",
        "Route",
        name_width = name_width,
    ));

    for schedule in schedules {
        let mut route = format!(
            "{} -> {}",
            state.ref_name(schedule.source),
            state.ref_name(schedule.destination)
        );
        if let Some(record) = schedule.transaction_id {
            route.push_str(&format!(" [{}]", record));
        }
        output.push_str(&format!(
            "{:<7}  {:<name_width$}  {:>12}  {:<9}  {:<8}  {}\n",
            schedule.id.to_string(),
            schedule.name,
            schedule.amount.format_with_symbol(symbol),
            schedule.state().to_string(),
            active_label(schedule.is_active),
            route,
            name_width = name_width,
        ));
    }

    output
}
