//! Append-only log entries stored in the ledger document
//!
//! Processed-transaction logs record every attempt made by a bulk execution,
//! successful or not. Balance-reduction logs record each monthly reduction
//! with the balance before and after.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::balance::BalanceRef;
use super::money::Money;

/// Kind of item a processed log entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessedItemKind {
    IncomeSchedule,
    TransferSchedule,
    ScheduledPayment,
    YearlyTransaction,
}

impl fmt::Display for ProcessedItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncomeSchedule => write!(f, "Income"),
            Self::TransferSchedule => write!(f, "Transfer"),
            Self::ScheduledPayment => write!(f, "Payment"),
            Self::YearlyTransaction => write!(f, "Yearly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessOutcome {
    Applied,
    Failed,
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "APPLIED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTransactionLog {
    pub processed_at: DateTime<Utc>,
    pub item_kind: ProcessedItemKind,
    /// Raw id of the schedule or transaction record
    pub item_id: u64,
    pub item_name: String,
    pub amount: Money,
    pub outcome: ProcessOutcome,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProcessedTransactionLog {
    pub fn applied(
        processed_at: DateTime<Utc>,
        item_kind: ProcessedItemKind,
        item_id: u64,
        item_name: impl Into<String>,
        amount: Money,
    ) -> Self {
        Self {
            processed_at,
            item_kind,
            item_id,
            item_name: item_name.into(),
            amount,
            outcome: ProcessOutcome::Applied,
            message: None,
        }
    }

    pub fn failed(
        processed_at: DateTime<Utc>,
        item_kind: ProcessedItemKind,
        item_id: u64,
        item_name: impl Into<String>,
        amount: Money,
        message: impl Into<String>,
    ) -> Self {
        Self {
            processed_at,
            item_kind,
            item_id,
            item_name: item_name.into(),
            amount,
            outcome: ProcessOutcome::Failed,
            message: Some(message.into()),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} #{} ({}) {}",
            self.processed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.outcome,
            self.item_kind,
            self.item_id,
            self.item_name,
            self.amount
        );

        if let Some(message) = &self.message {
            output.push_str(&format!("\n  Reason: {}", message));
        }

        output
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReductionLog {
    pub reduced_at: DateTime<Utc>,
    pub target: BalanceRef,
    pub name: String,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
}

impl BalanceReductionLog {
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] REDUCE {} ({}) by {}: {} -> {}",
            self.reduced_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.target,
            self.name,
            self.amount,
            self.balance_before,
            self.balance_after
        )
    }
}
