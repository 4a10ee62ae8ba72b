//! Balance resets and monthly reductions
//!
//! Accounts and pots flagged `exclude_from_reset` opt out of both. A pot is
//! only touched when its own account is not excluded.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{BalanceRef, BalanceReductionLog, Money};
use crate::state::LedgerState;

pub struct ResetService<'a> {
    state: &'a mut LedgerState,
}

/// Counts reported by [`ResetService::reset_balances`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub accounts_zeroed: usize,
    pub pots_zeroed: usize,
    pub schedules_cleared: usize,
}

/// Counts reported by [`ResetService::purge_logs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub processed_removed: usize,
    pub reductions_removed: usize,
}

impl<'a> ResetService<'a> {
    pub fn new(state: &'a mut LedgerState) -> Self {
        Self { state }
    }

    /// Every balance the reset or reduction may touch
    fn eligible_targets(&self) -> Vec<(BalanceRef, String, Money, Option<Money>)> {
        let mut targets = Vec::new();
        for account in self.state.accounts.values() {
            if account.exclude_from_reset {
                continue;
            }
            targets.push((
                BalanceRef::account(account.id),
                account.name.clone(),
                account.balance,
                account.monthly_baseline,
            ));
            for pot in account.pots.iter().filter(|p| !p.exclude_from_reset) {
                targets.push((
                    BalanceRef::pot(account.id, pot.id),
                    format!("{} / {}", account.name, pot.name),
                    pot.balance,
                    pot.monthly_baseline,
                ));
            }
        }
        targets
    }

    /// Zero eligible balances and make every schedule pending again
    ///
    /// Transaction records, yearly completion and event histories are left
    /// alone.
    pub fn reset_balances(&mut self) -> LedgerResult<ResetSummary> {
        let mut summary = ResetSummary::default();

        for (target, _, balance, _) in self.eligible_targets() {
            if !balance.is_zero() {
                self.state.apply_delta(target, -balance)?;
            }
            if target.pot_id.is_some() {
                summary.pots_zeroed += 1;
            } else {
                summary.accounts_zeroed += 1;
            }
        }

        for schedule in self.state.income_schedules.values_mut() {
            schedule.is_completed = false;
            schedule.last_executed = None;
            summary.schedules_cleared += 1;
        }
        for schedule in self.state.transfer_schedules.values_mut() {
            schedule.is_completed = false;
            schedule.last_executed = None;
            summary.schedules_cleared += 1;
        }
        for account in self.state.accounts.values_mut() {
            for payment in &mut account.scheduled_payments {
                payment.is_completed = false;
                payment.last_executed = None;
                summary.schedules_cleared += 1;
            }
        }

        info!(
            accounts = summary.accounts_zeroed,
            pots = summary.pots_zeroed,
            schedules = summary.schedules_cleared,
            "balances reset"
        );
        Ok(summary)
    }

    /// Subtract each eligible monthly baseline once for the month of `at`
    pub fn apply_monthly_reduction(
        &mut self,
        at: DateTime<Utc>,
    ) -> LedgerResult<Vec<BalanceReductionLog>> {
        if self.state.reduced_in_month(at) {
            return Err(LedgerError::invalid(format!(
                "Monthly reduction already applied for {}",
                at.format("%Y-%m")
            )));
        }

        let reductions: Vec<_> = self
            .eligible_targets()
            .into_iter()
            .filter_map(|(target, name, balance_before, baseline)| {
                let amount = baseline.filter(|b| !b.is_zero())?;
                Some((target, name, balance_before, amount))
            })
            .collect();
        for (target, _, _, amount) in &reductions {
            self.state.check_delta(*target, -*amount)?;
        }

        let mut logs = Vec::new();
        for (target, name, balance_before, amount) in reductions {
            let balance_after = self.state.apply_delta(target, -amount)?;
            debug!(%target, %amount, %balance_after, "balance reduced");
            logs.push(BalanceReductionLog {
                reduced_at: at,
                target,
                name,
                amount,
                balance_before,
                balance_after,
            });
        }

        self.state.reduction_logs.extend(logs.iter().cloned());
        self.state.last_reduction_at = Some(at);
        info!(reduced = logs.len(), month = %at.format("%Y-%m"), "monthly reduction applied");
        Ok(logs)
    }

    /// Drop processed and reduction logs older than `before`
    pub fn purge_logs(&mut self, before: DateTime<Utc>) -> PurgeSummary {
        let processed = self.state.processed_logs.len();
        self.state
            .processed_logs
            .retain(|log| log.processed_at >= before);
        let reductions = self.state.reduction_logs.len();
        self.state
            .reduction_logs
            .retain(|log| log.reduced_at >= before);

        let summary = PurgeSummary {
            processed_removed: processed - self.state.processed_logs.len(),
            reductions_removed: reductions - self.state.reduction_logs.len(),
        };
        info!(
            processed = summary.processed_removed,
            reductions = summary.reductions_removed,
            "logs purged"
        );
        summary
    }
}
