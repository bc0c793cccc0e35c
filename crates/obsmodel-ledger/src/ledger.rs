//! The filter-change ledger: a pruned, time-ordered log of filter changes.
//!
//! # Design
//!
//! - **Ordered**: timestamps are appended in non-decreasing order, so the
//!   newest entries sit at the back of the deque.
//! - **Bounded**: entries older than the longest budget window can never
//!   block a change again and are pruned lazily.
//! - **Cheap queries**: counting walks from the newest entry backwards and
//!   stops at the first entry outside the window.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LedgerError;
use crate::window::BudgetWindow;

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// Serializable copy of the ledger history, for restarting a simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerCheckpoint {
    /// Filter change times in epoch seconds, oldest first.
    pub timestamps: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Rolling record of filter changes checked against a burst budget and a
/// long-run average budget.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChangeLedger {
    burst: BudgetWindow,
    average: BudgetWindow,
    entries: VecDeque<f64>,
}

impl FilterChangeLedger {
    /// Create an empty ledger.
    pub const fn new(burst: BudgetWindow, average: BudgetWindow) -> Self {
        Self {
            burst,
            average,
            entries: VecDeque::new(),
        }
    }

    /// Rebuild a ledger from a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::OutOfOrder`] if the checkpoint timestamps are
    /// not finite and non-decreasing.
    pub fn restore(
        burst: BudgetWindow,
        average: BudgetWindow,
        checkpoint: &LedgerCheckpoint,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(burst, average);
        for &timestamp in &checkpoint.timestamps {
            ledger.push(timestamp)?;
        }
        Ok(ledger)
    }

    /// Snapshot the retained history.
    pub fn checkpoint(&self) -> LedgerCheckpoint {
        LedgerCheckpoint {
            timestamps: self.entries.iter().copied().collect(),
        }
    }

    /// The short-term budget.
    pub const fn burst(&self) -> &BudgetWindow {
        &self.burst
    }

    /// The long-run budget.
    pub const fn average(&self) -> &BudgetWindow {
        &self.average
    }

    /// Retention horizon: the longer of the two windows.
    pub const fn horizon(&self) -> f64 {
        self.burst.window().max(self.average.window())
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no change is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the most recent change.
    pub fn last_change(&self) -> Option<f64> {
        self.entries.back().copied()
    }

    /// Number of retained changes that `budget` still counts at `now`.
    pub fn changes_within(&self, now: f64, budget: &BudgetWindow) -> usize {
        self.entries
            .iter()
            .rev()
            .take_while(|&&changed_at| budget.covers(now, changed_at))
            .count()
    }

    /// Whether a change at `now` fits both budgets.
    pub fn can_change(&self, now: f64) -> bool {
        self.fits(now, &self.burst) && self.fits(now, &self.average)
    }

    /// Earliest time at or after `now` when a change fits both budgets.
    pub fn earliest_change(&self, now: f64) -> f64 {
        let burst = self.earliest_for(now, &self.burst);
        let average = self.earliest_for(now, &self.average);
        burst.max(average)
    }

    /// Check the budgets without recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BudgetExceeded`] with the earliest permitted
    /// time when either budget is exhausted.
    pub fn check(&self, now: f64) -> Result<(), LedgerError> {
        if self.can_change(now) {
            return Ok(());
        }
        Err(LedgerError::BudgetExceeded {
            now,
            earliest: self.earliest_change(now),
        })
    }

    /// Record a filter change at `now`.
    ///
    /// Stale entries are pruned first. On error nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BudgetExceeded`] if either budget is exhausted
    /// and [`LedgerError::OutOfOrder`] if `now` precedes the last change.
    pub fn record_change(&mut self, now: f64) -> Result<(), LedgerError> {
        if let Some(last) = self.last_change().filter(|&last| now < last) {
            return Err(LedgerError::OutOfOrder { last, now });
        }
        self.check(now)?;
        self.prune(now);
        self.push(now)?;
        debug!(
            time = now,
            burst = self.changes_within(now, &self.burst),
            average = self.changes_within(now, &self.average),
            "Filter change recorded"
        );
        Ok(())
    }

    /// Drop entries that no budget can count at `now` or later.
    pub fn prune(&mut self, now: f64) {
        let horizon = self.horizon();
        while self
            .entries
            .front()
            .is_some_and(|&oldest| now - oldest >= horizon)
        {
            self.entries.pop_front();
        }
    }

    // -- internals -------------------------------------------------------

    fn fits(&self, now: f64, budget: &BudgetWindow) -> bool {
        let limit = usize::try_from(budget.max_changes()).unwrap_or(usize::MAX);
        self.changes_within(now, budget) < limit
    }

    fn earliest_for(&self, now: f64, budget: &BudgetWindow) -> f64 {
        if self.fits(now, budget) {
            return now;
        }
        // The `max_changes`-th newest entry must leave the window.
        self.entries
            .iter()
            .rev()
            .nth(budget.newest_blocking_index())
            .map_or(now, |&blocking| (blocking + budget.window()).max(now))
    }

    fn push(&mut self, timestamp: f64) -> Result<(), LedgerError> {
        let last = self.last_change();
        let ordered = last.is_none_or(|last| timestamp >= last);
        if !(timestamp.is_finite() && ordered) {
            return Err(LedgerError::OutOfOrder {
                last: last.unwrap_or(f64::NEG_INFINITY),
                now: timestamp,
            });
        }
        self.entries.push_back(timestamp);
        Ok(())
    }
}
