//! A single sliding-window budget: at most `max_changes` filter changes in
//! any `window` seconds.

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Maximum number of filter changes allowed inside a trailing time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetWindow {
    max_changes: u32,
    window: f64,
}

impl BudgetWindow {
    /// Validate a budget.
    ///
    /// `name` labels the budget in error messages (`"burst"`, `"average"`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidBudget`] when `max_changes` is zero or
    /// `window` is negative or not finite.
    pub fn new(name: &'static str, max_changes: u32, window: f64) -> Result<Self, LedgerError> {
        if max_changes == 0 {
            return Err(LedgerError::InvalidBudget {
                budget: name,
                reason: String::from("at least one change must be allowed"),
            });
        }
        if !(window.is_finite() && window >= 0.0) {
            return Err(LedgerError::InvalidBudget {
                budget: name,
                reason: format!("window must be non-negative and finite, got {window}"),
            });
        }
        Ok(Self {
            max_changes,
            window,
        })
    }

    /// Changes permitted per window.
    pub const fn max_changes(&self) -> u32 {
        self.max_changes
    }

    /// Window length in seconds.
    pub const fn window(&self) -> f64 {
        self.window
    }

    /// Whether a change at `changed_at` still counts against the budget at
    /// `now`.
    pub const fn covers(&self, now: f64, changed_at: f64) -> bool {
        now - changed_at < self.window
    }

    /// `max_changes` as a position in a newest-first walk of the history.
    pub(crate) fn newest_blocking_index(&self) -> usize {
        usize::try_from(self.max_changes)
            .unwrap_or(usize::MAX)
            .saturating_sub(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_changes_is_rejected() {
        let err = BudgetWindow::new("burst", 0, 10.0).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBudget { budget: "burst", .. }));
    }

    #[test]
    fn negative_window_is_rejected() {
        let err = BudgetWindow::new("average", 3, -1.0).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBudget { budget: "average", .. }));
    }

    #[test]
    fn window_is_half_open() {
        let budget = BudgetWindow::new("burst", 1, 60.0).unwrap();
        assert!(budget.covers(159.9, 100.0));
        assert!(!budget.covers(160.0, 100.0));
    }

    #[test]
    fn zero_window_covers_nothing_in_the_past() {
        let budget = BudgetWindow::new("burst", 1, 0.0).unwrap();
        assert!(!budget.covers(100.0, 100.0));
    }
}
