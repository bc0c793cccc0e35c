//! Rolling-window filter change ledger for the observatory slew model.
//!
//! The filter exchange mechanism has a limited duty cycle. Two independent
//! budgets cap how often it may run:
//!
//! - **Burst** -- at most N changes within a short window.
//! - **Average** -- at most M changes within a long window (typically a
//!   year), bounding long-run wear.
//!
//! A change is permitted only when both counts are strictly below their
//! maxima. The ledger never panics; it returns errors.
//!
//! # Architecture
//!
//! - [`window`] -- [`BudgetWindow`]: one validated `(max_changes, window)` pair.
//! - [`ledger`] -- [`FilterChangeLedger`]: the pruned history and its
//!   queries, plus [`LedgerCheckpoint`] for restarts.
//!
//! # Usage
//!
//! ```
//! use obsmodel_ledger::{BudgetWindow, FilterChangeLedger, LedgerError};
//!
//! let burst = BudgetWindow::new("burst", 1, 600.0)?;
//! let average = BudgetWindow::new("average", 3000, 31_557_600.0)?;
//! let mut ledger = FilterChangeLedger::new(burst, average);
//!
//! ledger.record_change(1000.0)?;
//! assert!(!ledger.can_change(1200.0));
//! assert!(matches!(
//!     ledger.record_change(1200.0),
//!     Err(LedgerError::BudgetExceeded { .. })
//! ));
//! assert!((ledger.earliest_change(1200.0) - 1600.0).abs() < 1e-9);
//! # Ok::<(), LedgerError>(())
//! ```

pub mod ledger;
pub mod window;

pub use ledger::{FilterChangeLedger, LedgerCheckpoint};
pub use window::BudgetWindow;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the filter change ledger.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// A budget was configured with impossible values.
    #[error("invalid {budget} filter change budget: {reason}")]
    InvalidBudget {
        /// Which budget (`"burst"` or `"average"`).
        budget: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A change was requested while a budget is exhausted.
    #[error("filter change budget exceeded at t={now:.1}; next change allowed at t={earliest:.1}")]
    BudgetExceeded {
        /// When the change was requested.
        now: f64,
        /// Earliest time the change would be allowed.
        earliest: f64,
    },

    /// A timestamp was earlier than the last recorded change, or not finite.
    #[error("filter change at t={now} precedes the last recorded change at t={last}")]
    OutOfOrder {
        /// Most recent recorded change.
        last: f64,
        /// The rejected timestamp.
        now: f64,
    },
}
