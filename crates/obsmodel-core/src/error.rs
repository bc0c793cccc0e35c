//! Error type returned by observatory model operations.

use obsmodel_kinematics::AngleError;
use obsmodel_ledger::LedgerError;
use obsmodel_types::Filter;

use crate::config::ConfigError;
use crate::graph::GraphError;

/// Errors from configuring or driving the observatory model.
///
/// Every mutating operation is atomic: when one of these is returned the
/// model state is exactly what it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum ObservatoryError {
    /// The configuration is invalid.
    #[error("configuration error: {source}")]
    Configuration {
        /// The underlying configuration error.
        source: ConfigError,
    },

    /// The slew prerequisites do not form a valid DAG.
    #[error("invalid slew graph: {source}")]
    CyclicDependency {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },

    /// Azimuth or rotator resolution failed.
    #[error(transparent)]
    Unreachable {
        /// The underlying resolution error.
        #[from]
        source: AngleError,
    },

    /// The target lies outside the mount altitude range.
    #[error("altitude {altitude:.3} deg is outside [{min:.3}, {max:.3}]")]
    UnreachableAltitude {
        /// Target altitude in degrees.
        altitude: f64,
        /// Lower altitude limit.
        min: f64,
        /// Upper altitude limit.
        max: f64,
    },

    /// The requested filter is neither mounted nor available for exchange.
    #[error("filter {filter} is not available")]
    UnknownFilter {
        /// The requested filter.
        filter: Filter,
    },

    /// The filter change budgets forbid a change now.
    #[error("filter change budget exceeded at t={now:.1}; next change allowed at t={earliest:.1}")]
    FilterChangeBudgetExceeded {
        /// When the change was requested.
        now: f64,
        /// Earliest time the change would be allowed.
        earliest: f64,
    },

    /// An unmounted filter was requested but no removable slot is free.
    #[error("filter {filter} is unmounted and no removable carousel slot is free")]
    FilterSlotUnavailable {
        /// The requested filter.
        filter: Filter,
    },

    /// Time was asked to move backwards.
    #[error("cannot move time from t={current} back to t={requested}")]
    NonMonotonicTime {
        /// Current model time.
        current: f64,
        /// Rejected time.
        requested: f64,
    },

    /// A manual filter swap was refused.
    #[error("cannot unmount filter {filter}: {reason}")]
    SwapRejected {
        /// Filter that was to be unmounted.
        filter: Filter,
        /// Why the swap was refused.
        reason: &'static str,
    },

    /// The filter change ledger rejected a record.
    #[error("filter change ledger: {source}")]
    Ledger {
        /// The underlying ledger error.
        source: LedgerError,
    },

    /// A thread panicked while holding the model lock.
    #[error("observatory model lock poisoned")]
    LockPoisoned,
}

impl From<ConfigError> for ObservatoryError {
    fn from(source: ConfigError) -> Self {
        match source {
            ConfigError::Graph { source } => Self::CyclicDependency { source },
            other => Self::Configuration { source: other },
        }
    }
}

impl From<LedgerError> for ObservatoryError {
    fn from(source: LedgerError) -> Self {
        match source {
            LedgerError::BudgetExceeded { now, earliest } => Self::FilterChangeBudgetExceeded { now, earliest },
            other => Self::Ledger { source: other },
        }
    }
}

impl ObservatoryError {
    /// Whether the error concerns one request only.
    ///
    /// Recoverable errors leave the model usable; the caller can pick a
    /// different target or retry later. The rest mean the model could not
    /// be built or can no longer be reached.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Configuration { .. } | Self::CyclicDependency { .. } | Self::LockPoisoned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhaustion_maps_to_its_own_variant() {
        let err = ObservatoryError::from(LedgerError::BudgetExceeded {
            now: 10.0,
            earliest: 610.0,
        });
        assert!(matches!(
            err,
            ObservatoryError::FilterChangeBudgetExceeded { earliest, .. } if (earliest - 610.0).abs() < f64::EPSILON
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn graph_errors_from_config_keep_their_kind() {
        let err = ObservatoryError::from(ConfigError::from(GraphError::Cyclic {
            activity: obsmodel_types::ActivityKind::TelAlt,
        }));
        assert!(matches!(err, ObservatoryError::CyclicDependency { .. }));
    }

    #[test]
    fn setup_errors_are_not_recoverable() {
        let err = ObservatoryError::from(GraphError::Empty);
        assert!(!err.is_recoverable());
        assert!(!ObservatoryError::LockPoisoned.is_recoverable());
        assert!(
            ObservatoryError::NonMonotonicTime {
                current: 5.0,
                requested: 4.0,
            }
            .is_recoverable()
        );
    }
}
