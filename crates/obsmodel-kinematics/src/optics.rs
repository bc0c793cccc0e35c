//! Active optics correction delays.
//!
//! After an altitude change the mirror support forces and hexapods need
//! updating. Two corrections apply:
//!
//! - **Open loop** -- a lookup-table update, linear in the altitude change.
//! - **Closed loop** -- a wavefront-sensing iteration, stepped by how far
//!   the telescope moved in altitude.
//!
//! Every input here is an altitude distance in degrees. The model never
//! converts units; callers pass the degree difference they already have.

use serde::{Deserialize, Serialize};

/// How a distance sitting exactly on a table boundary is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosedLoopEdge {
    /// A range covers `(lower, upper]`: the smallest upper bound that is
    /// `>=` the distance selects the delay.
    #[default]
    UpperInclusive,
    /// A range covers `[lower, upper)`. Distances below the first bound get
    /// no correction.
    LowerInclusive,
}

/// Errors from validating the optics tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpticsError {
    /// The open-loop slope was negative or not finite.
    #[error("open-loop slope must be non-negative and finite (got {slope})")]
    InvalidSlope {
        /// The rejected slope in s/deg.
        slope: f64,
    },

    /// The delay table was empty.
    #[error("closed-loop delay table is empty")]
    EmptyTable,

    /// The limit table does not have exactly one more entry than the delays.
    #[error("closed-loop table needs {expected} altitude limits for {delays} delays (got {limits})")]
    TableLength {
        /// Number of delay entries.
        delays: usize,
        /// Number of limits required.
        expected: usize,
        /// Number of limits supplied.
        limits: usize,
    },

    /// Limits were negative or not strictly increasing.
    #[error("closed-loop altitude limit {index} ({value}) must be non-negative and above its predecessor")]
    NonMonotonicLimit {
        /// Position in the limit table.
        index: usize,
        /// The offending limit in degrees.
        value: f64,
    },

    /// A delay was negative or not finite.
    #[error("closed-loop delay {index} must be non-negative and finite (got {value})")]
    InvalidDelay {
        /// Position in the delay table.
        index: usize,
        /// The offending delay in seconds.
        value: f64,
    },
}

/// Open- and closed-loop delay model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpticsCorrectionModel {
    open_loop_slope: f64,
    limits: Vec<f64>,
    delays: Vec<f64>,
    edge: ClosedLoopEdge,
}

impl OpticsCorrectionModel {
    /// Validate and build the model.
    ///
    /// `limits` holds `delays.len() + 1` strictly increasing altitude
    /// distances: `delays[k]` applies between `limits[k]` and `limits[k + 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`OpticsError`] when either table is malformed.
    pub fn new(
        open_loop_slope: f64,
        limits: Vec<f64>,
        delays: Vec<f64>,
        edge: ClosedLoopEdge,
    ) -> Result<Self, OpticsError> {
        if !(open_loop_slope.is_finite() && open_loop_slope >= 0.0) {
            return Err(OpticsError::InvalidSlope {
                slope: open_loop_slope,
            });
        }
        if delays.is_empty() {
            return Err(OpticsError::EmptyTable);
        }
        let expected = delays.len().saturating_add(1);
        if limits.len() != expected {
            return Err(OpticsError::TableLength {
                delays: delays.len(),
                expected,
                limits: limits.len(),
            });
        }

        let mut previous: Option<f64> = None;
        for (index, &value) in limits.iter().enumerate() {
            let ordered = previous.is_none_or(|p| value > p);
            if !(value.is_finite() && value >= 0.0 && ordered) {
                return Err(OpticsError::NonMonotonicLimit { index, value });
            }
            previous = Some(value);
        }
        if let Some((index, &value)) = delays
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d < 0.0)
        {
            return Err(OpticsError::InvalidDelay { index, value });
        }

        Ok(Self {
            open_loop_slope,
            limits,
            delays,
            edge,
        })
    }

    /// Seconds per degree of altitude change for the open-loop update.
    pub const fn open_loop_slope(&self) -> f64 {
        self.open_loop_slope
    }

    /// Boundary rule in use.
    pub const fn edge(&self) -> ClosedLoopEdge {
        self.edge
    }

    /// Open-loop delay for an altitude change of `alt_distance` degrees.
    pub const fn open_loop_delay(&self, alt_distance: f64) -> f64 {
        self.open_loop_slope * alt_distance.abs()
    }

    /// Closed-loop delay for an altitude change of `alt_distance` degrees.
    pub fn closed_loop_delay(&self, alt_distance: f64) -> f64 {
        let distance = alt_distance.abs();
        let last = self.delays.last().copied().unwrap_or(0.0);
        let uppers = self.limits.iter().skip(1);

        match self.edge {
            ClosedLoopEdge::UpperInclusive => uppers
                .zip(&self.delays)
                .find(|(upper, _)| distance <= **upper)
                .map_or(last, |(_, delay)| *delay),
            ClosedLoopEdge::LowerInclusive => {
                let below_table = self.limits.first().is_some_and(|first| distance < *first);
                if below_table {
                    return 0.0;
                }
                self.limits
                    .iter()
                    .zip(uppers)
                    .zip(&self.delays)
                    .find(|((lower, upper), _)| **lower <= distance && distance < **upper)
                    .map_or(last, |(_, delay)| *delay)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn model(edge: ClosedLoopEdge) -> OpticsCorrectionModel {
        OpticsCorrectionModel::new(1.0 / 3.5, vec![0.0, 9.0, 90.0], vec![0.0, 20.0], edge).unwrap()
    }

    #[test]
    fn open_loop_uses_degrees_directly() {
        // A 10 deg altitude slew costs exactly ten slopes; any hidden
        // radian/degree conversion would be off by a factor of ~57.
        let optics = model(ClosedLoopEdge::default());
        let delay = optics.open_loop_delay(10.0);
        assert!((delay - 10.0 / 3.5).abs() < 1e-12);
        assert!((optics.open_loop_delay(-10.0) - delay).abs() < 1e-12);
    }

    #[test]
    fn closed_loop_steps_through_table() {
        let optics = model(ClosedLoopEdge::UpperInclusive);
        assert!(optics.closed_loop_delay(0.0).abs() < f64::EPSILON);
        assert!(optics.closed_loop_delay(5.0).abs() < f64::EPSILON);
        assert!((optics.closed_loop_delay(56.2556) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn beyond_last_limit_uses_last_delay() {
        for edge in [ClosedLoopEdge::UpperInclusive, ClosedLoopEdge::LowerInclusive] {
            let optics = model(edge);
            assert!((optics.closed_loop_delay(120.0) - 20.0).abs() < f64::EPSILON);
            assert!((optics.closed_loop_delay(90.0) - 20.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn boundary_inclusivity_is_selectable() {
        let upper = model(ClosedLoopEdge::UpperInclusive);
        let lower = model(ClosedLoopEdge::LowerInclusive);
        // 9 deg closes the first range under the upper rule and opens the
        // second range under the lower rule.
        assert!(upper.closed_loop_delay(9.0).abs() < f64::EPSILON);
        assert!((lower.closed_loop_delay(9.0) - 20.0).abs() < f64::EPSILON);
        assert!(lower.closed_loop_delay(8.999).abs() < f64::EPSILON);
        assert!((upper.closed_loop_delay(9.001) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lower_rule_gives_nothing_below_first_limit() {
        let optics =
            OpticsCorrectionModel::new(0.0, vec![2.0, 9.0], vec![5.0], ClosedLoopEdge::LowerInclusive).unwrap();
        assert!(optics.closed_loop_delay(1.0).abs() < f64::EPSILON);
        assert!((optics.closed_loop_delay(2.0) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_tables_are_rejected() {
        let err = OpticsCorrectionModel::new(0.3, vec![0.0, 9.0], vec![0.0, 20.0], ClosedLoopEdge::default())
            .unwrap_err();
        assert!(matches!(err, OpticsError::TableLength { expected: 3, limits: 2, .. }));

        let err = OpticsCorrectionModel::new(0.3, vec![0.0, 9.0, 9.0], vec![0.0, 20.0], ClosedLoopEdge::default())
            .unwrap_err();
        assert!(matches!(err, OpticsError::NonMonotonicLimit { index: 2, .. }));

        let err = OpticsCorrectionModel::new(-1.0, vec![0.0, 9.0], vec![0.0], ClosedLoopEdge::default())
            .unwrap_err();
        assert!(matches!(err, OpticsError::InvalidSlope { .. }));

        let err = OpticsCorrectionModel::new(0.3, vec![0.0], Vec::new(), ClosedLoopEdge::default()).unwrap_err();
        assert_eq!(err, OpticsError::EmptyTable);
    }
}
