//! Velocity-profile motion model for a single degree of freedom.
//!
//! Each axis accelerates at a constant rate, cruises at its maximum speed
//! if the distance allows it, and decelerates at a constant rate to rest:
//!
//! - **Trapezoid** -- the move is long enough to reach `max_speed`.
//! - **Triangle** -- the move ends before `max_speed` is reached; the axis
//!   turns around at a lower peak speed.
//!
//! Dome axes additionally ignore the first `free_range` degrees of any move:
//! the slit is wide enough that small offsets need no motion at all.

use serde::Serialize;

/// The five motorized axes of the observatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Axis {
    /// Telescope mount altitude.
    TelescopeAltitude,
    /// Telescope mount azimuth.
    TelescopeAzimuth,
    /// Camera rotator.
    Rotator,
    /// Dome shutter altitude.
    DomeAltitude,
    /// Dome azimuth.
    DomeAzimuth,
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TelescopeAltitude => write!(f, "telescope altitude"),
            Self::TelescopeAzimuth => write!(f, "telescope azimuth"),
            Self::Rotator => write!(f, "rotator"),
            Self::DomeAltitude => write!(f, "dome altitude"),
            Self::DomeAzimuth => write!(f, "dome azimuth"),
        }
    }
}

/// Errors from building a [`KinematicAxis`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AxisError {
    /// Speed, acceleration or deceleration was zero, negative or not finite.
    #[error("{axis}: {parameter} must be positive and finite (got {value})")]
    NonPositive {
        /// The axis being configured.
        axis: Axis,
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The free range was negative or not finite.
    #[error("{axis}: free range must be non-negative (got {value})")]
    NegativeFreeRange {
        /// The axis being configured.
        axis: Axis,
        /// The rejected value.
        value: f64,
    },
}

/// Kinematic limits of one axis. Speeds in deg/s, accelerations in deg/s^2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KinematicParams {
    /// Cruise speed.
    pub max_speed: f64,
    /// Acceleration from rest.
    pub accel: f64,
    /// Deceleration to rest.
    pub decel: f64,
    /// Distance covered at no cost before the axis has to move.
    pub free_range: f64,
}

impl KinematicParams {
    /// Limits for an axis without a free range.
    pub const fn new(max_speed: f64, accel: f64, decel: f64) -> Self {
        Self {
            max_speed,
            accel,
            decel,
            free_range: 0.0,
        }
    }

    /// Same limits with a free range.
    #[must_use]
    pub const fn with_free_range(mut self, free_range: f64) -> Self {
        self.free_range = free_range;
        self
    }
}

/// Result of planning one move.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Motion {
    /// Time from start to rest in seconds.
    pub duration: f64,
    /// Highest speed reached, signed by direction of travel.
    pub peak_speed: f64,
}

/// A validated single-axis motion model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KinematicAxis {
    axis: Axis,
    params: KinematicParams,
}

impl KinematicAxis {
    /// Validate `params` for `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError`] when a rate is not strictly positive or the
    /// free range is negative.
    pub fn new(axis: Axis, params: KinematicParams) -> Result<Self, AxisError> {
        for (parameter, value) in [
            ("max_speed", params.max_speed),
            ("accel", params.accel),
            ("decel", params.decel),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AxisError::NonPositive {
                    axis,
                    parameter,
                    value,
                });
            }
        }
        if !(params.free_range.is_finite() && params.free_range >= 0.0) {
            return Err(AxisError::NegativeFreeRange {
                axis,
                value: params.free_range,
            });
        }
        Ok(Self { axis, params })
    }

    /// Which axis this model describes.
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// The validated limits.
    pub const fn params(&self) -> &KinematicParams {
        &self.params
    }

    /// Distance consumed by a full ramp up to `max_speed` and back to rest.
    pub const fn ramp_distance(&self) -> f64 {
        let KinematicParams {
            max_speed: v,
            accel: a,
            decel: d,
            ..
        } = self.params;
        v * v / (2.0 * a) + v * v / (2.0 * d)
    }

    /// Seconds needed to cover an angular distance of `distance` degrees.
    ///
    /// Only the magnitude of `distance` matters.
    pub fn time_to_travel(&self, distance: f64) -> f64 {
        self.motion(distance).duration
    }

    /// Seconds to cover `distance` degrees when deceleration is taken equal
    /// to acceleration and the free range is ignored.
    ///
    /// This is the cheap estimate used when many candidates are priced at
    /// once; it matches [`Self::time_to_travel`] for symmetric axes without a
    /// free range.
    pub fn uniform_time(&self, distance: f64) -> f64 {
        let KinematicParams {
            max_speed: v, accel: a, ..
        } = self.params;
        let distance = distance.abs();
        let ramp = v * v / a;
        if distance < ramp {
            2.0 * (distance / a).sqrt()
        } else {
            2.0 * v / a + (distance - ramp) / v
        }
    }

    /// Plan a move of `distance` degrees (sign gives the direction).
    pub fn motion(&self, distance: f64) -> Motion {
        let KinematicParams {
            max_speed: v,
            accel: a,
            decel: d,
            free_range,
        } = self.params;

        let travel = (distance.abs() - free_range).max(0.0);
        if travel <= 0.0 {
            return Motion::default();
        }

        let (duration, peak) = if travel >= self.ramp_distance() {
            let cruise = travel - v * v / (2.0 * a) - v * v / (2.0 * d);
            (cruise / v + v / a + v / d, v)
        } else {
            let peak = (2.0 * travel * a * d / (a + d)).sqrt();
            (peak / a + peak / d, peak)
        };

        Motion {
            duration,
            peak_speed: peak.copysign(distance),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn telescope_altitude() -> KinematicAxis {
        KinematicAxis::new(Axis::TelescopeAltitude, KinematicParams::new(3.5, 3.5, 3.5)).unwrap()
    }

    fn dome_azimuth(free_range: f64) -> KinematicAxis {
        KinematicAxis::new(
            Axis::DomeAzimuth,
            KinematicParams::new(1.5, 0.75, 0.75).with_free_range(free_range),
        )
        .unwrap()
    }

    #[test]
    fn zero_distance_takes_zero_time() {
        let axis = telescope_altitude();
        assert!(axis.time_to_travel(0.0).abs() < f64::EPSILON);
        assert!(axis.motion(0.0).peak_speed.abs() < f64::EPSILON);
    }

    #[test]
    fn long_move_uses_trapezoid() {
        let axis = telescope_altitude();
        // Ramp covers 1.75 + 1.75 deg in 1 s + 1 s; the rest cruises at 3.5 deg/s.
        let expected = (56.2556 - 3.5) / 3.5 + 2.0;
        assert!((axis.time_to_travel(56.2556) - expected).abs() < 1e-9);
        let motion = axis.motion(-56.2556);
        assert!((motion.peak_speed + 3.5).abs() < 1e-12);
    }

    #[test]
    fn short_move_uses_triangle() {
        let axis = telescope_altitude();
        // Peak speed sqrt(2 * 1 * 3.5 * 3.5 / 7) = sqrt(3.5).
        let peak = 3.5_f64.sqrt();
        let motion = axis.motion(1.0);
        assert!((motion.peak_speed - peak).abs() < 1e-12);
        assert!((motion.duration - 2.0 * peak / 3.5).abs() < 1e-12);
    }

    #[test]
    fn trapezoid_and_triangle_agree_at_boundary() {
        let axis = KinematicAxis::new(Axis::Rotator, KinematicParams::new(3.5, 1.0, 2.0)).unwrap();
        let boundary = axis.ramp_distance();
        let below = axis.time_to_travel(boundary * (1.0 - 1e-12));
        let at = axis.time_to_travel(boundary);
        let v = 3.5;
        let triangle_at_boundary = v / 1.0 + v / 2.0;
        assert!((at - triangle_at_boundary).abs() < 1e-9);
        assert!((below - at).abs() < 1e-6);
    }

    #[test]
    fn travel_time_is_monotonic_in_distance() {
        let axis = KinematicAxis::new(Axis::TelescopeAzimuth, KinematicParams::new(7.0, 7.0, 5.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut distances: Vec<f64> = (0..500).map(|_| rng.random_range(0.0..540.0)).collect();
        distances.sort_by(f64::total_cmp);
        for pair in distances.windows(2) {
            if let [shorter, longer] = pair {
                assert!(axis.time_to_travel(*shorter) <= axis.time_to_travel(*longer));
            }
        }
    }

    #[test]
    fn free_range_is_subtracted_and_clamped() {
        let free = dome_azimuth(4.0);
        let fixed = dome_azimuth(0.0);
        assert!(free.time_to_travel(3.0).abs() < f64::EPSILON);
        assert!(free.time_to_travel(4.0).abs() < f64::EPSILON);
        assert!((free.time_to_travel(180.0) - fixed.time_to_travel(176.0)).abs() < 1e-12);
    }

    #[test]
    fn uniform_estimate_matches_symmetric_axes() {
        let axis = telescope_altitude();
        for distance in [0.0, 0.5, 3.5, 10.0, 56.2556] {
            assert!((axis.uniform_time(distance) - axis.time_to_travel(distance)).abs() < 1e-9);
        }
        // The estimate ignores the free range and the slower deceleration.
        let free = dome_azimuth(4.0);
        assert!((free.uniform_time(180.0) - 122.0).abs() < 1e-9);
        let skewed = KinematicAxis::new(Axis::Rotator, KinematicParams::new(3.5, 1.0, 0.5)).unwrap();
        assert!(skewed.uniform_time(30.0) < skewed.time_to_travel(30.0));
    }

    #[test]
    fn dome_half_turn_without_free_range() {
        // 177 deg cruising at 1.5 deg/s plus 2 s ramps at each end.
        let axis = dome_azimuth(0.0);
        assert!((axis.time_to_travel(180.0) - 122.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        let err = KinematicAxis::new(Axis::DomeAltitude, KinematicParams::new(1.75, 0.0, 0.875)).unwrap_err();
        assert_eq!(
            err,
            AxisError::NonPositive {
                axis: Axis::DomeAltitude,
                parameter: "accel",
                value: 0.0,
            }
        );
        let err = KinematicAxis::new(
            Axis::DomeAltitude,
            KinematicParams::new(1.75, 0.875, 0.875).with_free_range(-1.0),
        )
        .unwrap_err();
        assert!(matches!(err, AxisError::NegativeFreeRange { .. }));
    }
}
