//! Angle wrap helpers for cable-wrapped azimuth and the camera rotator.
//!
//! All angles are in degrees. Mechanical axes live on an unwrapped range
//! (azimuth may span more than a full turn); sky angles live in `[0, 360)`.
//! Resolution picks the mechanical representative of a sky angle, it never
//! clamps one onto a limit.

/// Degrees in a full turn.
pub const FULL_TURN: f64 = 360.0;

/// Degrees in half a turn.
pub const HALF_TURN: f64 = 180.0;

/// Slack allowed when testing a representative against a range edge.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Errors from resolving a sky angle onto a mechanical range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AngleError {
    /// No representative of the azimuth lies inside the cable-wrap range.
    #[error("azimuth {target:.3} deg has no representative in [{min:.3}, {max:.3}]")]
    UnreachableAzimuth {
        /// Requested azimuth in degrees.
        target: f64,
        /// Lower cable-wrap limit.
        min: f64,
        /// Upper cable-wrap limit.
        max: f64,
    },

    /// Neither the North-up nor the North-down angle fits the rotator range.
    #[error("rotator angle {target:.3} deg is unreachable in either orientation within [{min:.3}, {max:.3}]")]
    UnreachableRotator {
        /// Requested (North-up) rotator angle in degrees.
        target: f64,
        /// Lower rotator limit.
        min: f64,
        /// Upper rotator limit.
        max: f64,
    },
}

/// Which way up the camera ends up after rotator resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotatorOrientation {
    /// The requested angle itself was reachable.
    NorthUp,
    /// The requested angle plus half a turn was used instead.
    NorthDown,
}

/// Wrap an angle into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_TURN);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= FULL_TURN { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `current` to `target`, in `(-180, 180]`.
///
/// An exact half turn resolves to the positive direction.
pub fn shortest_distance(target: f64, current: f64) -> f64 {
    let clockwise = normalize_degrees(target - current);
    if clockwise > HALF_TURN {
        clockwise - FULL_TURN
    } else {
        clockwise
    }
}

/// The angle equivalent to `target` that is nearest to `current`, ignoring
/// any travel limits.
pub fn closest_angle(target: f64, current: f64) -> f64 {
    current + shortest_distance(target, current)
}

/// The representative of `target` (modulo a full turn) inside `[min, max]`
/// nearest to `current`, or `None` when the range holds no representative.
///
/// Ties between two equally distant representatives go to the larger one,
/// which matches the positive direction chosen by [`shortest_distance`].
pub fn closest_representative(target: f64, current: f64, min: f64, max: f64) -> Option<f64> {
    if !(target.is_finite() && current.is_finite() && min <= max) {
        return None;
    }

    let mut candidate = min + normalize_degrees(target - min);
    let mut best: Option<(f64, f64)> = None;
    while candidate <= max + EDGE_TOLERANCE {
        let angle = candidate.min(max);
        let distance = (angle - current).abs();
        let better = best.is_none_or(|(_, best_distance)| distance <= best_distance + EDGE_TOLERANCE);
        if better {
            best = Some((angle, distance));
        }
        candidate += FULL_TURN;
    }
    best.map(|(angle, _)| angle)
}

/// Resolve a sky azimuth onto the cable-wrapped mount range.
///
/// # Errors
///
/// Returns [`AngleError::UnreachableAzimuth`] when no representative of
/// `target` lies inside `[min, max]`.
pub fn resolve_azimuth(target: f64, current: f64, min: f64, max: f64) -> Result<f64, AngleError> {
    closest_representative(target, current, min, max)
        .ok_or(AngleError::UnreachableAzimuth { target, min, max })
}

/// Resolve a desired rotator angle, falling back to North-down.
///
/// The North-up angle is used when any representative of it fits the range;
/// otherwise the angle half a turn away is tried.
///
/// # Errors
///
/// Returns [`AngleError::UnreachableRotator`] when neither orientation fits.
pub fn resolve_rotator(
    target: f64,
    current: f64,
    min: f64,
    max: f64,
) -> Result<(f64, RotatorOrientation), AngleError> {
    if let Some(angle) = closest_representative(target, current, min, max) {
        return Ok((angle, RotatorOrientation::NorthUp));
    }
    closest_representative(target + HALF_TURN, current, min, max)
        .map(|angle| (angle, RotatorOrientation::NorthDown))
        .ok_or(AngleError::UnreachableRotator { target, min, max })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn normalize_wraps_into_half_open_turn() {
        assert_close(normalize_degrees(-90.0), 270.0);
        assert_close(normalize_degrees(720.0), 0.0);
        assert_close(normalize_degrees(359.5), 359.5);
        assert!(normalize_degrees(-1e-18) < FULL_TURN);
    }

    #[test]
    fn shortest_distance_prefers_positive_half_turn() {
        assert_close(shortest_distance(180.0, 0.0), 180.0);
        assert_close(shortest_distance(350.0, 10.0), -20.0);
        assert_close(shortest_distance(10.0, 350.0), 20.0);
    }

    #[test]
    fn unlimited_closest_angle_follows_short_way() {
        assert_close(closest_angle(-10.0, 0.0), -10.0);
        assert_close(closest_angle(270.0, 0.0), -90.0);
        assert_close(closest_angle(90.0, 400.0), 450.0);
    }

    #[test]
    fn cable_wrap_270_uses_the_wrap_when_it_is_shorter() {
        assert_close(resolve_azimuth(-90.0, 180.0, -270.0, 270.0).unwrap(), 270.0);
        assert_close(resolve_azimuth(90.0, -180.0, -270.0, 270.0).unwrap(), -270.0);
        assert_close(resolve_azimuth(0.0, 180.0, -270.0, 270.0).unwrap(), 0.0);
        assert_close(resolve_azimuth(200.0, -100.0, -270.0, 270.0).unwrap(), -160.0);
        assert_close(resolve_azimuth(180.0, 0.0, -270.0, 270.0).unwrap(), 180.0);
    }

    #[test]
    fn azimuth_result_always_inside_limits() {
        let (min, max) = (-270.0, 270.0);
        let mut current = -265.0;
        while current <= 265.0 {
            let mut target = 0.0;
            while target < 360.0 {
                let az = resolve_azimuth(target, current, min, max).unwrap();
                assert!((min..=max).contains(&az));
                assert_close(normalize_degrees(az), target);
                target += 17.0;
            }
            current += 35.0;
        }
    }

    #[test]
    fn narrow_azimuth_range_reports_unreachable() {
        let err = resolve_azimuth(200.0, 0.0, -90.0, 90.0).unwrap_err();
        assert!(matches!(err, AngleError::UnreachableAzimuth { .. }));
    }

    #[test]
    fn rotator_prefers_north_up_when_reachable() {
        let (angle, orientation) = resolve_rotator(45.0, 0.0, -90.0, 90.0).unwrap();
        assert_close(angle, 45.0);
        assert_eq!(orientation, RotatorOrientation::NorthUp);

        let (angle, _) = resolve_rotator(300.0, 0.0, -90.0, 90.0).unwrap();
        assert_close(angle, -60.0);
    }

    #[test]
    fn rotator_falls_back_to_north_down() {
        let (angle, orientation) = resolve_rotator(232.821, 0.0, -90.0, 90.0).unwrap();
        assert_close(angle, 52.821);
        assert_eq!(orientation, RotatorOrientation::NorthDown);

        let (angle, orientation) = resolve_rotator(180.0, 0.0, -90.0, 90.0).unwrap();
        assert_close(angle, 0.0);
        assert_eq!(orientation, RotatorOrientation::NorthDown);
    }

    #[test]
    fn rotator_range_too_narrow_for_either_orientation() {
        let err = resolve_rotator(60.0, 0.0, -10.0, 10.0).unwrap_err();
        assert!(matches!(err, AngleError::UnreachableRotator { .. }));
    }
}
