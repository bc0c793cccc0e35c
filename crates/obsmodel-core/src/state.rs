//! Observatory state: where every axis is, what is in the beam, and whether
//! the mount is tracking.
//!
//! All angles are degrees. Sky angles (`ra`, `az`, `pa`, `rot`, `ang`) are
//! wrapped into `[0, 360)`; mechanical angles (`telaz`, `telrot`, `domaz`)
//! keep their unwrapped value on the cable wrap.

use std::fmt;

use obsmodel_types::Filter;
use serde::Serialize;

/// Motion phase of the observatory.
///
/// Slewing and exposing are transient: the model passes through them inside
/// a single call and only reports them in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// At the park position, not tracking.
    Parked,
    /// Following a fixed (ra, dec) across the sky.
    Tracking,
    /// Holding a fixed (alt, az).
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parked => write!(f, "parked"),
            Self::Tracking => write!(f, "tracking"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Complete observatory state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservatoryState {
    /// Epoch seconds.
    pub time: f64,
    /// Right ascension of the pointing.
    pub ra: f64,
    /// Declination of the pointing.
    pub dec: f64,
    /// Sky position angle of the camera.
    pub ang: f64,
    /// Parallactic angle of the pointing.
    pub pa: f64,
    /// Altitude of the pointing.
    pub alt: f64,
    /// Azimuth of the pointing.
    pub az: f64,
    /// Rotator angle implied by `pa - ang`.
    pub rot: f64,
    /// Mount altitude.
    pub telalt: f64,
    /// Mount azimuth on the cable wrap.
    pub telaz: f64,
    /// Mechanical rotator angle.
    pub telrot: f64,
    /// Dome shutter altitude.
    pub domalt: f64,
    /// Dome azimuth, unwrapped.
    pub domaz: f64,
    /// Motion phase.
    pub phase: Phase,
    /// Filter in the beam.
    pub filter: Filter,
    /// Filters in the carousel.
    pub mounted: Vec<Filter>,
    /// Filters on the shelf.
    pub unmounted: Vec<Filter>,
}

impl ObservatoryState {
    /// Whether the mount follows the sky.
    pub fn tracking(&self) -> bool {
        self.phase == Phase::Tracking
    }

    /// Whether the observatory sits at its park position.
    pub fn parked(&self) -> bool {
        self.phase == Phase::Parked
    }

    /// Whether `filter` can be put in the beam without an exchange.
    pub fn is_mounted(&self, filter: Filter) -> bool {
        self.mounted.contains(&filter)
    }
}

impl fmt::Display for ObservatoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:.1} ra={:.3} dec={:.3} ang={:.3} filter={} track={} alt={:.3} az={:.3} pa={:.3} \
             rot={:.3} telaz={:.3} telrot={:.3} mounted=[{}] unmounted=[{}]",
            self.time,
            self.ra,
            self.dec,
            self.ang,
            self.filter,
            self.tracking(),
            self.alt,
            self.az,
            self.pa,
            self.rot,
            self.telaz,
            self.telrot,
            join(&self.mounted),
            join(&self.unmounted),
        )
    }
}

/// One end of one mount axis range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisLimit {
    /// Lowest mount altitude.
    AltitudeMin,
    /// Highest mount altitude.
    AltitudeMax,
    /// Lower end of the azimuth cable wrap.
    AzimuthMin,
    /// Upper end of the azimuth cable wrap.
    AzimuthMax,
    /// Lower rotator stop.
    RotatorMin,
    /// Upper rotator stop.
    RotatorMax,
}

/// How many times tracking ran into each axis limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LimitViolations {
    altitude_min: u64,
    altitude_max: u64,
    azimuth_min: u64,
    azimuth_max: u64,
    rotator_min: u64,
    rotator_max: u64,
}

impl LimitViolations {
    /// Count one more hit of `limit`.
    pub const fn record(&mut self, limit: AxisLimit) {
        let slot = self.slot(limit);
        *slot = slot.saturating_add(1);
    }

    /// Hits of `limit` so far.
    pub const fn count(&self, limit: AxisLimit) -> u64 {
        match limit {
            AxisLimit::AltitudeMin => self.altitude_min,
            AxisLimit::AltitudeMax => self.altitude_max,
            AxisLimit::AzimuthMin => self.azimuth_min,
            AxisLimit::AzimuthMax => self.azimuth_max,
            AxisLimit::RotatorMin => self.rotator_min,
            AxisLimit::RotatorMax => self.rotator_max,
        }
    }

    /// Hits of every limit together.
    pub const fn total(&self) -> u64 {
        self.altitude_min
            .saturating_add(self.altitude_max)
            .saturating_add(self.azimuth_min)
            .saturating_add(self.azimuth_max)
            .saturating_add(self.rotator_min)
            .saturating_add(self.rotator_max)
    }

    const fn slot(&mut self, limit: AxisLimit) -> &mut u64 {
        match limit {
            AxisLimit::AltitudeMin => &mut self.altitude_min,
            AxisLimit::AltitudeMax => &mut self.altitude_max,
            AxisLimit::AzimuthMin => &mut self.azimuth_min,
            AxisLimit::AzimuthMax => &mut self.azimuth_max,
            AxisLimit::RotatorMin => &mut self.rotator_min,
            AxisLimit::RotatorMax => &mut self.rotator_max,
        }
    }
}

fn join(filters: &[Filter]) -> String {
    filters
        .iter()
        .copied()
        .map(Filter::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_line_matches_format() {
        let state = ObservatoryState {
            time: 0.0,
            ra: 29.480_237,
            dec: -26.7444,
            ang: 180.0,
            pa: 180.0,
            alt: 86.5,
            az: 0.0,
            rot: 0.0,
            telalt: 86.5,
            telaz: 0.0,
            telrot: 0.0,
            domalt: 90.0,
            domaz: 0.0,
            phase: Phase::Parked,
            filter: Filter::R,
            mounted: vec![Filter::G, Filter::R, Filter::I, Filter::Z, Filter::Y],
            unmounted: vec![Filter::U],
        };
        assert_eq!(
            state.to_string(),
            "t=0.0 ra=29.480 dec=-26.744 ang=180.000 filter=r track=false alt=86.500 az=0.000 \
             pa=180.000 rot=0.000 telaz=0.000 telrot=0.000 mounted=[g,r,i,z,y] unmounted=[u]"
        );
        assert!(state.parked());
        assert!(!state.tracking());
        assert!(state.is_mounted(Filter::Y));
        assert!(!state.is_mounted(Filter::U));
    }

    #[test]
    fn limit_violations_count_per_limit() {
        let mut violations = LimitViolations::default();
        assert_eq!(violations.total(), 0);

        violations.record(AxisLimit::AltitudeMax);
        violations.record(AxisLimit::AltitudeMax);
        violations.record(AxisLimit::RotatorMin);

        assert_eq!(violations.count(AxisLimit::AltitudeMax), 2);
        assert_eq!(violations.count(AxisLimit::RotatorMin), 1);
        assert_eq!(violations.count(AxisLimit::AzimuthMin), 0);
        assert_eq!(violations.total(), 3);
    }
}
