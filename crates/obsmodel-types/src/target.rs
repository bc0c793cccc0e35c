//! Scheduler targets and completed observation records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::filter::Filter;

/// Errors raised while constructing a [`Target`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TargetError {
    /// A sky coordinate was NaN or infinite.
    #[error("target {id}: {field} must be finite (got {value})")]
    NonFiniteCoordinate {
        /// Target identifier.
        id: u64,
        /// Name of the offending coordinate.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Declination lies outside `[-pi/2, pi/2]`.
    #[error("target {id}: declination {dec} rad is outside [-pi/2, pi/2]")]
    DeclinationOutOfRange {
        /// Target identifier.
        id: u64,
        /// The rejected declination in radians.
        dec: f64,
    },

    /// The exposure sequence was empty.
    #[error("target {id}: at least one exposure is required")]
    NoExposures {
        /// Target identifier.
        id: u64,
    },

    /// An exposure duration was negative or not finite.
    #[error("target {id}: exposure {index} has invalid duration {seconds}")]
    InvalidExposure {
        /// Target identifier.
        id: u64,
        /// Position within the exposure sequence.
        index: usize,
        /// The rejected duration in seconds.
        seconds: f64,
    },
}

/// A sky position the scheduler wants observed.
///
/// Coordinates are stored in radians. A target is validated once at
/// construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    id: u64,
    filter: Filter,
    ra: f64,
    dec: f64,
    ang: f64,
    exposure_times: Vec<f64>,
}

impl Target {
    /// Build a target from radian coordinates.
    ///
    /// `ang` is the requested sky position angle of the camera.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError`] for non-finite coordinates, a declination past
    /// the poles, or an empty/invalid exposure sequence.
    pub fn new(
        id: u64,
        filter: Filter,
        ra: f64,
        dec: f64,
        ang: f64,
        exposure_times: Vec<f64>,
    ) -> Result<Self, TargetError> {
        for (field, value) in [("ra", ra), ("dec", dec), ("ang", ang)] {
            if !value.is_finite() {
                return Err(TargetError::NonFiniteCoordinate { id, field, value });
            }
        }
        if dec.abs() > core::f64::consts::FRAC_PI_2 {
            return Err(TargetError::DeclinationOutOfRange { id, dec });
        }
        if exposure_times.is_empty() {
            return Err(TargetError::NoExposures { id });
        }
        if let Some((index, &seconds)) = exposure_times
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s < 0.0)
        {
            return Err(TargetError::InvalidExposure { id, index, seconds });
        }

        Ok(Self {
            id,
            filter,
            ra,
            dec,
            ang,
            exposure_times,
        })
    }

    /// Build a target from degree coordinates.
    ///
    /// # Errors
    ///
    /// Same as [`Target::new`].
    pub fn from_degrees(
        id: u64,
        filter: Filter,
        ra_deg: f64,
        dec_deg: f64,
        ang_deg: f64,
        exposure_times: Vec<f64>,
    ) -> Result<Self, TargetError> {
        Self::new(
            id,
            filter,
            ra_deg.to_radians(),
            dec_deg.to_radians(),
            ang_deg.to_radians(),
            exposure_times,
        )
    }

    /// Scheduler-assigned identifier.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Requested filter band.
    pub const fn filter(&self) -> Filter {
        self.filter
    }

    /// Right ascension in radians.
    pub const fn ra(&self) -> f64 {
        self.ra
    }

    /// Declination in radians.
    pub const fn dec(&self) -> f64 {
        self.dec
    }

    /// Sky position angle hint in radians.
    pub const fn ang(&self) -> f64 {
        self.ang
    }

    /// Exposure durations in seconds, in shutter order.
    pub fn exposure_times(&self) -> &[f64] {
        &self.exposure_times
    }

    /// Number of exposures in the visit.
    pub fn num_exposures(&self) -> usize {
        self.exposure_times.len()
    }

    /// Sum of all exposure durations in seconds.
    pub fn total_exposure_time(&self) -> f64 {
        self.exposure_times.iter().sum()
    }
}

/// A target as actually observed.
///
/// Angles are in degrees, times in epoch seconds. `start` is the moment the
/// slew completed and the first exposure began; `end` is when the last
/// exposure finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    /// The observed target.
    pub target: Target,
    /// Achieved altitude.
    pub alt: f64,
    /// Achieved sky azimuth in `[0, 360)`.
    pub az: f64,
    /// Achieved rotator mechanical angle.
    pub rot: f64,
    /// Parallactic angle at the start of the visit.
    pub pa: f64,
    /// Slew delay that preceded the visit, in seconds.
    pub slew_delay: f64,
    /// Visit start, epoch seconds.
    pub start: f64,
    /// Visit end, epoch seconds.
    pub end: f64,
}

impl ObservationRecord {
    /// Elapsed time on target in seconds.
    pub const fn visit_duration(&self) -> f64 {
        self.end - self.start
    }

    /// Visit start as a UTC datetime, if representable.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.start)
    }

    /// Visit end as a UTC datetime, if representable.
    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.end)
    }
}

/// Convert fractional epoch seconds to a UTC datetime with microsecond
/// resolution.
pub fn epoch_to_utc(epoch: f64) -> Option<DateTime<Utc>> {
    let micros = (epoch * 1e6).round();
    // i64 microseconds cover roughly +/- 292,000 years.
    if !micros.is_finite() || micros.abs() >= 9.0e18 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let micros = micros as i64;
    DateTime::from_timestamp_micros(micros)
}
