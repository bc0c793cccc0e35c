//! Observing site: sidereal time and horizon/equatorial conversions.
//!
//! The model only needs three things from the site: local sidereal time,
//! and conversions between (ra, dec) and (alt, az) with the parallactic
//! angle. [`SiteService`] is the seam; [`ObservingSite`] is a built-in
//! implementation that ignores refraction, precession and nutation.
//!
//! Everything crossing this boundary is in radians. Azimuth is measured
//! from North through East.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Seconds per day.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Julian date of J2000.0.
const J2000_JD: f64 = 2_451_545.0;

/// Days per Julian century.
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Pointing in horizon coordinates, radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalPosition {
    /// Altitude above the horizon.
    pub alt: f64,
    /// Azimuth in `[0, 2pi)`.
    pub az: f64,
    /// Parallactic angle in `[0, 2pi)`.
    pub pa: f64,
}

/// Pointing in equatorial coordinates, radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquatorialPosition {
    /// Right ascension in `[0, 2pi)`.
    pub ra: f64,
    /// Declination.
    pub dec: f64,
    /// Parallactic angle in `[0, 2pi)`.
    pub pa: f64,
}

/// Astronomical services the observatory model depends on.
pub trait SiteService: Send + Sync {
    /// Local apparent sidereal time at `epoch` (Unix seconds), radians.
    fn local_sidereal_time(&self, epoch: f64) -> f64;

    /// Where `(ra, dec)` appears on the sky at `epoch`.
    fn radec_to_horizontal(&self, epoch: f64, ra: f64, dec: f64) -> HorizontalPosition;

    /// Which `(ra, dec)` sits at `(alt, az)` at `epoch`.
    fn horizontal_to_radec(&self, epoch: f64, alt: f64, az: f64) -> EquatorialPosition;
}

/// A geographic site using mean sidereal time and spherical trigonometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservingSite {
    /// Geodetic latitude in degrees, North positive.
    pub latitude: f64,
    /// Longitude in degrees, East positive.
    pub longitude: f64,
    /// Height above sea level in metres.
    pub height: f64,
}

impl Default for ObservingSite {
    fn default() -> Self {
        Self::lsst()
    }
}

impl ObservingSite {
    /// Cerro Pachon.
    pub const fn lsst() -> Self {
        Self {
            latitude: -30.2444,
            longitude: -70.7494,
            height: 2650.0,
        }
    }

    /// Greenwich mean sidereal time at `epoch` in degrees, not wrapped.
    ///
    /// IAU 1982 expression in the form published by the USNO.
    pub const fn greenwich_mean_sidereal_degrees(epoch: f64) -> f64 {
        let days = epoch / SECONDS_PER_DAY + UNIX_EPOCH_JD - J2000_JD;
        let centuries = days / DAYS_PER_CENTURY;
        280.460_618_37 + 360.985_647_366_29 * days + 0.000_387_933 * centuries * centuries
            - centuries * centuries * centuries / 38_710_000.0
    }

    const fn latitude_rad(&self) -> f64 {
        self.latitude.to_radians()
    }
}

impl SiteService for ObservingSite {
    fn local_sidereal_time(&self, epoch: f64) -> f64 {
        (Self::greenwich_mean_sidereal_degrees(epoch) + self.longitude)
            .to_radians()
            .rem_euclid(TAU)
    }

    fn radec_to_horizontal(&self, epoch: f64, ra: f64, dec: f64) -> HorizontalPosition {
        let phi = self.latitude_rad();
        let ha = self.local_sidereal_time(epoch) - ra;
        let (az, alt) = equatorial_to_horizontal(ha, dec, phi);
        HorizontalPosition {
            alt,
            az,
            pa: parallactic_angle(ha, dec, phi),
        }
    }

    fn horizontal_to_radec(&self, epoch: f64, alt: f64, az: f64) -> EquatorialPosition {
        let phi = self.latitude_rad();
        let (ha, dec) = horizontal_to_equatorial(az, alt, phi);
        EquatorialPosition {
            ra: wrap_turn(self.local_sidereal_time(epoch) - ha),
            dec,
            pa: parallactic_angle(ha, dec, phi),
        }
    }
}

/// Hour angle and declination to azimuth and altitude.
fn equatorial_to_horizontal(ha: f64, dec: f64, phi: f64) -> (f64, f64) {
    let (sh, ch) = ha.sin_cos();
    let (sd, cd) = dec.sin_cos();
    let (sp, cp) = phi.sin_cos();

    let x = -ch * cd * sp + sd * cp;
    let y = -sh * cd;
    let z = ch * cd * cp + sd * sp;

    let r = x.hypot(y);
    let az = if r > 0.0 { wrap_turn(y.atan2(x)) } else { 0.0 };
    (az, z.atan2(r))
}

/// Azimuth and altitude to hour angle and declination.
fn horizontal_to_equatorial(az: f64, alt: f64, phi: f64) -> (f64, f64) {
    let (sa, ca) = az.sin_cos();
    let (se, ce) = alt.sin_cos();
    let (sp, cp) = phi.sin_cos();

    let x = -ca * ce * sp + se * cp;
    let y = -sa * ce;
    let z = ca * ce * cp + se * sp;

    let r = x.hypot(y);
    let ha = if r > 0.0 { y.atan2(x) } else { 0.0 };
    (ha, z.atan2(r))
}

/// Angle between the direction to the pole and the zenith, in `[0, 2pi)`.
fn parallactic_angle(ha: f64, dec: f64, phi: f64) -> f64 {
    let cp = phi.cos();
    let sqsz = cp * ha.sin();
    let cqsz = phi.sin() * dec.cos() - cp * dec.sin() * ha.cos();
    // Exactly at the zenith the angle is undefined; take the meridian.
    let cqsz = if sqsz.abs() < f64::EPSILON && cqsz.abs() < f64::EPSILON {
        1.0
    } else {
        cqsz
    };
    wrap_turn(sqsz.atan2(cqsz))
}

fn wrap_turn(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}
