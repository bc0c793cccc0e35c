//! Slew pricing: turn a start state and a destination state into activity
//! durations, then into a critical path.
//!
//! Each activity is priced independently from the axis models, the optics
//! tables and the camera timings. Only the graph combines them.

use obsmodel_kinematics::{FULL_TURN, KinematicAxis, Motion, OpticsCorrectionModel, RotatorOrientation};
use obsmodel_types::{ActivityKind, Filter};
use serde::Serialize;

use crate::config::{ConfigError, ObservatoryConfig};
use crate::error::ObservatoryError;
use crate::graph::{ActivityGraph, CriticalPath};
use crate::state::ObservatoryState;

/// Smallest axis displacement, in degrees, that counts as a move.
pub const MOTION_EPSILON: f64 = 1e-6;

/// Peak speed reached by each axis during a slew, deg/s, signed by
/// direction of travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeakSpeeds {
    /// Mount altitude.
    pub telalt: f64,
    /// Mount azimuth.
    pub telaz: f64,
    /// Rotator (largest leg when a filter change detours it).
    pub telrot: f64,
    /// Dome altitude.
    pub domalt: f64,
    /// Dome azimuth.
    pub domaz: f64,
}

/// A change of the in-beam filter made during a slew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterChange {
    /// Filter in the beam before the slew.
    pub from: Filter,
    /// Filter in the beam after the slew.
    pub to: Filter,
    /// Carousel filter exchanged out to make room for `to`, if any.
    pub exchanged: Option<Filter>,
}

/// Everything known about one slew.
#[derive(Debug, Clone, PartialEq)]
pub struct SlewReport {
    /// Epoch seconds when the slew starts.
    pub start: f64,
    /// Activity timings and the longest chain.
    pub critical_path: CriticalPath,
    /// Peak axis speeds.
    pub peak_speeds: PeakSpeeds,
    /// Filter change, when the slew makes one.
    pub filter_change: Option<FilterChange>,
    /// Orientation chosen by rotator resolution, when the rotator was
    /// resolved against a requested angle.
    pub orientation: Option<RotatorOrientation>,
}

impl SlewReport {
    /// Slew delay in seconds.
    pub const fn delay(&self) -> f64 {
        self.critical_path.total()
    }

    /// Epoch seconds when the slew ends.
    pub const fn end(&self) -> f64 {
        self.start + self.delay()
    }
}

/// Validated motion models and timings needed to price a slew.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SlewTimer {
    telescope_altitude: KinematicAxis,
    telescope_azimuth: KinematicAxis,
    rotator: KinematicAxis,
    dome_altitude: KinematicAxis,
    dome_azimuth: KinematicAxis,
    optics: OpticsCorrectionModel,
    graph: ActivityGraph,
    telescope_settle: f64,
    dome_settle: f64,
    readout: f64,
    filter_change: f64,
    field_of_view: f64,
}

impl SlewTimer {
    pub(crate) fn new(config: &ObservatoryConfig) -> Result<Self, ObservatoryError> {
        Ok(Self {
            telescope_altitude: config.telescope.altitude_axis().map_err(ConfigError::from)?,
            telescope_azimuth: config.telescope.azimuth_axis().map_err(ConfigError::from)?,
            rotator: config.rotator.axis().map_err(ConfigError::from)?,
            dome_altitude: config.dome.altitude_axis().map_err(ConfigError::from)?,
            dome_azimuth: config.dome.azimuth_axis().map_err(ConfigError::from)?,
            optics: config.optics_loop_corr.model().map_err(ConfigError::from)?,
            graph: ActivityGraph::new(config.slew.prerequisites())?,
            telescope_settle: config.telescope.settle_time,
            dome_settle: config.dome.settle_time,
            readout: config.camera.readout_time,
            filter_change: config.camera.filter_change_time,
            field_of_view: config.camera.field_of_view,
        })
    }

    pub(crate) const fn graph(&self) -> &ActivityGraph {
        &self.graph
    }

    /// Price a slew from `from` to `to`.
    ///
    /// `via` is an intermediate rotator angle the rotator must visit first,
    /// used for filter changes.
    pub(crate) fn price(
        &self,
        from: &ObservatoryState,
        to: &ObservatoryState,
        via: Option<f64>,
        filter_change: Option<FilterChange>,
        orientation: Option<RotatorOrientation>,
    ) -> SlewReport {
        let alt_distance = to.telalt - from.telalt;
        let az_distance = to.telaz - from.telaz;
        let dome_az_distance = to.domaz - from.domaz;

        let telalt = self.telescope_altitude.motion(alt_distance);
        let telaz = self.telescope_azimuth.motion(az_distance);
        let domalt = self.dome_altitude.motion(to.domalt - from.domalt);
        let domaz = self.dome_azimuth.motion(dome_az_distance);
        let telrot = match via {
            Some(stop) => {
                let first = self.rotator.motion(stop - from.telrot);
                let second = self.rotator.motion(to.telrot - stop);
                let peak = if second.peak_speed.abs() > first.peak_speed.abs() {
                    second.peak_speed
                } else {
                    first.peak_speed
                };
                Motion {
                    duration: first.duration + second.duration,
                    peak_speed: peak,
                }
            }
            None => self.rotator.motion(to.telrot - from.telrot),
        };

        let mount_moves = alt_distance.abs() + az_distance.abs() > MOTION_EPSILON;
        let dome_moves = dome_az_distance.abs() > MOTION_EPSILON;

        let critical_path = self.graph.evaluate(|activity| match activity {
            ActivityKind::TelAlt => telalt.duration,
            ActivityKind::TelAz => telaz.duration,
            ActivityKind::TelRot => telrot.duration,
            ActivityKind::TelSettle if mount_moves => self.telescope_settle,
            ActivityKind::TelOpticsOpenLoop => self.optics.open_loop_delay(alt_distance),
            ActivityKind::TelOpticsClosedLoop => self.optics.closed_loop_delay(alt_distance),
            ActivityKind::DomAlt => domalt.duration,
            ActivityKind::DomAz => domaz.duration,
            ActivityKind::DomAzSettle if dome_moves => self.dome_settle,
            ActivityKind::Filter if filter_change.is_some() => self.filter_change,
            ActivityKind::Readout => self.readout,
            ActivityKind::TelSettle
            | ActivityKind::DomAzSettle
            | ActivityKind::Filter
            | ActivityKind::Exposures => 0.0,
        });

        SlewReport {
            start: from.time,
            critical_path,
            peak_speeds: PeakSpeeds {
                telalt: telalt.peak_speed,
                telaz: telaz.peak_speed,
                telrot: telrot.peak_speed,
                domalt: domalt.peak_speed,
                domaz: domaz.peak_speed,
            },
            filter_change,
            orientation,
        }
    }
}

/// Altitude and azimuth offsets, in degrees, of one candidate pointing
/// from the current pointing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Offset {
    pub(crate) alt: f64,
    pub(crate) az: f64,
}

impl Offset {
    /// Offsets between two sky positions, azimuth taken the short way round.
    pub(crate) const fn between(from_alt: f64, from_az: f64, to_alt: f64, to_az: f64) -> Self {
        let az = (to_az - from_az).abs();
        Self {
            alt: (to_alt - from_alt).abs(),
            az: az.min((az - FULL_TURN).abs()),
        }
    }
}

impl SlewTimer {
    /// Closed-form slew estimate that skips the activity graph.
    ///
    /// The mount and dome move concurrently with symmetric ramps, the
    /// rotator and cable wrap are ignored, and readout puts a floor under
    /// the mount time. With `lax_dome` the dome creeps with the field in its
    /// slit and needs no azimuth settle.
    pub(crate) fn approximate(&self, offset: Offset, filter_change: bool, lax_dome: bool) -> f64 {
        let open_loop = self.optics.open_loop_delay(offset.alt);
        let mut mount = self
            .telescope_altitude
            .uniform_time(offset.alt)
            .max(self.telescope_azimuth.uniform_time(offset.az))
            + open_loop;
        if offset.alt + offset.az > MOTION_EPSILON {
            mount += (self.telescope_settle - open_loop).max(0.0);
        }
        let mount = mount.max(self.readout);

        let dome = if lax_dome {
            self.creeping_dome(offset)
        } else {
            let altitude = self.dome_altitude.uniform_time(offset.alt);
            let azimuth = self.dome_azimuth.uniform_time(offset.az);
            let azimuth = if offset.az > MOTION_EPSILON { azimuth + self.dome_settle } else { azimuth };
            altitude.max(azimuth)
        };

        let mut delay = mount.max(dome);
        if filter_change {
            delay = delay.max(self.filter_change);
        }
        delay + self.optics.closed_loop_delay(offset.alt)
    }

    /// Dome time when the field only has to fit in the slit.
    ///
    /// The slit is half a field wide, so the dome lines up the field centre
    /// along one direction and travels half a field further along the
    /// other. The cheaper of the two alignments wins.
    fn creeping_dome(&self, offset: Offset) -> f64 {
        let fov = self.field_of_view;
        if offset.alt.powi(2) + offset.az.powi(2) < fov.powi(2) {
            return 0.0;
        }
        let overshoot = fov - fov / 2.0;
        let alt_speed = self.dome_altitude.params().max_speed;
        let az_speed = self.dome_azimuth.params().max_speed;
        let centred_alt = (offset.alt / alt_speed).max((offset.az + overshoot) / az_speed);
        let centred_az = ((offset.alt + overshoot) / alt_speed).max(offset.az / az_speed);
        centred_alt.min(centred_az)
    }
}
