//! Typed configuration for the observatory model.
//!
//! The structure mirrors the observatory configuration document: one
//! section per subsystem, keys spelled exactly as in the document. Every
//! section and every reference key is required; only the dome free ranges,
//! the closed-loop edge rule and the camera field of view may be omitted.
//! Unknown keys are rejected so that a misspelled parameter is reported
//! rather than ignored.
//!
//! [`ObservatoryConfig::default`] builds the reference configuration in
//! code. Deserialization checks shape and presence;
//! [`ObservatoryConfig::validate`] checks the values, the relations between
//! sections and the prerequisite graph.

use std::collections::BTreeMap;

use obsmodel_kinematics::{
    Axis, AxisError, ClosedLoopEdge, FULL_TURN, KinematicAxis, KinematicParams, OpticsCorrectionModel, OpticsError,
};
use obsmodel_ledger::{BudgetWindow, FilterChangeLedger, LedgerError};
use obsmodel_types::{ActivityKind, Filter};
use serde::Deserialize;

use crate::graph::{ActivityGraph, GraphError};

/// Errors raised while parsing or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An axis has impossible kinematics.
    #[error("invalid kinematics: {source}")]
    Axis {
        /// The underlying axis error.
        #[from]
        source: AxisError,
    },

    /// The active optics tables are malformed.
    #[error("invalid optics tables: {source}")]
    Optics {
        /// The underlying optics error.
        #[from]
        source: OpticsError,
    },

    /// A filter change budget is malformed.
    #[error("invalid filter change budget: {source}")]
    Budget {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// The slew prerequisites do not form a DAG.
    #[error("invalid slew prerequisites: {source}")]
    Graph {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },

    /// A position range is inverted, too narrow or outside physical limits.
    #[error("{section}.{parameter}: invalid range [{min}, {max}]: {reason}")]
    InvalidRange {
        /// Configuration section.
        section: &'static str,
        /// Key pair being checked.
        parameter: &'static str,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A single value falls outside the range it must lie in.
    #[error("{section}.{parameter} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Configuration section.
        section: &'static str,
        /// Key being checked.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
        /// Lowest allowed value.
        min: f64,
        /// Highest allowed value.
        max: f64,
    },

    /// A duration was negative or not finite.
    #[error("{section}.{parameter} must be a non-negative number of seconds (got {value})")]
    NegativeDuration {
        /// Configuration section.
        section: &'static str,
        /// Key being checked.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The filter lists are inconsistent.
    #[error("camera filters: {reason}")]
    Filters {
        /// What is wrong with them.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level observatory configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservatoryConfig {
    /// Telescope mount limits and kinematics.
    pub telescope: TelescopeConfig,

    /// Dome kinematics.
    pub dome: DomeConfig,

    /// Camera rotator limits, kinematics and policy.
    pub rotator: RotatorConfig,

    /// Camera timings, filter budgets and filter inventory.
    pub camera: CameraConfig,

    /// Active optics correction tables.
    pub optics_loop_corr: OpticsLoopCorrConfig,

    /// Slew activity prerequisites.
    pub slew: SlewConfig,

    /// Park position.
    pub park: ParkConfig,
}

impl ObservatoryConfig {
    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value and every cross-section relation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.telescope.validate()?;
        self.dome.validate()?;
        self.rotator.validate()?;
        self.camera.validate()?;
        self.optics_loop_corr.model()?;
        ActivityGraph::new(self.slew.prerequisites())?;
        self.validate_park()
    }

    fn validate_park(&self) -> Result<(), ConfigError> {
        let park = &self.park;
        let telescope = &self.telescope;
        let rotator = &self.rotator;
        let checks = [
            (
                "telescope_altitude",
                park.telescope_altitude,
                telescope.altitude_minpos,
                telescope.altitude_maxpos,
            ),
            (
                "telescope_azimuth",
                park.telescope_azimuth,
                telescope.azimuth_minpos,
                telescope.azimuth_maxpos,
            ),
            ("telescope_rotator", park.telescope_rotator, rotator.minpos, rotator.maxpos),
            ("dome_altitude", park.dome_altitude, 0.0, 90.0),
            ("dome_azimuth", park.dome_azimuth, -FULL_TURN, FULL_TURN),
        ];
        for (parameter, value, min, max) in checks {
            within("park", parameter, value, min, max)?;
        }
        if !self.camera.filter_mounted.contains(&park.filter_position) {
            return Err(ConfigError::Filters {
                reason: format!("park filter {} is not mounted", park.filter_position),
            });
        }
        Ok(())
    }
}

/// Telescope mount section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelescopeConfig {
    /// Lowest altitude in degrees.
    pub altitude_minpos: f64,

    /// Highest altitude in degrees.
    pub altitude_maxpos: f64,

    /// Lower cable-wrap azimuth limit in degrees.
    pub azimuth_minpos: f64,

    /// Upper cable-wrap azimuth limit in degrees.
    pub azimuth_maxpos: f64,

    /// Altitude cruise speed in deg/s.
    pub altitude_maxspeed: f64,

    /// Altitude acceleration in deg/s^2.
    pub altitude_accel: f64,

    /// Altitude deceleration in deg/s^2.
    pub altitude_decel: f64,

    /// Azimuth cruise speed in deg/s.
    pub azimuth_maxspeed: f64,

    /// Azimuth acceleration in deg/s^2.
    pub azimuth_accel: f64,

    /// Azimuth deceleration in deg/s^2.
    pub azimuth_decel: f64,

    /// Settling time after an altitude or azimuth move, in seconds.
    pub settle_time: f64,
}

impl Default for TelescopeConfig {
    fn default() -> Self {
        Self {
            altitude_minpos: default_altitude_minpos(),
            altitude_maxpos: default_altitude_maxpos(),
            azimuth_minpos: default_azimuth_minpos(),
            azimuth_maxpos: default_azimuth_maxpos(),
            altitude_maxspeed: default_telescope_altitude_rate(),
            altitude_accel: default_telescope_altitude_rate(),
            altitude_decel: default_telescope_altitude_rate(),
            azimuth_maxspeed: default_telescope_azimuth_rate(),
            azimuth_accel: default_telescope_azimuth_rate(),
            azimuth_decel: default_telescope_azimuth_rate(),
            settle_time: default_telescope_settle_time(),
        }
    }
}

impl TelescopeConfig {
    /// Motion model for the altitude axis.
    pub fn altitude_axis(&self) -> Result<KinematicAxis, AxisError> {
        KinematicAxis::new(
            Axis::TelescopeAltitude,
            KinematicParams::new(self.altitude_maxspeed, self.altitude_accel, self.altitude_decel),
        )
    }

    /// Motion model for the azimuth axis.
    pub fn azimuth_axis(&self) -> Result<KinematicAxis, AxisError> {
        KinematicAxis::new(
            Axis::TelescopeAzimuth,
            KinematicParams::new(self.azimuth_maxspeed, self.azimuth_accel, self.azimuth_decel),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let altitude_ok = self.altitude_minpos < self.altitude_maxpos
            && self.altitude_minpos >= 0.0
            && self.altitude_maxpos <= 90.0;
        if !altitude_ok {
            return Err(ConfigError::InvalidRange {
                section: "telescope",
                parameter: "altitude_minpos/altitude_maxpos",
                min: self.altitude_minpos,
                max: self.altitude_maxpos,
                reason: "must be increasing and inside [0, 90]",
            });
        }
        // Every sky azimuth needs a representative on the cable wrap.
        let span = self.azimuth_maxpos - self.azimuth_minpos;
        if !(span.is_finite() && span >= FULL_TURN) {
            return Err(ConfigError::InvalidRange {
                section: "telescope",
                parameter: "azimuth_minpos/azimuth_maxpos",
                min: self.azimuth_minpos,
                max: self.azimuth_maxpos,
                reason: "must span at least a full turn",
            });
        }
        non_negative("telescope", "settle_time", self.settle_time)?;
        self.altitude_axis()?;
        self.azimuth_axis()?;
        Ok(())
    }
}

/// Dome section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomeConfig {
    /// Shutter altitude cruise speed in deg/s.
    pub altitude_maxspeed: f64,

    /// Shutter altitude acceleration in deg/s^2.
    pub altitude_accel: f64,

    /// Shutter altitude deceleration in deg/s^2.
    pub altitude_decel: f64,

    /// Altitude offset the slit absorbs without moving, in degrees.
    #[serde(default)]
    pub altitude_freerange: f64,

    /// Azimuth cruise speed in deg/s.
    pub azimuth_maxspeed: f64,

    /// Azimuth acceleration in deg/s^2.
    pub azimuth_accel: f64,

    /// Azimuth deceleration in deg/s^2.
    pub azimuth_decel: f64,

    /// Azimuth offset the slit absorbs without moving, in degrees.
    #[serde(default)]
    pub azimuth_freerange: f64,

    /// Settling time after an azimuth move, in seconds.
    pub settle_time: f64,
}

impl Default for DomeConfig {
    fn default() -> Self {
        Self {
            altitude_maxspeed: default_dome_altitude_maxspeed(),
            altitude_accel: default_dome_altitude_rate(),
            altitude_decel: default_dome_altitude_rate(),
            altitude_freerange: 0.0,
            azimuth_maxspeed: default_dome_azimuth_maxspeed(),
            azimuth_accel: default_dome_azimuth_rate(),
            azimuth_decel: default_dome_azimuth_rate(),
            azimuth_freerange: 0.0,
            settle_time: default_dome_settle_time(),
        }
    }
}

impl DomeConfig {
    /// Motion model for the shutter altitude.
    pub fn altitude_axis(&self) -> Result<KinematicAxis, AxisError> {
        KinematicAxis::new(
            Axis::DomeAltitude,
            KinematicParams::new(self.altitude_maxspeed, self.altitude_accel, self.altitude_decel)
                .with_free_range(self.altitude_freerange),
        )
    }

    /// Motion model for the dome azimuth.
    pub fn azimuth_axis(&self) -> Result<KinematicAxis, AxisError> {
        KinematicAxis::new(
            Axis::DomeAzimuth,
            KinematicParams::new(self.azimuth_maxspeed, self.azimuth_accel, self.azimuth_decel)
                .with_free_range(self.azimuth_freerange),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("dome", "settle_time", self.settle_time)?;
        self.altitude_axis()?;
        self.azimuth_axis()?;
        Ok(())
    }
}

/// Camera rotator section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotatorConfig {
    /// Lower mechanical limit in degrees.
    pub minpos: f64,

    /// Upper mechanical limit in degrees.
    pub maxpos: f64,

    /// Angle the rotator must reach before the filter can change.
    pub filter_change_pos: f64,

    /// Cruise speed in deg/s.
    pub maxspeed: f64,

    /// Acceleration in deg/s^2.
    pub accel: f64,

    /// Deceleration in deg/s^2.
    pub decel: f64,

    /// Re-acquire the requested sky angle on every slew.
    pub follow_sky: bool,

    /// Return to the pre-change angle after a filter change.
    pub resume_angle: bool,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            minpos: default_rotator_minpos(),
            maxpos: default_rotator_maxpos(),
            filter_change_pos: 0.0,
            maxspeed: default_rotator_maxspeed(),
            accel: default_rotator_rate(),
            decel: default_rotator_rate(),
            follow_sky: false,
            resume_angle: false,
        }
    }
}

impl RotatorConfig {
    /// Motion model for the rotator.
    pub fn axis(&self) -> Result<KinematicAxis, AxisError> {
        KinematicAxis::new(
            Axis::Rotator,
            KinematicParams::new(self.maxspeed, self.accel, self.decel),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.minpos.is_finite() && self.minpos < self.maxpos) {
            return Err(ConfigError::InvalidRange {
                section: "rotator",
                parameter: "minpos/maxpos",
                min: self.minpos,
                max: self.maxpos,
                reason: "must be increasing",
            });
        }
        within(
            "rotator",
            "filter_change_pos",
            self.filter_change_pos,
            self.minpos,
            self.maxpos,
        )?;
        self.axis()?;
        Ok(())
    }
}

/// Camera section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    /// Readout time in seconds.
    pub readout_time: f64,

    /// Shutter open/close time in seconds.
    pub shutter_time: f64,

    /// Time to change the in-beam filter, in seconds.
    pub filter_change_time: f64,

    /// Changes allowed in the burst window.
    pub filter_max_changes_burst_num: u32,

    /// Burst window length in seconds.
    pub filter_max_changes_burst_time: f64,

    /// Changes allowed in the average window.
    pub filter_max_changes_avg_num: u32,

    /// Average window length in seconds.
    pub filter_max_changes_avg_time: f64,

    /// Filters in the carousel.
    pub filter_mounted: Vec<Filter>,

    /// Filters that may be exchanged out of the carousel.
    pub filter_removable: Vec<Filter>,

    /// Filters available for exchange into the carousel.
    pub filter_unmounted: Vec<Filter>,

    /// Field of view in degrees, used by the approximate dome model.
    #[serde(default = "default_field_of_view")]
    pub field_of_view: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            readout_time: default_readout_time(),
            shutter_time: default_shutter_time(),
            filter_change_time: default_filter_change_time(),
            filter_max_changes_burst_num: default_burst_num(),
            filter_max_changes_burst_time: 0.0,
            filter_max_changes_avg_num: default_avg_num(),
            filter_max_changes_avg_time: default_avg_time(),
            filter_mounted: default_filter_mounted(),
            filter_removable: default_filter_removable(),
            filter_unmounted: default_filter_unmounted(),
            field_of_view: default_field_of_view(),
        }
    }
}

impl CameraConfig {
    /// The burst budget.
    pub fn burst_budget(&self) -> Result<BudgetWindow, LedgerError> {
        BudgetWindow::new(
            "burst",
            self.filter_max_changes_burst_num,
            self.filter_max_changes_burst_time,
        )
    }

    /// The long-run average budget.
    pub fn average_budget(&self) -> Result<BudgetWindow, LedgerError> {
        BudgetWindow::new(
            "average",
            self.filter_max_changes_avg_num,
            self.filter_max_changes_avg_time,
        )
    }

    /// An empty ledger enforcing both budgets.
    pub fn ledger(&self) -> Result<FilterChangeLedger, LedgerError> {
        Ok(FilterChangeLedger::new(self.burst_budget()?, self.average_budget()?))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("camera", "readout_time", self.readout_time)?;
        non_negative("camera", "shutter_time", self.shutter_time)?;
        non_negative("camera", "filter_change_time", self.filter_change_time)?;
        if !(self.field_of_view.is_finite() && self.field_of_view > 0.0) {
            return Err(ConfigError::OutOfRange {
                section: "camera",
                parameter: "field_of_view",
                value: self.field_of_view,
                min: f64::MIN_POSITIVE,
                max: 180.0,
            });
        }
        self.ledger()?;

        if self.filter_mounted.is_empty() {
            return Err(ConfigError::Filters {
                reason: String::from("filter_mounted must name at least one filter"),
            });
        }
        let mut seen = Vec::with_capacity(self.filter_mounted.len());
        for filter in self.filter_mounted.iter().chain(&self.filter_unmounted) {
            if seen.contains(filter) {
                return Err(ConfigError::Filters {
                    reason: format!("filter {filter} is listed more than once"),
                });
            }
            seen.push(*filter);
        }
        if let Some(stray) = self.filter_removable.iter().find(|f| !seen.contains(f)) {
            return Err(ConfigError::Filters {
                reason: format!("removable filter {stray} is neither mounted nor unmounted"),
            });
        }
        Ok(())
    }
}

/// Active optics section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpticsLoopCorrConfig {
    /// Open-loop delay per degree of altitude change, in s/deg.
    pub tel_optics_ol_slope: f64,

    /// Altitude distance limits bounding the closed-loop ranges, in degrees.
    pub tel_optics_cl_alt_limit: Vec<f64>,

    /// Closed-loop delay for each range, in seconds.
    pub tel_optics_cl_delay: Vec<f64>,

    /// Which side of a limit is inclusive.
    #[serde(default)]
    pub tel_optics_cl_edge: ClosedLoopEdge,
}

impl Default for OpticsLoopCorrConfig {
    fn default() -> Self {
        Self {
            tel_optics_ol_slope: default_ol_slope(),
            tel_optics_cl_alt_limit: default_cl_alt_limit(),
            tel_optics_cl_delay: default_cl_delay(),
            tel_optics_cl_edge: ClosedLoopEdge::default(),
        }
    }
}

impl OpticsLoopCorrConfig {
    /// Build the correction model from the tables.
    pub fn model(&self) -> Result<OpticsCorrectionModel, OpticsError> {
        OpticsCorrectionModel::new(
            self.tel_optics_ol_slope,
            self.tel_optics_cl_alt_limit.clone(),
            self.tel_optics_cl_delay.clone(),
            self.tel_optics_cl_edge,
        )
    }
}

/// Slew section: prerequisites of each activity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlewConfig {
    /// Prerequisites of telescope altitude motion
    pub prereq_telalt: Vec<ActivityKind>,

    /// Prerequisites of telescope azimuth motion
    pub prereq_telaz: Vec<ActivityKind>,

    /// Prerequisites of rotator motion
    pub prereq_telrot: Vec<ActivityKind>,

    /// Prerequisites of mount settling
    pub prereq_telsettle: Vec<ActivityKind>,

    /// Prerequisites of open-loop optics correction
    pub prereq_telopticsopenloop: Vec<ActivityKind>,

    /// Prerequisites of closed-loop optics correction
    pub prereq_telopticsclosedloop: Vec<ActivityKind>,

    /// Prerequisites of dome altitude motion
    pub prereq_domalt: Vec<ActivityKind>,

    /// Prerequisites of dome azimuth motion
    pub prereq_domaz: Vec<ActivityKind>,

    /// Prerequisites of dome azimuth settling
    pub prereq_domazsettle: Vec<ActivityKind>,

    /// Prerequisites of filter change
    pub prereq_filter: Vec<ActivityKind>,

    /// Prerequisites of camera readout
    pub prereq_readout: Vec<ActivityKind>,

    /// Prerequisites of start of the next exposure
    pub prereq_exposures: Vec<ActivityKind>,
}

impl Default for SlewConfig {
    fn default() -> Self {
        Self {
            prereq_telalt: Vec::new(),
            prereq_telaz: Vec::new(),
            prereq_telrot: Vec::new(),
            prereq_telsettle: default_prereq_telsettle(),
            prereq_telopticsopenloop: default_prereq_telopticsopenloop(),
            prereq_telopticsclosedloop: default_prereq_telopticsclosedloop(),
            prereq_domalt: Vec::new(),
            prereq_domaz: Vec::new(),
            prereq_domazsettle: default_prereq_domazsettle(),
            prereq_filter: Vec::new(),
            prereq_readout: Vec::new(),
            prereq_exposures: default_prereq_exposures(),
        }
    }
}

impl SlewConfig {
    /// Prerequisite lists keyed by activity.
    pub fn prerequisites(&self) -> BTreeMap<ActivityKind, Vec<ActivityKind>> {
        ActivityKind::ALL
            .into_iter()
            .map(|kind| (kind, self.prerequisites_of(kind).to_vec()))
            .collect()
    }

    /// The configured prerequisites of one activity.
    pub fn prerequisites_of(&self, kind: ActivityKind) -> &[ActivityKind] {
        match kind {
            ActivityKind::TelAlt => &self.prereq_telalt,
            ActivityKind::TelAz => &self.prereq_telaz,
            ActivityKind::TelRot => &self.prereq_telrot,
            ActivityKind::TelSettle => &self.prereq_telsettle,
            ActivityKind::TelOpticsOpenLoop => &self.prereq_telopticsopenloop,
            ActivityKind::TelOpticsClosedLoop => &self.prereq_telopticsclosedloop,
            ActivityKind::DomAlt => &self.prereq_domalt,
            ActivityKind::DomAz => &self.prereq_domaz,
            ActivityKind::DomAzSettle => &self.prereq_domazsettle,
            ActivityKind::Filter => &self.prereq_filter,
            ActivityKind::Readout => &self.prereq_readout,
            ActivityKind::Exposures => &self.prereq_exposures,
        }
    }
}

/// Park section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParkConfig {
    /// Mount altitude in degrees.
    pub telescope_altitude: f64,

    /// Mount azimuth in degrees (mechanical, on the cable wrap).
    pub telescope_azimuth: f64,

    /// Rotator angle in degrees.
    pub telescope_rotator: f64,

    /// Dome shutter altitude in degrees.
    pub dome_altitude: f64,

    /// Dome azimuth in degrees.
    pub dome_azimuth: f64,

    /// Filter left in the beam.
    pub filter_position: Filter,
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            telescope_altitude: default_altitude_maxpos(),
            telescope_azimuth: 0.0,
            telescope_rotator: 0.0,
            dome_altitude: default_park_dome_altitude(),
            dome_azimuth: 0.0,
            filter_position: default_park_filter(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn non_negative(section: &'static str, parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeDuration {
            section,
            parameter,
            value,
        })
    }
}

fn within(section: &'static str, parameter: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            section,
            parameter,
            value,
            min,
            max,
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_altitude_minpos() -> f64 {
    20.0
}

const fn default_altitude_maxpos() -> f64 {
    86.5
}

const fn default_azimuth_minpos() -> f64 {
    -270.0
}

const fn default_azimuth_maxpos() -> f64 {
    270.0
}

const fn default_telescope_altitude_rate() -> f64 {
    3.5
}

const fn default_telescope_azimuth_rate() -> f64 {
    7.0
}

const fn default_telescope_settle_time() -> f64 {
    3.0
}

const fn default_dome_altitude_maxspeed() -> f64 {
    1.75
}

const fn default_dome_altitude_rate() -> f64 {
    0.875
}

const fn default_dome_azimuth_maxspeed() -> f64 {
    1.5
}

const fn default_dome_azimuth_rate() -> f64 {
    0.75
}

const fn default_dome_settle_time() -> f64 {
    1.0
}

const fn default_rotator_minpos() -> f64 {
    -90.0
}

const fn default_rotator_maxpos() -> f64 {
    90.0
}

const fn default_rotator_maxspeed() -> f64 {
    3.5
}

const fn default_rotator_rate() -> f64 {
    1.0
}

const fn default_readout_time() -> f64 {
    2.0
}

const fn default_shutter_time() -> f64 {
    1.0
}

const fn default_filter_change_time() -> f64 {
    120.0
}

const fn default_burst_num() -> u32 {
    1
}

const fn default_avg_num() -> u32 {
    3000
}

const fn default_avg_time() -> f64 {
    31_557_600.0
}

fn default_filter_mounted() -> Vec<Filter> {
    vec![Filter::G, Filter::R, Filter::I, Filter::Z, Filter::Y]
}

fn default_filter_removable() -> Vec<Filter> {
    vec![Filter::Y, Filter::Z]
}

fn default_filter_unmounted() -> Vec<Filter> {
    vec![Filter::U]
}

const fn default_field_of_view() -> f64 {
    3.5
}

const fn default_ol_slope() -> f64 {
    1.0 / 3.5
}

fn default_cl_alt_limit() -> Vec<f64> {
    vec![0.0, 9.0, 90.0]
}

fn default_cl_delay() -> Vec<f64> {
    vec![0.0, 20.0]
}

fn default_prereq_telsettle() -> Vec<ActivityKind> {
    vec![ActivityKind::TelAlt, ActivityKind::TelAz]
}

fn default_prereq_telopticsopenloop() -> Vec<ActivityKind> {
    vec![ActivityKind::TelAlt, ActivityKind::TelAz]
}

fn default_prereq_telopticsclosedloop() -> Vec<ActivityKind> {
    vec![
        ActivityKind::DomAlt,
        ActivityKind::DomAzSettle,
        ActivityKind::TelSettle,
        ActivityKind::Readout,
        ActivityKind::TelOpticsOpenLoop,
        ActivityKind::Filter,
        ActivityKind::TelRot,
    ]
}

fn default_prereq_domazsettle() -> Vec<ActivityKind> {
    vec![ActivityKind::DomAz]
}

fn default_prereq_exposures() -> Vec<ActivityKind> {
    vec![ActivityKind::TelOpticsClosedLoop]
}

const fn default_park_dome_altitude() -> f64 {
    90.0
}

const fn default_park_filter() -> Filter {
    Filter::R
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REFERENCE: &str = include_str!("../tests/data/observatory.yaml");

    #[test]
    fn default_config_is_valid() {
        let config = ObservatoryConfig::default();
        config.validate().unwrap();
        assert!((config.telescope.altitude_maxpos - 86.5).abs() < f64::EPSILON);
        assert!((config.dome.azimuth_maxspeed - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.camera.filter_mounted.len(), 5);
        assert_eq!(config.park.filter_position, Filter::R);
        assert_eq!(
            config.slew.prerequisites_of(ActivityKind::Exposures),
            &[ActivityKind::TelOpticsClosedLoop]
        );
    }

    #[test]
    fn reference_document_matches_defaults() {
        let config = ObservatoryConfig::from_yaml_str(REFERENCE).unwrap();
        assert_eq!(config, ObservatoryConfig::default());
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = ObservatoryConfig::from_yaml_str("{}").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("missing field `telescope`"), "{err}");
    }

    #[test]
    fn missing_key_is_named() {
        let yaml = REFERENCE.replacen("  azimuth_maxspeed: 7.0\n", "", 1);
        let err = ObservatoryConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("missing field `azimuth_maxspeed`"), "{err}");

        let err = ObservatoryConfig::from_yaml_str("telescope:\n  altitude_minpos: 25.0\n").unwrap_err();
        assert!(err.to_string().contains("missing field"), "{err}");
    }

    #[test]
    fn optional_keys_override_defaults() {
        let yaml = REFERENCE
            .replacen("  settle_time: 1.0\n", "  settle_time: 1.0\n  azimuth_freerange: 4.0\n", 1)
            .replacen(
                "  tel_optics_cl_delay: [0.0, 20.0]\n",
                "  tel_optics_cl_delay: [0.0, 20.0]\n  tel_optics_cl_edge: lower_inclusive\n",
                1,
            )
            .replacen("  filter_unmounted: [u]\n", "  filter_unmounted: [u]\n  field_of_view: 3.0\n", 1);
        let config = ObservatoryConfig::from_yaml_str(&yaml).unwrap();
        assert!((config.dome.azimuth_freerange - 4.0).abs() < f64::EPSILON);
        assert!(config.dome.altitude_freerange.abs() < f64::EPSILON);
        assert_eq!(config.optics_loop_corr.tel_optics_cl_edge, ClosedLoopEdge::LowerInclusive);
        assert!((config.camera.field_of_view - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.slew, SlewConfig::default());
    }

    #[test]
    fn misspelled_key_is_rejected() {
        let yaml = REFERENCE.replacen("altitude_maxpos: 86.5", "altitude_max_pos: 86.5", 1);
        let err = ObservatoryConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("altitude_max_pos"), "{err}");
    }

    #[test]
    fn unknown_activity_in_prerequisites_is_rejected() {
        let yaml = REFERENCE.replacen(
            "prereq_exposures: [telopticsclosedloop]",
            "prereq_exposures: [telopticsclosedlop]",
            1,
        );
        let err = ObservatoryConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn cyclic_prerequisites_fail_at_load() {
        let yaml = REFERENCE
            .replacen("prereq_telalt: []", "prereq_telalt: [telaz]", 1)
            .replacen("prereq_telaz: []", "prereq_telaz: [telalt]", 1);
        let err = ObservatoryConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Graph {
                source: GraphError::Cyclic { .. }
            }
        ));
    }

    #[test]
    fn non_positive_field_of_view_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.camera.field_of_view = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                parameter: "field_of_view",
                ..
            })
        ));
    }

    #[test]
    fn zero_speed_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.dome.azimuth_maxspeed = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Axis { .. })));
    }

    #[test]
    fn narrow_cable_wrap_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.telescope.azimuth_minpos = -90.0;
        config.telescope.azimuth_maxpos = 90.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn inverted_altitude_range_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.telescope.altitude_minpos = 80.0;
        config.telescope.altitude_maxpos = 30.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn mismatched_optics_tables_are_rejected() {
        let mut config = ObservatoryConfig::default();
        config.optics_loop_corr.tel_optics_cl_delay = vec![0.0, 20.0, 30.0];
        assert!(matches!(config.validate(), Err(ConfigError::Optics { .. })));
    }

    #[test]
    fn zero_burst_count_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.camera.filter_max_changes_burst_num = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Budget { .. })));
    }

    #[test]
    fn park_outside_limits_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.park.telescope_altitude = 10.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                section: "park",
                parameter: "telescope_altitude",
                ..
            }
        ));
    }

    #[test]
    fn overlapping_filter_sets_are_rejected() {
        let mut config = ObservatoryConfig::default();
        config.camera.filter_unmounted = vec![Filter::U, Filter::G];
        assert!(matches!(config.validate(), Err(ConfigError::Filters { .. })));

        let mut config = ObservatoryConfig::default();
        config.camera.filter_mounted.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Filters { .. })));
    }

    #[test]
    fn unmounted_park_filter_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.park.filter_position = Filter::U;
        assert!(matches!(config.validate(), Err(ConfigError::Filters { .. })));
    }

    #[test]
    fn prerequisites_cover_every_activity() {
        let prerequisites = SlewConfig::default().prerequisites();
        assert_eq!(prerequisites.len(), ActivityKind::ALL.len());
        assert_eq!(prerequisites.get(&ActivityKind::TelOpticsClosedLoop).unwrap().len(), 7);
        assert!(prerequisites.get(&ActivityKind::TelAlt).unwrap().is_empty());
    }
}
