//! The observatory model: current state plus the operations that advance it.
//!
//! # Operations
//!
//! - [`ObservatoryModel::get_slew_delay`] prices a slew without touching
//!   the state.
//! - [`ObservatoryModel::observe`] slews, tracks and exposes, advancing the
//!   clock by the slew delay plus the visit time.
//! - [`ObservatoryModel::update_state`] advances the clock alone, letting a
//!   tracking mount follow the sky.
//! - [`ObservatoryModel::park`] returns everything to the park position.
//! - [`ObservatoryModel::approximate_slew_delays`] ranks many candidates
//!   with a closed-form estimate.
//!
//! Every mutating call computes the complete next state first and commits
//! it only when nothing failed.

use obsmodel_kinematics::{closest_angle, normalize_degrees, resolve_azimuth, resolve_rotator};
use obsmodel_ledger::FilterChangeLedger;
use obsmodel_types::{Filter, ObservationRecord, Target};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ObservatoryConfig};
use crate::error::ObservatoryError;
use crate::graph::ActivityGraph;
use crate::site::{ObservingSite, SiteService};
use crate::slew::{FilterChange, Offset, SlewReport, SlewTimer};
use crate::state::{AxisLimit, LimitViolations, ObservatoryState, Phase};

/// Where a slew is headed.
#[derive(Debug, Clone, Copy)]
enum Destination {
    /// A sky position to track. Radians.
    Sky { ra: f64, dec: f64, ang: f64 },
    /// A fixed horizon position. Degrees.
    Horizon { alt: f64, az: f64, rot: f64 },
    /// The configured park position.
    Park,
}

impl Destination {
    const fn of(target: &Target) -> Self {
        Self::Sky {
            ra: target.ra(),
            dec: target.dec(),
            ang: target.ang(),
        }
    }
}

/// A priced slew and the state it leads to (at the slew start time).
struct SlewPlan {
    destination: ObservatoryState,
    report: SlewReport,
}

/// Observatory state machine and slew delay engine.
#[derive(Debug)]
pub struct ObservatoryModel<S: SiteService = ObservingSite> {
    config: ObservatoryConfig,
    site: S,
    timer: SlewTimer,
    ledger: FilterChangeLedger,
    state: ObservatoryState,
    last_slew: Option<SlewReport>,
    limit_violations: LimitViolations,
}

impl<S: SiteService> ObservatoryModel<S> {
    /// Validate `config` and build a model parked at time zero.
    pub fn configure(config: ObservatoryConfig, site: S) -> Result<Self, ObservatoryError> {
        config.validate()?;
        let timer = SlewTimer::new(&config)?;
        let ledger = config.camera.ledger().map_err(ConfigError::from)?;
        let initial = parked_at(&config, 0.0);

        let mut model = Self {
            config,
            site,
            timer,
            ledger,
            state: initial,
            last_slew: None,
            limit_violations: LimitViolations::default(),
        };
        model.state = model.advanced(&model.state, 0.0);

        debug!(
            follow_sky = model.config.rotator.follow_sky,
            resume_angle = model.config.rotator.resume_angle,
            activities = model.timer.graph().order().len(),
            "Observatory model configured"
        );
        Ok(model)
    }

    // -- accessors --------------------------------------------------------

    /// The validated configuration.
    pub const fn config(&self) -> &ObservatoryConfig {
        &self.config
    }

    /// The site service in use.
    pub const fn site(&self) -> &S {
        &self.site
    }

    /// The current state.
    pub const fn state(&self) -> &ObservatoryState {
        &self.state
    }

    /// One-line rendering of the current state.
    pub fn snapshot(&self) -> String {
        self.state.to_string()
    }

    /// Current model time in epoch seconds.
    pub const fn time(&self) -> f64 {
        self.state.time
    }

    /// The filter change history.
    pub const fn ledger(&self) -> &FilterChangeLedger {
        &self.ledger
    }

    /// The slew activity graph.
    pub const fn activity_graph(&self) -> &ActivityGraph {
        self.timer.graph()
    }

    /// Report of the most recent committed slew.
    pub const fn last_slew(&self) -> Option<&SlewReport> {
        self.last_slew.as_ref()
    }

    /// Axis limits tracking has run into since configuration or reset.
    pub const fn limit_violations(&self) -> &LimitViolations {
        &self.limit_violations
    }

    // -- queries ----------------------------------------------------------

    /// Seconds needed to slew from the current state to `target`.
    ///
    /// Does not modify the model.
    pub fn get_slew_delay(&self, target: &Target) -> Result<f64, ObservatoryError> {
        self.slew_report(target).map(|report| report.delay())
    }

    /// Full breakdown of the slew to `target`, without performing it.
    pub fn slew_report(&self, target: &Target) -> Result<SlewReport, ObservatoryError> {
        self.plan(Destination::of(target), target.filter())
            .map(|plan| plan.report)
    }

    /// Time on target for a visit: exposures, one shutter cycle per
    /// exposure and one readout between consecutive exposures.
    ///
    /// The readout after the last exposure is not counted here. It runs
    /// during the next slew as its readout activity.
    pub fn visit_time(&self, target: &Target) -> f64 {
        let exposures = u32::try_from(target.num_exposures()).unwrap_or(u32::MAX);
        self.sequence_time(target.total_exposure_time(), exposures)
    }

    /// Duration of a deep drilling sequence of `exposures` exposures
    /// totalling `exposure_total` seconds with `filter_changes` filter
    /// changes. A change replaces the readout it follows.
    pub fn deep_drilling_time(&self, exposure_total: f64, exposures: u32, filter_changes: u32) -> f64 {
        let camera = &self.config.camera;
        self.sequence_time(exposure_total, exposures)
            + f64::from(filter_changes) * (camera.filter_change_time - camera.readout_time)
    }

    /// Closed-form slew delays from the current pointing to each of
    /// `targets`, in order.
    ///
    /// Cheaper and coarser than [`Self::get_slew_delay`]: rotator, cable
    /// wrap and filter inventory are ignored. `None` marks a target outside
    /// the altitude limits. With `lax_dome` the dome only keeps the field
    /// inside its slit.
    pub fn approximate_slew_delays(&self, targets: &[Target], lax_dome: bool) -> Vec<Option<f64>> {
        let now = self.state.time;
        targets
            .iter()
            .map(|target| {
                let position = self.site.radec_to_horizontal(now, target.ra(), target.dec());
                let alt = position.alt.to_degrees();
                self.check_altitude(alt).ok()?;
                let az = normalize_degrees(position.az.to_degrees());
                let offset = Offset::between(self.state.alt, self.state.az, alt, az);
                let change = target.filter() != self.state.filter;
                Some(self.timer.approximate(offset, change, lax_dome))
            })
            .collect()
    }

    // -- state transitions ------------------------------------------------

    /// Advance the clock to `time`.
    ///
    /// A tracking mount follows its target; otherwise the horizon position
    /// is held and the sky coordinates drift. Calling this twice with the
    /// same time leaves the state unchanged.
    pub fn update_state(&mut self, time: f64) -> Result<(), ObservatoryError> {
        self.ensure_forward(time)?;
        self.accept(self.advanced_with_limits(&self.state, time));
        self.ledger.prune(time);
        Ok(())
    }

    /// Slew to `target` and start tracking it. Returns the slew report.
    pub fn slew(&mut self, target: &Target) -> Result<SlewReport, ObservatoryError> {
        let plan = self.plan(Destination::of(target), target.filter())?;
        let report = plan.report.clone();
        self.commit(plan)?;
        Ok(report)
    }

    /// Slew to a fixed horizon position (degrees) without tracking.
    pub fn slew_altaz(&mut self, alt: f64, az: f64, rot: f64, filter: Filter) -> Result<SlewReport, ObservatoryError> {
        let plan = self.plan(Destination::Horizon { alt, az, rot }, filter)?;
        let report = plan.report.clone();
        self.commit(plan)?;
        Ok(report)
    }

    /// Slew to `target`, expose, and return what was achieved.
    ///
    /// The clock ends at slew start + slew delay + visit time, with the
    /// mount still tracking the target.
    pub fn observe(&mut self, target: &Target) -> Result<ObservationRecord, ObservatoryError> {
        let plan = self.plan(Destination::of(target), target.filter())?;
        let slew_delay = plan.report.delay();
        self.commit(plan)?;

        let start = self.state.time;
        let (alt, az, rot, pa) = (self.state.alt, self.state.az, self.state.telrot, self.state.pa);
        debug!(target_id = target.id(), time = start, exposures = target.num_exposures(), "Exposing");

        let end = start + self.visit_time(target);
        self.accept(self.advanced_with_limits(&self.state, end));
        info!(
            target_id = target.id(),
            filter = %target.filter(),
            slew_delay,
            start,
            end,
            "Observation complete"
        );

        Ok(ObservationRecord {
            target: target.clone(),
            alt,
            az,
            rot,
            pa,
            slew_delay,
            start,
            end,
        })
    }

    /// Start following the sky from the current horizon position at `time`.
    pub fn start_tracking(&mut self, time: f64) -> Result<(), ObservatoryError> {
        self.ensure_forward(time)?;
        self.accept(self.advanced_with_limits(&self.state, time));
        self.state.phase = Phase::Tracking;
        info!(time, ra = self.state.ra, dec = self.state.dec, "Tracking started");
        Ok(())
    }

    /// Stop following the sky at `time`, holding the horizon position.
    pub fn stop_tracking(&mut self, time: f64) -> Result<(), ObservatoryError> {
        self.ensure_forward(time)?;
        self.accept(self.advanced_with_limits(&self.state, time));
        if self.state.tracking() {
            self.state.phase = Phase::Stopped;
            info!(time, alt = self.state.alt, az = self.state.az, "Tracking stopped");
        }
        Ok(())
    }

    /// Return every axis and the filter to the park position.
    ///
    /// Returns the seconds it took; zero when already parked.
    pub fn park(&mut self) -> Result<f64, ObservatoryError> {
        if self.state.parked() {
            return Ok(0.0);
        }
        let plan = self.plan(Destination::Park, self.config.park.filter_position)?;
        let delay = plan.report.delay();
        self.commit(plan)?;
        info!(time = self.state.time, delay, "Observatory parked");
        Ok(delay)
    }

    /// Put the observatory back at its park position and configured filter
    /// inventory without slewing.
    ///
    /// The clock and the filter change history are kept; the last slew and
    /// the limit counts are cleared.
    pub fn reset(&mut self) {
        let parked = parked_at(&self.config, self.state.time);
        self.state = self.advanced(&parked, parked.time);
        self.last_slew = None;
        self.limit_violations = LimitViolations::default();
        info!(time = self.state.time, "Observatory reset to park");
    }

    /// Exchange the mounted, removable filter `unmount` with the most
    /// recently unmounted filter.
    ///
    /// Instantaneous and free of budget; the filter in the beam and the
    /// park filter cannot be unmounted.
    pub fn swap_filter(&mut self, unmount: Filter) -> Result<(), ObservatoryError> {
        let reject = |reason| ObservatoryError::SwapRejected {
            filter: unmount,
            reason,
        };
        if !self.state.is_mounted(unmount) {
            return Err(reject("it is not mounted"));
        }
        if unmount == self.state.filter {
            return Err(reject("it is in the beam"));
        }
        if unmount == self.config.park.filter_position {
            return Err(reject("it is the park filter"));
        }
        if !self.config.camera.filter_removable.contains(&unmount) {
            return Err(reject("it is not removable"));
        }
        let Some(&incoming) = self.state.unmounted.last() else {
            return Err(reject("no unmounted filter is available"));
        };

        self.state.mounted.retain(|&f| f != unmount);
        self.state.mounted.push(incoming);
        self.state.unmounted.pop();
        self.state.unmounted.push(unmount);
        info!(unmounted = %unmount, mounted = %incoming, "Filter swapped");
        Ok(())
    }

    // -- internals --------------------------------------------------------

    const fn ensure_forward(&self, time: f64) -> Result<(), ObservatoryError> {
        if time.is_finite() && time >= self.state.time {
            Ok(())
        } else {
            Err(ObservatoryError::NonMonotonicTime {
                current: self.state.time,
                requested: time,
            })
        }
    }

    fn sequence_time(&self, exposure_total: f64, exposures: u32) -> f64 {
        let camera = &self.config.camera;
        let readouts = exposures.saturating_sub(1);
        exposure_total + f64::from(exposures) * camera.shutter_time + f64::from(readouts) * camera.readout_time
    }

    /// Make `next` the current state and count the limits it hit.
    fn accept(&mut self, (next, limits): (ObservatoryState, Vec<AxisLimit>)) {
        for limit in limits {
            self.limit_violations.record(limit);
        }
        self.state = next;
    }

    /// `from` moved forward to `time`.
    fn advanced(&self, from: &ObservatoryState, time: f64) -> ObservatoryState {
        self.advanced_with_limits(from, time).0
    }

    /// `from` moved forward to `time`, with the axis limits a tracking
    /// mount ran into on the way.
    fn advanced_with_limits(&self, from: &ObservatoryState, time: f64) -> (ObservatoryState, Vec<AxisLimit>) {
        let mut next = from.clone();
        let mut limits = Vec::new();
        next.time = time;

        if from.tracking() {
            let telescope = &self.config.telescope;
            let rotator = &self.config.rotator;
            let position = self
                .site
                .radec_to_horizontal(time, from.ra.to_radians(), from.dec.to_radians());
            let alt = position.alt.to_degrees();
            let az = normalize_degrees(position.az.to_degrees());
            let pa = normalize_degrees(position.pa.to_degrees());
            let rot = normalize_degrees(pa - from.ang);
            let telaz = closest_angle(az, from.telaz);
            let telrot = closest_angle(rot, from.telrot);

            let in_limits = (telescope.altitude_minpos..=telescope.altitude_maxpos).contains(&alt)
                && (telescope.azimuth_minpos..=telescope.azimuth_maxpos).contains(&telaz)
                && (rotator.minpos..=rotator.maxpos).contains(&telrot);
            if in_limits {
                next.alt = alt;
                next.az = az;
                next.pa = pa;
                next.rot = rot;
                next.telalt = alt;
                next.telaz = telaz;
                next.telrot = telrot;
                next.domalt = alt;
                next.domaz = closest_angle(az, from.domaz);
                return (next, limits);
            }

            let ranges = [
                (alt, telescope.altitude_minpos, telescope.altitude_maxpos),
                (telaz, telescope.azimuth_minpos, telescope.azimuth_maxpos),
                (telrot, rotator.minpos, rotator.maxpos),
            ];
            let ends = [
                (AxisLimit::AltitudeMin, AxisLimit::AltitudeMax),
                (AxisLimit::AzimuthMin, AxisLimit::AzimuthMax),
                (AxisLimit::RotatorMin, AxisLimit::RotatorMax),
            ];
            for ((value, min, max), (below, above)) in ranges.into_iter().zip(ends) {
                if value < min {
                    limits.push(below);
                } else if value > max {
                    limits.push(above);
                }
            }

            next.telalt = alt.clamp(telescope.altitude_minpos, telescope.altitude_maxpos);
            next.telaz = telaz.clamp(telescope.azimuth_minpos, telescope.azimuth_maxpos);
            next.telrot = telrot.clamp(rotator.minpos, rotator.maxpos);
            next.alt = next.telalt;
            next.az = normalize_degrees(next.telaz);
            next.domalt = next.telalt;
            next.domaz = closest_angle(next.az, from.domaz);
            next.phase = Phase::Stopped;
            warn!(
                time,
                alt,
                telaz,
                telrot,
                limits = ?limits,
                "Tracking reached an axis limit; holding position"
            );
        }

        let equatorial = self
            .site
            .horizontal_to_radec(time, next.alt.to_radians(), next.az.to_radians());
        next.ra = normalize_degrees(equatorial.ra.to_degrees());
        next.dec = equatorial.dec.to_degrees();
        next.pa = normalize_degrees(equatorial.pa.to_degrees());
        next.rot = normalize_degrees(next.telrot);
        next.ang = normalize_degrees(next.pa - next.rot);
        (next, limits)
    }

    fn check_altitude(&self, altitude: f64) -> Result<(), ObservatoryError> {
        let telescope = &self.config.telescope;
        if (telescope.altitude_minpos..=telescope.altitude_maxpos).contains(&altitude) {
            Ok(())
        } else {
            Err(ObservatoryError::UnreachableAltitude {
                altitude,
                min: telescope.altitude_minpos,
                max: telescope.altitude_maxpos,
            })
        }
    }

    /// Decide how `requested` gets into the beam at `now`.
    fn resolve_filter(&self, requested: Filter, now: f64) -> Result<Option<FilterChange>, ObservatoryError> {
        let state = &self.state;
        if requested == state.filter {
            return Ok(None);
        }

        let exchanged = if state.is_mounted(requested) {
            None
        } else if state.unmounted.contains(&requested) {
            let park_filter = self.config.park.filter_position;
            let slot = self
                .config
                .camera
                .filter_removable
                .iter()
                .copied()
                .find(|&f| f != state.filter && f != park_filter && state.is_mounted(f))
                .ok_or(ObservatoryError::FilterSlotUnavailable { filter: requested })?;
            Some(slot)
        } else {
            return Err(ObservatoryError::UnknownFilter { filter: requested });
        };

        self.ledger.check(now)?;
        Ok(Some(FilterChange {
            from: state.filter,
            to: requested,
            exchanged,
        }))
    }

    /// Resolve `destination` against the current state and price the slew.
    fn plan(&self, destination: Destination, filter: Filter) -> Result<SlewPlan, ObservatoryError> {
        let from = &self.state;
        let now = from.time;
        let telescope = &self.config.telescope;
        let rotator = &self.config.rotator;
        let change = self.resolve_filter(filter, now)?;

        let mut to = from.clone();
        let mut orientation = None;
        match destination {
            Destination::Sky { ra, dec, ang } => {
                let position = self.site.radec_to_horizontal(now, ra, dec);
                let alt = position.alt.to_degrees();
                self.check_altitude(alt)?;
                let az = normalize_degrees(position.az.to_degrees());
                let pa = normalize_degrees(position.pa.to_degrees());

                to.telrot = if rotator.follow_sky {
                    let sky_rot = normalize_degrees(pa - ang.to_degrees());
                    let (angle, chosen) = resolve_rotator(sky_rot, from.telrot, rotator.minpos, rotator.maxpos)?;
                    orientation = Some(chosen);
                    angle
                } else if change.is_some() && !rotator.resume_angle {
                    rotator.filter_change_pos
                } else {
                    from.telrot
                };
                to.telaz = resolve_azimuth(az, from.telaz, telescope.azimuth_minpos, telescope.azimuth_maxpos)?;
                to.telalt = alt;
                to.domalt = alt;
                to.domaz = closest_angle(az, from.domaz);
                to.ra = normalize_degrees(ra.to_degrees());
                to.dec = dec.to_degrees();
                to.alt = alt;
                to.az = az;
                to.pa = pa;
                to.rot = normalize_degrees(to.telrot);
                to.ang = normalize_degrees(pa - to.rot);
                to.phase = Phase::Tracking;
            }
            Destination::Horizon { alt, az, rot } => {
                self.check_altitude(alt)?;
                let az = normalize_degrees(az);
                let (angle, chosen) =
                    resolve_rotator(normalize_degrees(rot), from.telrot, rotator.minpos, rotator.maxpos)?;
                orientation = Some(chosen);
                to.telaz = resolve_azimuth(az, from.telaz, telescope.azimuth_minpos, telescope.azimuth_maxpos)?;
                to.telalt = alt;
                to.telrot = angle;
                to.domalt = alt;
                to.domaz = closest_angle(az, from.domaz);
                to.alt = alt;
                to.az = az;
                to.phase = Phase::Stopped;
            }
            Destination::Park => {
                let park = &self.config.park;
                to.telalt = park.telescope_altitude;
                to.telaz = park.telescope_azimuth;
                to.telrot = park.telescope_rotator;
                to.domalt = park.dome_altitude;
                to.domaz = park.dome_azimuth;
                to.alt = park.telescope_altitude;
                to.az = normalize_degrees(park.telescope_azimuth);
                to.phase = Phase::Parked;
            }
        }

        if let Some(change) = change {
            to.filter = change.to;
            if let Some(out) = change.exchanged {
                to.mounted.retain(|&f| f != out);
                to.mounted.push(change.to);
                to.unmounted.retain(|&f| f != change.to);
                to.unmounted.push(out);
            }
        }
        if !to.tracking() {
            to = self.advanced(&to, now);
        }

        let via = change.map(|_| rotator.filter_change_pos);
        let report = self.timer.price(from, &to, via, change, orientation);
        Ok(SlewPlan {
            destination: to,
            report,
        })
    }

    /// Apply a plan: record the filter change, then move to the end of the
    /// slew.
    fn commit(&mut self, plan: SlewPlan) -> Result<(), ObservatoryError> {
        let SlewPlan { destination, report } = plan;
        if let Some(change) = report.filter_change {
            self.ledger.record_change(report.start)?;
            info!(
                time = report.start,
                from = %change.from,
                to = %change.to,
                exchanged = ?change.exchanged,
                "Filter changed"
            );
        }

        for timing in report.critical_path.timings() {
            debug!(
                activity = %timing.activity,
                start = timing.start,
                duration = timing.duration,
                "Slew activity"
            );
        }
        self.accept(self.advanced_with_limits(&destination, report.end()));
        info!(
            time = self.state.time,
            delay = report.delay(),
            phase = %self.state.phase,
            alt = self.state.alt,
            az = self.state.az,
            "Slew complete"
        );
        self.last_slew = Some(report);
        Ok(())
    }
}

/// The park position and configured filter inventory at `time`, before the
/// sky coordinates are derived.
fn parked_at(config: &ObservatoryConfig, time: f64) -> ObservatoryState {
    let park = &config.park;
    ObservatoryState {
        time,
        ra: 0.0,
        dec: 0.0,
        ang: 0.0,
        pa: 0.0,
        alt: park.telescope_altitude,
        az: normalize_degrees(park.telescope_azimuth),
        rot: normalize_degrees(park.telescope_rotator),
        telalt: park.telescope_altitude,
        telaz: park.telescope_azimuth,
        telrot: park.telescope_rotator,
        domalt: park.dome_altitude,
        domaz: park.dome_azimuth,
        phase: Phase::Parked,
        filter: park.filter_position,
        mounted: config.camera.filter_mounted.clone(),
        unmounted: config.camera.filter_unmounted.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use obsmodel_kinematics::RotatorOrientation;
    use obsmodel_types::ActivityKind;

    use super::*;

    fn model() -> ObservatoryModel {
        ObservatoryModel::configure(ObservatoryConfig::default(), ObservingSite::lsst()).unwrap()
    }

    fn south_pole(filter: Filter) -> Target {
        Target::from_degrees(1, filter, 0.0, -90.0, 0.0, vec![15.0, 15.0]).unwrap()
    }

    #[test]
    fn starts_parked_at_time_zero() {
        let model = model();
        let state = model.state();
        assert!(state.parked());
        assert!(model.time().abs() < f64::EPSILON);
        assert_eq!(state.filter, Filter::R);
        assert!((state.ra - 29.480).abs() < 1e-3);
        assert!((state.dec + 26.744).abs() < 1e-3);
        assert!((state.ang - 180.0).abs() < 1e-6);
        assert!(model.last_slew().is_none());
    }

    #[test]
    fn slew_delay_query_leaves_state_untouched() {
        let model = model();
        let before = model.state().clone();
        let target = south_pole(Filter::G);
        let first = model.get_slew_delay(&target).unwrap();
        let second = model.get_slew_delay(&target).unwrap();
        assert!((first - second).abs() < f64::EPSILON);
        assert_eq!(model.state(), &before);
        assert!(model.ledger().is_empty());
    }

    #[test]
    fn filter_change_dominates_short_slews() {
        let model = model();
        let here = model.state();
        let target = Target::from_degrees(5, Filter::G, here.ra, here.dec, 0.0, vec![30.0]).unwrap();
        let report = model.slew_report(&target).unwrap();
        // The mount barely moves; the 120 s filter change gates closed loop.
        assert!((report.delay() - 120.0).abs() < 1e-6);
        assert_eq!(
            report.critical_path.chain(),
            &[ActivityKind::Filter, ActivityKind::TelOpticsClosedLoop, ActivityKind::Exposures]
        );
        assert_eq!(
            report.filter_change,
            Some(FilterChange {
                from: Filter::R,
                to: Filter::G,
                exchanged: None,
            })
        );
    }

    #[test]
    fn follow_sky_reports_orientation() {
        let mut config = ObservatoryConfig::default();
        config.rotator.follow_sky = true;
        let model = ObservatoryModel::configure(config, ObservingSite::lsst()).unwrap();
        let target = Target::from_degrees(2, Filter::R, 80.0, 0.0, 0.0, vec![30.0]).unwrap();
        let report = model.slew_report(&target).unwrap();
        assert_eq!(report.orientation, Some(RotatorOrientation::NorthDown));
    }

    #[test]
    fn too_low_target_is_unreachable() {
        let model = model();
        // Near lower culmination at the Unix epoch, far below the horizon.
        let target = Target::from_degrees(3, Filter::R, 210.0, 20.0, 0.0, vec![30.0]).unwrap();
        let err = model.get_slew_delay(&target).unwrap_err();
        assert!(matches!(err, ObservatoryError::UnreachableAltitude { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let mut config = ObservatoryConfig::default();
        config.camera.filter_unmounted.clear();
        config.camera.filter_removable = vec![Filter::Y];
        let model = ObservatoryModel::configure(config, ObservingSite::lsst()).unwrap();
        let err = model.get_slew_delay(&south_pole(Filter::U)).unwrap_err();
        assert!(matches!(err, ObservatoryError::UnknownFilter { filter: Filter::U }));
    }

    #[test]
    fn visit_time_counts_readouts_between_exposures() {
        let model = model();
        assert!((model.visit_time(&south_pole(Filter::R)) - 34.0).abs() < 1e-12);
        let single = Target::from_degrees(4, Filter::R, 0.0, -90.0, 0.0, vec![30.0]).unwrap();
        assert!((model.visit_time(&single) - 31.0).abs() < 1e-12);
    }

    #[test]
    fn approximate_delays_track_the_exact_pricing() {
        let mut model = model();
        model.update_state(1_672_542_000.0).unwrap();
        let before = model.state().clone();

        // Opposite the local meridian, well below the horizon.
        let lower_culmination = before.ra + 180.0;
        let low = Target::from_degrees(3, Filter::R, lower_culmination, 20.0, 0.0, vec![30.0]).unwrap();
        let targets = [south_pole(Filter::R), low, south_pole(Filter::G)];
        let strict = model.approximate_slew_delays(&targets, false);
        let lax = model.approximate_slew_delays(&targets, true);

        // Dome azimuth 122 s plus its settle, then closed loop.
        assert!((strict[0].unwrap() - 143.0).abs() < 1e-3);
        assert!((strict[0].unwrap() - model.get_slew_delay(&targets[0]).unwrap()).abs() < 1e-3);
        // The slit only needs to reach the field edge.
        assert!((lax[0].unwrap() - 140.0).abs() < 1e-3);
        assert!(strict[1].is_none() && lax[1].is_none());
        assert!((strict[2].unwrap() - 143.0).abs() < 1e-3);
        assert_eq!(model.state(), &before);
    }

    #[test]
    fn approximate_delay_in_place_is_a_readout() {
        let mut model = model();
        model.update_state(1_672_542_000.0).unwrap();
        model.slew(&south_pole(Filter::R)).unwrap();

        // The pole stays put while the sky turns.
        let delays = model.approximate_slew_delays(&[south_pole(Filter::R), south_pole(Filter::G)], true);
        assert!((delays[0].unwrap() - 2.0).abs() < 1e-6);
        assert!((delays[1].unwrap() - 120.0).abs() < 1e-6);
    }

    #[test]
    fn reset_returns_to_park_and_keeps_the_clock() {
        let mut model = model();
        model.update_state(1_672_542_000.0).unwrap();
        model.observe(&south_pole(Filter::G)).unwrap();
        let time = model.time();
        let changes = model.ledger().len();

        model.reset();

        let state = model.state();
        assert!(state.parked());
        assert_eq!(state.filter, Filter::R);
        assert!((state.telalt - 86.5).abs() < f64::EPSILON);
        assert!(state.telaz.abs() < f64::EPSILON);
        assert!((state.domalt - 90.0).abs() < f64::EPSILON);
        assert!((model.time() - time).abs() < f64::EPSILON);
        assert_eq!(model.ledger().len(), changes);
        assert!(model.last_slew().is_none());
        assert_eq!(model.limit_violations().total(), 0);
        assert!(model.park().unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn deep_drilling_sequence_time() {
        let model = model();
        let time = model.deep_drilling_time(2880.0, 192, 3);
        assert!((time - 3808.0).abs() < 1e-9);
    }

    #[test]
    fn slew_altaz_holds_the_horizon_position() {
        let mut model = model();
        model.update_state(1_000.0).unwrap();
        let report = model.slew_altaz(45.0, 90.0, 10.0, Filter::R).unwrap();
        let state = model.state().clone();
        assert_eq!(state.phase, Phase::Stopped);
        assert!((state.time - 1_000.0 - report.delay()).abs() < 1e-9);
        assert!((state.alt - 45.0).abs() < 1e-9);
        assert!((state.telaz - 90.0).abs() < 1e-9);
        assert!((state.telrot - 10.0).abs() < 1e-9);

        let ra = state.ra;
        model.update_state(state.time + 600.0).unwrap();
        assert!((model.state().alt - 45.0).abs() < 1e-9);
        // The sky drifts by 600 sidereal seconds.
        assert!((normalize_degrees(model.state().ra - ra) - 2.507).abs() < 1e-2);
    }

    #[test]
    fn start_and_stop_tracking() {
        let mut model = model();
        model.slew_altaz(60.0, 200.0, 0.0, Filter::R).unwrap();
        let t0 = model.time();
        model.start_tracking(t0).unwrap();
        let (ra, dec) = (model.state().ra, model.state().dec);
        model.update_state(t0 + 300.0).unwrap();
        assert!(model.state().tracking());
        assert!((model.state().ra - ra).abs() < 1e-6);
        assert!((model.state().dec - dec).abs() < 1e-6);
        assert!((model.state().alt - 60.0).abs() > 1e-3);

        model.stop_tracking(t0 + 400.0).unwrap();
        let alt = model.state().alt;
        model.update_state(t0 + 1_000.0).unwrap();
        assert_eq!(model.state().phase, Phase::Stopped);
        assert!((model.state().alt - alt).abs() < 1e-9);
    }

    #[test]
    fn swap_filter_rules() {
        let mut model = model();
        let err = model.swap_filter(Filter::R).unwrap_err();
        assert!(matches!(err, ObservatoryError::SwapRejected { reason: "it is in the beam", .. }));
        let err = model.swap_filter(Filter::G).unwrap_err();
        assert!(matches!(err, ObservatoryError::SwapRejected { reason: "it is not removable", .. }));
        let err = model.swap_filter(Filter::U).unwrap_err();
        assert!(matches!(err, ObservatoryError::SwapRejected { reason: "it is not mounted", .. }));

        model.swap_filter(Filter::Z).unwrap();
        assert_eq!(model.state().mounted, vec![Filter::G, Filter::R, Filter::I, Filter::Y, Filter::U]);
        assert_eq!(model.state().unmounted, vec![Filter::Z]);
        assert!(model.ledger().is_empty());
    }
}
