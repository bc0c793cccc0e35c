//! Axis motion, angle wrap and active optics delay models.
//!
//! Everything in this crate is a pure function of validated, immutable
//! parameters. Angles and distances are degrees, times are seconds.
//!
//! # Modules
//!
//! - [`angle`] -- Azimuth cable-wrap and rotator orientation resolution
//! - [`axis`] -- Trapezoidal/triangular velocity profiles per axis
//! - [`optics`] -- Open- and closed-loop active optics delays
//!
//! # Usage
//!
//! ```
//! use obsmodel_kinematics::{Axis, KinematicAxis, KinematicParams, resolve_azimuth};
//!
//! let azimuth = KinematicAxis::new(Axis::TelescopeAzimuth, KinematicParams::new(7.0, 7.0, 7.0))?;
//! let target = resolve_azimuth(-90.0, 180.0, -270.0, 270.0)?;
//! assert!((target - 270.0).abs() < 1e-9);
//! assert!((azimuth.time_to_travel(target - 180.0) - (90.0 - 7.0) / 7.0 - 2.0).abs() < 1e-9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod angle;
pub mod axis;
pub mod optics;

pub use angle::{
    AngleError, FULL_TURN, HALF_TURN, RotatorOrientation, closest_angle, closest_representative,
    normalize_degrees, resolve_azimuth, resolve_rotator, shortest_distance,
};
pub use axis::{Axis, AxisError, KinematicAxis, KinematicParams, Motion};
pub use optics::{ClosedLoopEdge, OpticsCorrectionModel, OpticsError};
