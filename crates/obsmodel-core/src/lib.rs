//! Observatory state model and slew delay engine.
//!
//! Given the current state of the mount, dome, rotator and filter carousel,
//! this crate answers how long it takes to get ready to expose on a target,
//! and advances the state as targets are observed.
//!
//! # Modules
//!
//! - [`config`] -- Strongly-typed configuration with reference defaults.
//! - [`error`] -- [`ObservatoryError`], returned by every fallible call.
//! - [`graph`] -- Slew activity DAG and critical path evaluation.
//! - [`model`] -- [`ObservatoryModel`], the state machine.
//! - [`shared`] -- [`SharedObservatory`], a lock-guarded handle.
//! - [`site`] -- [`SiteService`] and the built-in [`ObservingSite`].
//! - [`slew`] -- [`SlewReport`] and per-activity pricing.
//! - [`state`] -- [`ObservatoryState`] and its one-line snapshot.
//!
//! # Usage
//!
//! ```
//! use obsmodel_core::{ObservatoryConfig, ObservatoryModel, ObservingSite};
//! use obsmodel_types::{Filter, Target};
//!
//! let mut model = ObservatoryModel::configure(ObservatoryConfig::default(), ObservingSite::lsst())?;
//! model.update_state(1_672_542_000.0)?;
//!
//! let target = Target::from_degrees(1, Filter::R, 0.0, -90.0, 0.0, vec![15.0, 15.0])?;
//! let delay = model.get_slew_delay(&target)?;
//! assert!((delay - 143.0).abs() < 0.1);
//!
//! let record = model.observe(&target)?;
//! assert!(model.state().tracking());
//! assert!((record.end - 1_672_542_177.0).abs() < 0.1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod shared;
pub mod site;
pub mod slew;
pub mod state;

pub use config::{ConfigError, ObservatoryConfig};
pub use error::ObservatoryError;
pub use graph::{ActivityGraph, ActivityTiming, CriticalPath, GraphError};
pub use model::ObservatoryModel;
pub use shared::SharedObservatory;
pub use site::{EquatorialPosition, HorizontalPosition, ObservingSite, SiteService};
pub use slew::{FilterChange, PeakSpeeds, SlewReport};
pub use state::{AxisLimit, LimitViolations, ObservatoryState, Phase};
