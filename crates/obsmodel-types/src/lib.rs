//! Shared type definitions for the observatory slew model.
//!
//! These types cross crate boundaries: the scheduler hands the engine a
//! [`Target`], the engine answers with timings keyed by [`ActivityKind`] and
//! an [`ObservationRecord`] once a visit is complete.
//!
//! # Modules
//!
//! - [`filter`] -- Filter band identifiers
//! - [`activity`] -- The closed set of slew activities
//! - [`target`] -- Scheduler targets and observation records

pub mod activity;
pub mod filter;
pub mod target;

pub use activity::ActivityKind;
pub use filter::{Filter, ParseFilterError};
pub use target::{ObservationRecord, Target, TargetError, epoch_to_utc};
