//! Thread-safe handle to one observatory model.
//!
//! A scheduler typically prices many candidate targets between two state
//! changes. Pricing only needs a read lock, so candidates can be evaluated
//! from several threads at once; state changes take the write lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use obsmodel_types::{ObservationRecord, Target};

use crate::error::ObservatoryError;
use crate::model::ObservatoryModel;
use crate::site::{ObservingSite, SiteService};
use crate::state::ObservatoryState;

/// Cloneable, lock-guarded observatory model.
#[derive(Debug)]
pub struct SharedObservatory<S: SiteService = ObservingSite> {
    inner: Arc<RwLock<ObservatoryModel<S>>>,
}

impl<S: SiteService> Clone for SharedObservatory<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SiteService> SharedObservatory<S> {
    /// Wrap a configured model.
    pub fn new(model: ObservatoryModel<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    /// Run `f` with shared access to the model.
    pub fn read<R>(&self, f: impl FnOnce(&ObservatoryModel<S>) -> R) -> Result<R, ObservatoryError> {
        let guard = self.read_guard()?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access to the model.
    pub fn write<R>(&self, f: impl FnOnce(&mut ObservatoryModel<S>) -> R) -> Result<R, ObservatoryError> {
        let mut guard = self.write_guard()?;
        Ok(f(&mut guard))
    }

    /// Price a slew to `target` from the current state.
    pub fn get_slew_delay(&self, target: &Target) -> Result<f64, ObservatoryError> {
        self.read_guard()?.get_slew_delay(target)
    }

    /// Closed-form delays to many candidates at once.
    pub fn approximate_slew_delays(
        &self,
        targets: &[Target],
        lax_dome: bool,
    ) -> Result<Vec<Option<f64>>, ObservatoryError> {
        Ok(self.read_guard()?.approximate_slew_delays(targets, lax_dome))
    }

    /// Copy of the current state.
    pub fn state(&self) -> Result<ObservatoryState, ObservatoryError> {
        Ok(self.read_guard()?.state().clone())
    }

    /// One-line rendering of the current state.
    pub fn snapshot(&self) -> Result<String, ObservatoryError> {
        Ok(self.read_guard()?.snapshot())
    }

    /// Advance the clock.
    pub fn update_state(&self, time: f64) -> Result<(), ObservatoryError> {
        self.write_guard()?.update_state(time)
    }

    /// Slew to and observe `target`.
    pub fn observe(&self, target: &Target) -> Result<ObservationRecord, ObservatoryError> {
        self.write_guard()?.observe(target)
    }

    /// Park the observatory.
    pub fn park(&self) -> Result<f64, ObservatoryError> {
        self.write_guard()?.park()
    }

    /// Return to park without slewing.
    pub fn reset(&self) -> Result<(), ObservatoryError> {
        self.write_guard()?.reset();
        Ok(())
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ObservatoryModel<S>>, ObservatoryError> {
        self.inner.read().map_err(|_poisoned| ObservatoryError::LockPoisoned)
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ObservatoryModel<S>>, ObservatoryError> {
        self.inner.write().map_err(|_poisoned| ObservatoryError::LockPoisoned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::thread;

    use obsmodel_types::Filter;

    use super::*;
    use crate::config::ObservatoryConfig;

    fn shared() -> SharedObservatory {
        let model = ObservatoryModel::configure(ObservatoryConfig::default(), ObservingSite::lsst()).unwrap();
        SharedObservatory::new(model)
    }

    #[test]
    fn concurrent_pricing_agrees() {
        let observatory = shared();
        observatory.update_state(1_672_542_000.0).unwrap();
        let target = Target::from_degrees(1, Filter::R, 0.0, -90.0, 0.0, vec![15.0, 15.0]).unwrap();
        let expected = observatory.get_slew_delay(&target).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let observatory = observatory.clone();
                let target = target.clone();
                thread::spawn(move || observatory.get_slew_delay(&target).unwrap())
            })
            .collect();
        for handle in handles {
            assert!((handle.join().unwrap() - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn writes_are_visible_to_clones() {
        let observatory = shared();
        let other = observatory.clone();
        observatory.update_state(500.0).unwrap();
        assert!((other.state().unwrap().time - 500.0).abs() < f64::EPSILON);
        assert!(other.snapshot().unwrap().starts_with("t=500.0 "));
        let parked = other.read(|model| model.state().parked()).unwrap();
        assert!(parked);
        let delay = observatory.write(ObservatoryModel::park).unwrap().unwrap();
        assert!(delay.abs() < f64::EPSILON);
    }

    #[test]
    fn reset_through_a_clone() {
        let observatory = shared();
        observatory.update_state(1_672_542_000.0).unwrap();
        let target = Target::from_degrees(1, Filter::R, 0.0, -90.0, 0.0, vec![15.0]).unwrap();
        let approximate = observatory.approximate_slew_delays(&[target.clone()], false).unwrap();
        observatory.observe(&target).unwrap();
        assert!(!observatory.state().unwrap().parked());

        observatory.clone().reset().unwrap();
        assert!(observatory.state().unwrap().parked());
        let again = observatory.approximate_slew_delays(&[target], false).unwrap();
        assert!((again[0].unwrap() - approximate[0].unwrap()).abs() < 1e-6);
    }
}
