//! Observer hooks for arena instrumentation.
//!
//! An arena calls its observer at the entry/exit points of every mutating
//! operation. Observers only watch: nothing they do can change an outcome.
//! The observer is a type parameter, so the default [`NoOpObserver`]
//! compiles away entirely.

use std::panic::Location;
use std::time::SystemTime;

/// Receives notifications about arena activity.
///
/// Every method has an empty default, so implementors pick what they need.
pub trait ArenaObserver {
    /// The arena was constructed.
    fn on_create(
        &mut self,
        _capacity: usize,
        _cursor: usize,
        _created_at: SystemTime,
        _location: &'static Location<'static>,
    ) {
    }

    /// A fill succeeded; `cursor` is the new cursor.
    fn on_fill(&mut self, _requested: usize, _aligned: usize, _cursor: usize) {}

    /// A fill was refused.
    fn on_fill_failed(&mut self, _requested: usize) {}

    /// The arena was reset.
    fn on_reset(&mut self) {}

    /// The backing region was relocated to a new capacity.
    fn on_resize(&mut self, _old_capacity: usize, _new_capacity: usize) {}

    /// Bytes were copied in from another arena; `cursor` is the new cursor.
    fn on_transfer(&mut self, _bytes: usize, _cursor: usize) {}
}

/// Null object pattern: ignores every notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoOpObserver;

impl NoOpObserver {
    /// Create a new no-op observer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArenaObserver for NoOpObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_observer_is_zero_sized() {
        assert_eq!(std::mem::size_of::<NoOpObserver>(), 0);
    }

    #[test]
    fn noop_observer_accepts_everything() {
        let mut observer = NoOpObserver::new();
        observer.on_create(4096, 64, SystemTime::now(), Location::caller());
        observer.on_fill(3, 8, 72);
        observer.on_fill_failed(1 << 20);
        observer.on_reset();
        observer.on_resize(4096, 8192);
        observer.on_transfer(8, 80);
    }
}
