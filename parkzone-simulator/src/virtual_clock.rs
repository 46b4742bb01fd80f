//! # Virtual Clock for Simulation
//!
//! A deterministic clock used in simulation and replay. Time is measured in
//! the same opaque units the parking system uses for request and release
//! times.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parkzone_core::Timestamp;

/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    now: Arc<AtomicI64>,
}

impl VirtualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    #[inline]
    pub fn now(&self) -> Timestamp {
        self.now.load(Ordering::Acquire)
    }

    /// Move time forward and return the new reading. Negative steps are
    /// ignored, so readings never go backwards.
    #[inline]
    pub fn advance(&self, ticks: i64) -> Timestamp {
        let ticks = ticks.max(0);
        self.now.fetch_add(ticks, Ordering::AcqRel) + ticks
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_given_time() {
        assert_eq!(VirtualClock::new(100).now(), 100);
    }

    #[test]
    fn advance_is_shared_between_clones() {
        let clock = VirtualClock::default();
        let view = clock.clone();
        assert_eq!(clock.advance(500), 500);
        clock.advance(250);
        assert_eq!(view.now(), 750);
    }

    #[test]
    fn never_runs_backwards() {
        let clock = VirtualClock::new(10);
        clock.advance(-5);
        assert_eq!(clock.now(), 10);
    }
}
