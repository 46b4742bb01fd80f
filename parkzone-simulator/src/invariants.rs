//! Whole-system invariants checked between simulated events.

use thiserror::Error;

use parkzone_core::request::RequestState;
use parkzone_core::{ParkingSystem, RequestId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{occupied} slots are occupied but {holding} active requests hold one")]
    OccupancyMismatch { occupied: u64, holding: u64 },

    #[error("active request {0} is already {1}")]
    TerminalRequestActive(RequestId, RequestState),

    #[error("ledger holds {len} entries, capacity is {capacity}")]
    LedgerOverflow { len: usize, capacity: usize },

    #[error("total requests fell from {before} to {after}")]
    HistoryShrank { before: usize, after: usize },
}

/// Carries what must be compared across checks.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    last_total_requests: usize,
}

impl InvariantChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, system: &ParkingSystem) -> Result<(), InvariantViolation> {
        let mut holding = 0u64;
        for request in system.active_requests() {
            let state = request.state();
            if state.is_terminal() {
                return Err(InvariantViolation::TerminalRequestActive(request.id(), state));
            }
            if matches!(state, RequestState::Allocated | RequestState::Occupied) {
                holding += 1;
            }
        }

        let occupied = system.zones().total_occupied();
        if occupied != holding {
            return Err(InvariantViolation::OccupancyMismatch { occupied, holding });
        }

        let ledger = system.ledger();
        if ledger.len() > ledger.capacity() {
            return Err(InvariantViolation::LedgerOverflow {
                len: ledger.len(),
                capacity: ledger.capacity(),
            });
        }

        let total = system.analytics().total_requests;
        if total < self.last_total_requests {
            return Err(InvariantViolation::HistoryShrank {
                before: self.last_total_requests,
                after: total,
            });
        }
        self.last_total_requests = total;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_system_is_consistent() {
        let mut system = ParkingSystem::new(1);
        system.setup_zone(1, 1).unwrap();
        system.setup_area(1, 0, 101, 3).unwrap();
        let id = system.create_request("A", 1, 0).unwrap();
        system.allocate(id).unwrap();

        let mut checker = InvariantChecker::new();
        assert_eq!(checker.check(&system), Ok(()));
    }
}
