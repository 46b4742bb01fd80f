//! Request lifecycle.
//!
//! ```text
//! REQUESTED ──allocate──▶ ALLOCATED ──occupy──▶ OCCUPIED ──release──▶ RELEASED
//!     │                       │
//!     └────────cancel─────────┴──────────────▶ CANCELLED
//! ```
//!
//! RELEASED and CANCELLED are terminal. A rejected command leaves the request
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParkingError;
use crate::{RequestId, Timestamp, ZoneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Requested,
    Allocated,
    Occupied,
    Released,
    Cancelled,
}

/// Lifecycle commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allocate,
    Occupy,
    Release,
    Cancel,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Released | RequestState::Cancelled)
    }

    /// The state `action` leads to, or `None` if the edge does not exist.
    pub fn next(self, action: Action) -> Option<RequestState> {
        use Action::*;
        use RequestState::*;

        match (self, action) {
            (Requested, Allocate) => Some(Allocated),
            (Allocated, Occupy) => Some(Occupied),
            (Occupied, Release) => Some(Released),
            (Requested | Allocated, Cancel) => Some(Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Requested => "REQUESTED",
            RequestState::Allocated => "ALLOCATED",
            RequestState::Occupied => "OCCUPIED",
            RequestState::Released => "RELEASED",
            RequestState::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Allocate => "allocate",
            Action::Occupy => "occupy",
            Action::Release => "release",
            Action::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    id: RequestId,
    vehicle_id: String,
    requested_zone: ZoneId,
    created_at: Timestamp,
    state: RequestState,
}

impl Request {
    pub fn new(
        id: RequestId,
        vehicle_id: impl Into<String>,
        requested_zone: ZoneId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            vehicle_id: vehicle_id.into(),
            requested_zone,
            created_at,
            state: RequestState::Requested,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn requested_zone(&self) -> ZoneId {
        self.requested_zone
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Whether `action` is legal right now.
    pub fn permits(&self, action: Action) -> bool {
        self.state.next(action).is_some()
    }

    /// The state `action` would lead to, without applying it.
    pub fn check(&self, action: Action) -> Result<RequestState, ParkingError> {
        self.state.next(action).ok_or(ParkingError::IllegalTransition {
            from: self.state,
            action,
        })
    }

    /// Apply `action`, returning the state that was left.
    pub fn apply(&mut self, action: Action) -> Result<RequestState, ParkingError> {
        let next = self.check(action)?;
        Ok(std::mem::replace(&mut self.state, next))
    }

    /// Move straight to CANCELLED regardless of the current state. Only
    /// rollback uses this.
    pub(crate) fn force_cancel(&mut self) -> RequestState {
        std::mem::replace(&mut self.state, RequestState::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [RequestState; 5] = [
        RequestState::Requested,
        RequestState::Allocated,
        RequestState::Occupied,
        RequestState::Released,
        RequestState::Cancelled,
    ];
    const ALL_ACTIONS: [Action; 4] = [Action::Allocate, Action::Occupy, Action::Release, Action::Cancel];

    #[test]
    fn happy_path() {
        let mut request = Request::new(1, "KHI-1001", 1, 100);
        assert_eq!(request.apply(Action::Allocate).unwrap(), RequestState::Requested);
        assert_eq!(request.apply(Action::Occupy).unwrap(), RequestState::Allocated);
        assert_eq!(request.apply(Action::Release).unwrap(), RequestState::Occupied);
        assert_eq!(request.state(), RequestState::Released);
    }

    #[test]
    fn occupy_before_allocate_is_rejected() {
        let mut request = Request::new(1, "KHI-1001", 1, 100);
        let err = request.apply(Action::Occupy).unwrap_err();
        assert!(matches!(
            err,
            ParkingError::IllegalTransition {
                from: RequestState::Requested,
                action: Action::Occupy
            }
        ));
        assert_eq!(request.state(), RequestState::Requested);
    }

    #[test]
    fn terminal_states_reject_everything() {
        for state in [RequestState::Released, RequestState::Cancelled] {
            assert!(state.is_terminal());
            for action in ALL_ACTIONS {
                assert_eq!(state.next(action), None);
            }
        }
    }

    #[test]
    fn transition_table_has_exactly_five_edges() {
        let edges = ALL_STATES
            .iter()
            .flat_map(|state| ALL_ACTIONS.iter().filter_map(move |a| state.next(*a)))
            .count();
        assert_eq!(edges, 5);
    }

    #[test]
    fn cancel_allowed_only_before_occupancy() {
        assert_eq!(
            RequestState::Requested.next(Action::Cancel),
            Some(RequestState::Cancelled)
        );
        assert_eq!(
            RequestState::Allocated.next(Action::Cancel),
            Some(RequestState::Cancelled)
        );
        assert_eq!(RequestState::Occupied.next(Action::Cancel), None);
    }

    #[test]
    fn force_cancel_bypasses_table() {
        let mut request = Request::new(3, "LHR-7", 2, 0);
        request.apply(Action::Allocate).unwrap();
        request.apply(Action::Occupy).unwrap();
        assert_eq!(request.force_cancel(), RequestState::Occupied);
        assert_eq!(request.state(), RequestState::Cancelled);
    }
}
