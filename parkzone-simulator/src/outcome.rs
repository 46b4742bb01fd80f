//! Per-step outcomes shared by the random simulator and scenario replay.
//!
//! The `Display` form of an outcome is what gets folded into the state hash,
//! so it must stay stable across releases.

use std::fmt;

use serde::Serialize;

use parkzone_core::alloc::Allocation;
use parkzone_core::{ErrorKind, ParkingError, RequestId, RollbackOutcome, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Configured,
    Advanced { now: Timestamp },
    Created { request_id: RequestId },
    Allocated(Allocation),
    Occupied,
    Released { fee: u64 },
    Cancelled,
    /// Requests whose allocations were undone, newest first.
    RolledBack { requests: Vec<RequestId> },
    Rejected { kind: ErrorKind, reason: String },
}

impl StepOutcome {
    pub fn rolled_back(outcomes: &[RollbackOutcome]) -> Self {
        StepOutcome::RolledBack {
            requests: outcomes.iter().map(|o| o.operation.request_id).collect(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, StepOutcome::Rejected { .. })
    }
}

impl From<&ParkingError> for StepOutcome {
    fn from(err: &ParkingError) -> Self {
        StepOutcome::Rejected {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

/// Fold a command result into an outcome.
pub fn settle<T>(
    result: Result<T, ParkingError>,
    on_success: impl FnOnce(T) -> StepOutcome,
) -> StepOutcome {
    match result {
        Ok(value) => on_success(value),
        Err(err) => StepOutcome::from(&err),
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Configured => write!(f, "configured"),
            StepOutcome::Advanced { now } => write!(f, "advanced to {now}"),
            StepOutcome::Created { request_id } => write!(f, "created #{request_id}"),
            StepOutcome::Allocated(allocation) => write!(
                f,
                "allocated slot {} in zone {}{}",
                allocation.slot_id,
                allocation.zone_id,
                if allocation.cross_zone { " (cross-zone)" } else { "" }
            ),
            StepOutcome::Occupied => write!(f, "occupied"),
            StepOutcome::Released { fee } => write!(f, "released, fee {fee}"),
            StepOutcome::Cancelled => write!(f, "cancelled"),
            StepOutcome::RolledBack { requests } => write!(f, "rolled back {requests:?}"),
            StepOutcome::Rejected { reason, .. } => write!(f, "rejected: {reason}"),
        }
    }
}

/// Running tally of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounters {
    pub created: u64,
    pub allocated: u64,
    pub cross_zone: u64,
    pub occupied: u64,
    pub released: u64,
    pub cancelled: u64,
    pub rolled_back: u64,
    pub rejected: u64,
    pub capacity_exhausted: u64,
}

impl OutcomeCounters {
    pub fn record(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Configured | StepOutcome::Advanced { .. } => {}
            StepOutcome::Created { .. } => self.created += 1,
            StepOutcome::Allocated(allocation) => {
                self.allocated += 1;
                if allocation.cross_zone {
                    self.cross_zone += 1;
                }
            }
            StepOutcome::Occupied => self.occupied += 1,
            StepOutcome::Released { .. } => self.released += 1,
            StepOutcome::Cancelled => self.cancelled += 1,
            StepOutcome::RolledBack { requests } => self.rolled_back += requests.len() as u64,
            StepOutcome::Rejected { kind, .. } => {
                self.rejected += 1;
                if *kind == ErrorKind::CapacityExhausted {
                    self.capacity_exhausted += 1;
                }
            }
        }
    }
}
