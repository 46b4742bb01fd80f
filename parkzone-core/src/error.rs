use serde::Serialize;
use thiserror::Error;

use parkzone_config::ConfigError;

use crate::request::{Action, RequestState};
use crate::{RequestId, SlotId, Timestamp, ZoneId};

/// Coarse classification of [`ParkingError`], for callers that only need to
/// know which family of failure they hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    CapacityExhausted,
    IllegalTransition,
    LedgerEmpty,
    /// Internal bookkeeping disagrees with itself. Reported, never fatal.
    Inconsistency,
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("request {0} is not active")]
    RequestNotFound(RequestId),

    #[error("zone {0} is not configured")]
    ZoneNotFound(ZoneId),

    #[error("slot {slot_id} does not exist in zone {zone_id}")]
    SlotNotFound { slot_id: SlotId, zone_id: ZoneId },

    #[error("zone {zone_id} has no area at index {index}")]
    AreaIndexOutOfRange { zone_id: ZoneId, index: usize },

    #[error("zone table is full ({0} zones)")]
    ZoneTableFull(usize),

    #[error("no free slot in zone {0} or its adjacent zones")]
    CapacityExhausted(ZoneId),

    #[error("cannot {action} a request that is {from}")]
    IllegalTransition { from: RequestState, action: Action },

    #[error("rollback ledger is empty")]
    LedgerEmpty,

    #[error("rollback count must be at least 1")]
    InvalidRollbackCount,

    #[error("request {0} has no allocation recorded in history")]
    MissingHistory(RequestId),

    #[error("release time {release_time} precedes request time {requested_at}")]
    ReleaseBeforeRequest {
        requested_at: Timestamp,
        release_time: Timestamp,
    },

    #[error("stay from {requested_at} to {release_time} is too long to measure")]
    DurationOverflow {
        requested_at: Timestamp,
        release_time: Timestamp,
    },

    #[error("zone {zone_id} still holds {occupied} allocated slots")]
    ZoneInUse { zone_id: ZoneId, occupied: u32 },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ParkingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParkingError::RequestNotFound(_)
            | ParkingError::ZoneNotFound(_)
            | ParkingError::SlotNotFound { .. }
            | ParkingError::AreaIndexOutOfRange { .. } => ErrorKind::NotFound,
            ParkingError::CapacityExhausted(_) | ParkingError::ZoneTableFull(_) => {
                ErrorKind::CapacityExhausted
            }
            ParkingError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            ParkingError::LedgerEmpty => ErrorKind::LedgerEmpty,
            ParkingError::MissingHistory(_) => ErrorKind::Inconsistency,
            ParkingError::InvalidRollbackCount
            | ParkingError::ReleaseBeforeRequest { .. }
            | ParkingError::DurationOverflow { .. }
            | ParkingError::ZoneInUse { .. }
            | ParkingError::Config(_) => ErrorKind::InvalidInput,
        }
    }
}
