use std::path::PathBuf;

use thiserror::Error;

use parkzone_config::ConfigError;
use parkzone_core::ParkingError;

use crate::invariants::InvariantViolation;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("parking system error: {0}")]
    Parking(#[from] ParkingError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scenario file not found: {0}")]
    ScenarioNotFound(PathBuf),

    #[error("malformed scenario: {0}")]
    Scenario(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("step {step} refers to request #{ordinal}, but only {created} were created")]
    UnknownRequest {
        step: usize,
        ordinal: usize,
        created: usize,
    },

    #[error("state hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("invariant violated after event {event}: {violation}")]
    Invariant {
        event: usize,
        violation: InvariantViolation,
    },
}
