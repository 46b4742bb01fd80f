//! Scenario files.
//!
//! A scenario is a YAML list of events replayed in order against a parking
//! system. Requests are referred to by creation ordinal: `request: 0` is the
//! first `create` event of the scenario, whatever id the system handed out.
//!
//! ```yaml
//! name: spill-over
//! topology: empty
//! events:
//!   - event: setup_zone
//!     zone: 1
//!     areas: 1
//!   - event: setup_area
//!     zone: 1
//!     index: 0
//!     area: 101
//!     capacity: 1
//!   - event: create
//!     vehicle: KHI-1001
//!     zone: 1
//!   - event: allocate
//!     request: 0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use parkzone_core::{AreaId, Timestamp, ZoneId};

use crate::SimulationError;

/// What the system looks like before the first event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyBase {
    /// Zones, areas and adjacency from configuration.
    #[default]
    Configured,
    /// No zones; the scenario lays out its own.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topology: TopologyBase,
    /// Virtual time before the first event.
    #[serde(default)]
    pub start_time: Timestamp,
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScenarioEvent {
    SetupZone {
        zone: ZoneId,
        areas: usize,
    },
    SetupArea {
        zone: ZoneId,
        index: usize,
        area: AreaId,
        capacity: u32,
    },
    Adjacent {
        a: ZoneId,
        b: ZoneId,
    },
    /// Move virtual time forward.
    Advance {
        ticks: i64,
    },
    Create {
        vehicle: String,
        zone: ZoneId,
    },
    Allocate {
        request: usize,
    },
    Occupy {
        request: usize,
    },
    Release {
        request: usize,
    },
    Cancel {
        request: usize,
    },
    Rollback {
        #[serde(default = "one")]
        count: usize,
    },
}

fn one() -> usize {
    1
}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self, SimulationError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SimulationError::ScenarioNotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    pub fn to_yaml(&self) -> Result<String, SimulationError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_events_with_defaults() {
        let scenario = Scenario::from_yaml(
            r#"
events:
  - event: create
    vehicle: LHE-42
    zone: 2
  - event: advance
    ticks: 30
  - event: rollback
"#,
        )
        .unwrap();

        assert_eq!(scenario.topology, TopologyBase::Configured);
        assert_eq!(scenario.start_time, 0);
        assert_eq!(
            scenario.events,
            vec![
                ScenarioEvent::Create {
                    vehicle: "LHE-42".into(),
                    zone: 2
                },
                ScenarioEvent::Advance { ticks: 30 },
                ScenarioEvent::Rollback { count: 1 },
            ]
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let err = Scenario::from_yaml("events:\n  - event: teleport\n").unwrap_err();
        assert!(matches!(err, SimulationError::Scenario(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Scenario::load_from_file("no/such/scenario.yaml").unwrap_err();
        assert!(matches!(err, SimulationError::ScenarioNotFound(_)));
    }
}
