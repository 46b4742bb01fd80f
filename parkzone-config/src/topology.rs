//! Zone layout configuration.
//!
//! Describes the zones, their areas and the adjacency edges used for
//! cross-zone fallback. Field-level limits are enforced by `validator`;
//! the cross-referencing rules live in [`TopologyConfig::check`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ConfigError;

/// Full zone layout.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TopologyConfig {
    /// Upper bound on the number of zones the system will accept.
    #[serde(default = "default_max_zones")]
    #[validate(range(min = 1, max = 1024))]
    pub max_zones: usize,

    /// Zones in their configured order. Order decides peak-zone ties.
    #[serde(default = "default_zones")]
    #[validate(nested)]
    pub zones: Vec<ZoneLayout>,

    /// Undirected adjacency edges; each pair is applied in both directions.
    #[serde(default = "default_adjacency")]
    pub adjacency: Vec<[u32; 2]>,
}

/// One zone and its areas.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ZoneLayout {
    pub id: u32,

    #[validate(length(min = 1, max = 256))]
    #[validate(nested)]
    pub areas: Vec<AreaLayout>,
}

/// One fixed-capacity area.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct AreaLayout {
    pub id: u32,

    /// Number of slots; fixed once the area is built.
    #[validate(range(min = 1, max = 100_000))]
    pub capacity: u32,
}

fn default_max_zones() -> usize {
    8
}

fn default_zones() -> Vec<ZoneLayout> {
    vec![
        ZoneLayout {
            id: 1,
            areas: vec![
                AreaLayout { id: 101, capacity: 5 },
                AreaLayout { id: 102, capacity: 5 },
            ],
        },
        ZoneLayout {
            id: 2,
            areas: vec![AreaLayout { id: 201, capacity: 8 }],
        },
        ZoneLayout {
            id: 3,
            areas: vec![AreaLayout { id: 301, capacity: 6 }],
        },
    ]
}

fn default_adjacency() -> Vec<[u32; 2]> {
    vec![[1, 2], [2, 3]]
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_zones: default_max_zones(),
            zones: default_zones(),
            adjacency: default_adjacency(),
        }
    }
}

impl TopologyConfig {
    /// Cross-reference checks that `validator` cannot express.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.zones.len() > self.max_zones {
            return Err(ConfigError::Topology(format!(
                "{} zones configured but max_zones is {}",
                self.zones.len(),
                self.max_zones
            )));
        }

        let mut zone_ids = HashSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id) {
                return Err(ConfigError::Topology(format!(
                    "duplicate zone id {}",
                    zone.id
                )));
            }

            let mut area_ids = HashSet::new();
            for area in &zone.areas {
                if !area_ids.insert(area.id) {
                    return Err(ConfigError::Topology(format!(
                        "duplicate area id {} in zone {}",
                        area.id, zone.id
                    )));
                }
            }
        }

        for [a, b] in &self.adjacency {
            if a == b {
                return Err(ConfigError::Topology(format!(
                    "zone {a} cannot be adjacent to itself"
                )));
            }
            for endpoint in [a, b] {
                if !zone_ids.contains(endpoint) {
                    return Err(ConfigError::Topology(format!(
                        "adjacency references unknown zone {endpoint}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Total slot count across every configured area.
    pub fn total_capacity(&self) -> u64 {
        self.zones
            .iter()
            .flat_map(|zone| zone.areas.iter())
            .map(|area| u64::from(area.capacity))
            .sum()
    }
}
