//! Tariff parameters applied when a stay is released.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct PricingConfig {
    /// Charge per elapsed time unit.
    #[serde(default = "default_per_unit_rate")]
    #[validate(range(max = 1_000_000))]
    pub per_unit_rate: u64,

    /// Flat surcharge for a slot granted outside the requested zone.
    #[serde(default = "default_cross_zone_penalty")]
    #[validate(range(max = 1_000_000))]
    pub cross_zone_penalty: u64,
}

fn default_per_unit_rate() -> u64 {
    10
}

fn default_cross_zone_penalty() -> u64 {
    50
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            per_unit_rate: default_per_unit_rate(),
            cross_zone_penalty: default_cross_zone_penalty(),
        }
    }
}
