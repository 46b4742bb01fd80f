//! Pricing of completed stays.

use parkzone_config::PricingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tariff {
    pub per_unit_rate: u64,
    pub cross_zone_penalty: u64,
}

impl Tariff {
    pub fn new(per_unit_rate: u64, cross_zone_penalty: u64) -> Self {
        Self {
            per_unit_rate,
            cross_zone_penalty,
        }
    }

    /// `duration × rate`, plus the surcharge for a cross-zone slot.
    pub fn fee(&self, duration: i64, cross_zone: bool) -> u64 {
        let base = (duration.max(0) as u64).saturating_mul(self.per_unit_rate);
        if cross_zone {
            base.saturating_add(self.cross_zone_penalty)
        } else {
            base
        }
    }
}

impl From<&PricingConfig> for Tariff {
    fn from(config: &PricingConfig) -> Self {
        Self::new(config.per_unit_rate, config.cross_zone_penalty)
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self::from(&PricingConfig::default())
    }
}
