//! On-demand analytics.
//!
//! Request counters come from a full scan of the [`HistoryLog`]; occupancy is
//! read live from the [`ZoneTable`]. Nothing is cached.

use serde::Serialize;

use super::HistoryLog;
use crate::request::RequestState;
use crate::topology::{Zone, ZoneTable};
use crate::ZoneId;

const PARTIAL_THRESHOLD: f64 = 50.0;
const FULL_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub total_requests: usize,
    pub completed_requests: usize,
    pub cancelled_requests: usize,
    pub cross_zone_allocations: usize,
    /// Mean of `release_time - created_at` over completed stays; 0 if none.
    pub average_parking_duration: f64,
    /// Occupied / total slots across every zone, as a percentage.
    pub zone_utilization_rate: f64,
    pub total_revenue: u64,
}

/// Coarse occupancy band used by status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationBand {
    Available,
    Partial,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneUtilization {
    pub zone_id: ZoneId,
    pub occupied: u32,
    pub total: u32,
}

impl ZoneUtilization {
    fn of(zone: &Zone) -> Self {
        Self {
            zone_id: zone.id(),
            occupied: zone.total_occupied(),
            total: zone.total_capacity(),
        }
    }

    pub fn available(&self) -> u32 {
        self.total - self.occupied
    }

    /// Percentage occupied; 0 for a zone without slots.
    pub fn rate(&self) -> f64 {
        percentage(u64::from(self.occupied), u64::from(self.total))
    }

    pub fn band(&self) -> UtilizationBand {
        let rate = self.rate();
        if rate >= FULL_THRESHOLD {
            UtilizationBand::Full
        } else if rate >= PARTIAL_THRESHOLD {
            UtilizationBand::Partial
        } else {
            UtilizationBand::Available
        }
    }
}

impl HistoryLog {
    pub fn analytics(&self, zones: &ZoneTable) -> Analytics {
        let mut analytics = Analytics::default();
        let mut total_duration: i128 = 0;

        for record in self.iter() {
            analytics.total_requests += 1;

            if let Some(duration) = record.duration() {
                analytics.completed_requests += 1;
                total_duration += i128::from(duration);
                analytics.total_revenue = analytics
                    .total_revenue
                    .saturating_add(record.fee.unwrap_or(0));
            }
            if record.state() == RequestState::Cancelled {
                analytics.cancelled_requests += 1;
            }
            if record.cross_zone {
                analytics.cross_zone_allocations += 1;
            }
        }

        if analytics.completed_requests > 0 {
            analytics.average_parking_duration =
                total_duration as f64 / analytics.completed_requests as f64;
        }
        analytics.zone_utilization_rate =
            percentage(zones.total_occupied(), zones.total_capacity());

        analytics
    }
}

/// Per-zone occupancy in configured zone order.
pub fn zone_utilization(zones: &ZoneTable) -> Vec<ZoneUtilization> {
    zones.iter().map(ZoneUtilization::of).collect()
}

/// Zone with the most occupied slots; the earliest configured zone wins ties.
pub fn peak_usage_zone(zones: &ZoneTable) -> Option<ZoneId> {
    let mut peak: Option<(ZoneId, u32)> = None;
    for zone in zones.iter() {
        let occupied = zone.total_occupied();
        if peak.map_or(true, |(_, best)| occupied > best) {
            peak = Some((zone.id(), occupied));
        }
    }
    peak.map(|(zone_id, _)| zone_id)
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::AllocationEngine;

    fn table(capacities: &[(ZoneId, u32)]) -> ZoneTable {
        let mut zones = ZoneTable::with_capacity(capacities.len());
        for &(id, capacity) in capacities {
            zones.setup_zone(id, 1).unwrap();
            zones.setup_area(id, 0, id * 100, capacity).unwrap();
        }
        zones
    }

    #[test]
    fn empty_system_reports_zeroes() {
        let analytics = HistoryLog::new().analytics(&ZoneTable::with_capacity(0));
        assert_eq!(analytics, Analytics::default());
    }

    #[test]
    fn peak_zone_ties_go_to_first_configured() {
        let mut zones = table(&[(1, 4), (2, 4), (3, 4)]);
        let engine = AllocationEngine;
        engine.allocate(&mut zones, 2).unwrap();
        engine.allocate(&mut zones, 3).unwrap();
        assert_eq!(peak_usage_zone(&zones), Some(2));
        assert_eq!(peak_usage_zone(&table(&[(5, 1), (6, 1)])), Some(5));
        assert_eq!(peak_usage_zone(&ZoneTable::with_capacity(0)), None);
    }

    #[test]
    fn utilization_bands() {
        let mut zones = table(&[(1, 10)]);
        let engine = AllocationEngine;
        let band = |zones: &ZoneTable| zone_utilization(zones)[0].band();

        assert_eq!(band(&zones), UtilizationBand::Available);
        for _ in 0..5 {
            engine.allocate(&mut zones, 1).unwrap();
        }
        assert_eq!(band(&zones), UtilizationBand::Partial);
        for _ in 0..3 {
            engine.allocate(&mut zones, 1).unwrap();
        }
        assert_eq!(band(&zones), UtilizationBand::Full);

        let usage = &zone_utilization(&zones)[0];
        assert_eq!((usage.occupied, usage.total, usage.available()), (8, 10, 2));
        assert_eq!(usage.rate(), 80.0);
    }

    #[test]
    fn zero_capacity_zone_has_zero_rate() {
        let zones = table(&[(1, 0)]);
        assert_eq!(zone_utilization(&zones)[0].rate(), 0.0);
        assert_eq!(HistoryLog::new().analytics(&zones).zone_utilization_rate, 0.0);
    }
}
