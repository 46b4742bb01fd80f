//! ## parkzone-core::topology
//! **Zone → Area → Slot capacity bookkeeping**
//!
//! The [`ZoneTable`] is the single owner of every zone. Zones are kept in
//! configuration order, which is the tie-break order for peak-usage queries.
//! Adjacency is always written in both directions through
//! [`ZoneTable::connect`], so every edge is symmetric.

pub mod area;
pub mod slot;
pub mod zone;

pub use area::Area;
pub use slot::Slot;
pub use zone::Zone;

use tracing::debug;

use crate::error::ParkingError;
use crate::{AreaId, ZoneId};

#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: Vec<Zone>,
    max_zones: usize,
}

impl ZoneTable {
    pub fn with_capacity(max_zones: usize) -> Self {
        Self {
            zones: Vec::with_capacity(max_zones),
            max_zones,
        }
    }

    /// Create a zone with `area_count` unconfigured areas.
    ///
    /// An id that already exists is rebuilt in place; its edges are kept so
    /// the neighbours' back-references stay valid. A zone with allocated
    /// slots is left untouched.
    pub fn setup_zone(&mut self, zone_id: ZoneId, area_count: usize) -> Result<(), ParkingError> {
        let mut zone = Zone::new(zone_id, area_count);

        if let Some(existing) = self.get_mut(zone_id) {
            let occupied = existing.total_occupied();
            if occupied > 0 {
                return Err(ParkingError::ZoneInUse { zone_id, occupied });
            }
            debug!(zone_id, area_count, "Rebuilding zone");
            zone.inherit_adjacency(existing);
            *existing = zone;
            return Ok(());
        }

        if self.zones.len() >= self.max_zones {
            return Err(ParkingError::ZoneTableFull(self.max_zones));
        }

        debug!(zone_id, area_count, "Adding zone");
        self.zones.push(zone);
        Ok(())
    }

    pub fn setup_area(
        &mut self,
        zone_id: ZoneId,
        area_index: usize,
        area_id: AreaId,
        capacity: u32,
    ) -> Result<(), ParkingError> {
        self.get_mut(zone_id)
            .ok_or(ParkingError::ZoneNotFound(zone_id))?
            .configure_area(area_index, area_id, capacity)
    }

    /// Add the undirected edge `a — b`.
    pub fn connect(&mut self, a: ZoneId, b: ZoneId) -> Result<(), ParkingError> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(ParkingError::ZoneNotFound(id));
            }
        }

        if let Some(zone) = self.get_mut(a) {
            zone.add_adjacent(b);
        }
        if let Some(zone) = self.get_mut(b) {
            zone.add_adjacent(a);
        }
        Ok(())
    }

    pub fn contains(&self, zone_id: ZoneId) -> bool {
        self.get(zone_id).is_some()
    }

    pub fn get(&self, zone_id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id() == zone_id)
    }

    pub fn get_mut(&mut self, zone_id: ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|zone| zone.id() == zone_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn max_zones(&self) -> usize {
        self.max_zones
    }

    pub fn total_capacity(&self) -> u64 {
        self.zones
            .iter()
            .map(|zone| u64::from(zone.total_capacity()))
            .sum()
    }

    pub fn total_occupied(&self) -> u64 {
        self.zones
            .iter()
            .map(|zone| u64::from(zone.total_occupied()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_symmetric() {
        let mut table = ZoneTable::with_capacity(3);
        table.setup_zone(1, 1).unwrap();
        table.setup_zone(2, 1).unwrap();
        table.connect(1, 2).unwrap();
        table.connect(2, 1).unwrap();

        assert_eq!(table.get(1).unwrap().adjacent(), &[2]);
        assert_eq!(table.get(2).unwrap().adjacent(), &[1]);
    }

    #[test]
    fn connect_requires_both_zones() {
        let mut table = ZoneTable::with_capacity(3);
        table.setup_zone(1, 1).unwrap();
        assert!(matches!(
            table.connect(1, 9),
            Err(ParkingError::ZoneNotFound(9))
        ));
        assert!(table.get(1).unwrap().adjacent().is_empty());
    }

    #[test]
    fn table_is_bounded() {
        let mut table = ZoneTable::with_capacity(1);
        table.setup_zone(1, 1).unwrap();
        assert!(matches!(
            table.setup_zone(2, 1),
            Err(ParkingError::ZoneTableFull(1))
        ));
        // Rebuilding an existing id does not count against the bound.
        table.setup_zone(1, 2).unwrap();
        assert_eq!(table.get(1).unwrap().area_count(), 2);
    }

    #[test]
    fn rebuilding_a_zone_keeps_its_edges() {
        let mut table = ZoneTable::with_capacity(2);
        table.setup_zone(1, 1).unwrap();
        table.setup_zone(2, 1).unwrap();
        table.connect(1, 2).unwrap();
        table.setup_zone(1, 3).unwrap();
        assert!(table.get(1).unwrap().is_adjacent_to(2));
        assert!(table.get(2).unwrap().is_adjacent_to(1));
    }

    #[test]
    fn setup_area_on_unknown_zone_fails() {
        let mut table = ZoneTable::with_capacity(1);
        assert!(matches!(
            table.setup_area(5, 0, 501, 3),
            Err(ParkingError::ZoneNotFound(5))
        ));
    }
}
