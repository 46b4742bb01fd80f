use serde::Serialize;

use super::area::Area;
use crate::error::ParkingError;
use crate::{AreaId, SlotId, ZoneId};

/// A zone owns its areas and knows which zones it borders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    id: ZoneId,
    areas: Vec<Area>,
    /// Insertion order is the fallback search order.
    adjacent: Vec<ZoneId>,
    next_slot_id: SlotId,
}

impl Zone {
    pub fn new(id: ZoneId, area_count: usize) -> Self {
        Self {
            id,
            areas: (0..area_count).map(|_| Area::unconfigured(id)).collect(),
            adjacent: Vec::new(),
            next_slot_id: 1,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn area(&self, index: usize) -> Option<&Area> {
        self.areas.get(index)
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Build the area at `index`. Slot ids continue from the zone's counter,
    /// so they stay unique within the zone even if an index is rebuilt. An
    /// area with allocated slots cannot be rebuilt.
    pub fn configure_area(
        &mut self,
        index: usize,
        area_id: AreaId,
        capacity: u32,
    ) -> Result<(), ParkingError> {
        let zone_id = self.id;
        let first_slot_id = self.next_slot_id;
        let area = self
            .areas
            .get_mut(index)
            .ok_or(ParkingError::AreaIndexOutOfRange { zone_id, index })?;
        if area.occupied_count() > 0 {
            return Err(ParkingError::ZoneInUse {
                zone_id,
                occupied: area.occupied_count(),
            });
        }

        *area = Area::new(area_id, zone_id, first_slot_id, capacity);
        self.next_slot_id += capacity;
        Ok(())
    }

    pub fn total_capacity(&self) -> u32 {
        self.areas.iter().map(Area::capacity).sum()
    }

    pub fn total_available(&self) -> u32 {
        self.areas.iter().map(Area::available_count).sum()
    }

    pub fn total_occupied(&self) -> u32 {
        self.total_capacity() - self.total_available()
    }

    /// First free slot scanning areas in order, then slots in order.
    pub(crate) fn claim_first_free(&mut self) -> Option<SlotId> {
        self.areas.iter_mut().find_map(Area::claim_first_free)
    }

    /// See [`Area::free`].
    pub(crate) fn free_slot(&mut self, slot_id: SlotId) -> Option<bool> {
        self.areas.iter_mut().find_map(|area| area.free(slot_id))
    }

    pub fn adjacent(&self) -> &[ZoneId] {
        &self.adjacent
    }

    pub fn is_adjacent_to(&self, zone_id: ZoneId) -> bool {
        self.adjacent.contains(&zone_id)
    }

    /// Record one direction of an edge. Duplicates and self-edges are ignored;
    /// returns whether the list changed.
    pub(crate) fn add_adjacent(&mut self, zone_id: ZoneId) -> bool {
        if zone_id == self.id || self.is_adjacent_to(zone_id) {
            return false;
        }
        self.adjacent.push(zone_id);
        true
    }

    pub(crate) fn inherit_adjacency(&mut self, previous: &Zone) {
        self.adjacent = previous.adjacent.clone();
    }
}
