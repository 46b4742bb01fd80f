use serde::Serialize;

use super::slot::Slot;
use crate::{AreaId, SlotId, ZoneId};

/// Fixed-capacity run of slots inside one zone.
///
/// The occupied counter is kept in step with the slot flags by routing every
/// mutation through [`Area::claim_first_free`] and [`Area::free`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Area {
    id: Option<AreaId>,
    zone_id: ZoneId,
    slots: Vec<Slot>,
    occupied: u32,
}

impl Area {
    /// Build an area whose slots are numbered `first_slot_id..first_slot_id + capacity`.
    pub fn new(id: AreaId, zone_id: ZoneId, first_slot_id: SlotId, capacity: u32) -> Self {
        let slots = (0..capacity)
            .map(|offset| Slot::new(first_slot_id + offset, zone_id))
            .collect();

        Self {
            id: Some(id),
            zone_id,
            slots,
            occupied: 0,
        }
    }

    /// Placeholder for an area index that has not been configured yet.
    pub fn unconfigured(zone_id: ZoneId) -> Self {
        Self {
            id: None,
            zone_id,
            slots: Vec::new(),
            occupied: 0,
        }
    }

    /// `None` until the area has been configured.
    pub fn id(&self) -> Option<AreaId> {
        self.id
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn is_configured(&self) -> bool {
        self.id.is_some()
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn occupied_count(&self) -> u32 {
        self.occupied
    }

    pub fn available_count(&self) -> u32 {
        self.capacity() - self.occupied
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.slots.iter().any(|slot| slot.id() == slot_id)
    }

    /// First-fit: take the lowest-index free slot.
    pub(crate) fn claim_first_free(&mut self) -> Option<SlotId> {
        let slot = self.slots.iter_mut().find(|slot| slot.is_free())?;
        slot.occupy();
        self.occupied += 1;
        Some(slot.id())
    }

    /// Mark a slot free. Returns `None` if the slot is not in this area and
    /// `Some(false)` if it was already free.
    pub(crate) fn free(&mut self, slot_id: SlotId) -> Option<bool> {
        let slot = self.slots.iter_mut().find(|slot| slot.id() == slot_id)?;
        if slot.is_free() {
            return Some(false);
        }
        slot.release();
        self.occupied -= 1;
        Some(true)
    }
}
