use serde::Serialize;

use crate::{SlotId, ZoneId};

/// The atomic allocatable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    id: SlotId,
    zone_id: ZoneId,
    free: bool,
}

impl Slot {
    pub fn new(id: SlotId, zone_id: ZoneId) -> Self {
        Self {
            id,
            zone_id,
            free: true,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn is_free(&self) -> bool {
        self.free
    }

    pub(crate) fn occupy(&mut self) {
        self.free = false;
    }

    pub(crate) fn release(&mut self) {
        self.free = true;
    }
}
