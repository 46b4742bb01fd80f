//! Allocation engine.
//!
//! Search order for a request targeting zone `Z`:
//! 1. `Z`'s areas in order, each area's slots in index order (first fit).
//! 2. `Z`'s neighbours in the order the edges were added, same first-fit scan.
//!
//! The fallback is one hop only. A neighbour's neighbours are never searched.

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::ParkingError;
use crate::topology::ZoneTable;
use crate::{SlotId, ZoneId};

/// Where a request ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub slot_id: SlotId,
    pub zone_id: ZoneId,
    /// Granted by a neighbour rather than the requested zone.
    pub cross_zone: bool,
}

/// Stateless search over a [`ZoneTable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AllocationEngine;

impl AllocationEngine {
    /// Claim a slot for a request targeting `requested`.
    ///
    /// Running out of slots is an ordinary outcome and is reported as
    /// [`ParkingError::CapacityExhausted`].
    pub fn allocate(
        &self,
        zones: &mut ZoneTable,
        requested: ZoneId,
    ) -> Result<Allocation, ParkingError> {
        let zone = zones
            .get_mut(requested)
            .ok_or(ParkingError::ZoneNotFound(requested))?;

        if let Some(slot_id) = zone.claim_first_free() {
            debug!(zone_id = requested, slot_id, "Allocated in requested zone");
            return Ok(Allocation {
                slot_id,
                zone_id: requested,
                cross_zone: false,
            });
        }

        let neighbours = zone.adjacent().to_vec();
        trace!(zone_id = requested, ?neighbours, "Requested zone full, trying neighbours");

        for neighbour in neighbours {
            let Some(zone) = zones.get_mut(neighbour) else {
                continue;
            };
            if let Some(slot_id) = zone.claim_first_free() {
                debug!(
                    requested_zone = requested,
                    zone_id = neighbour,
                    slot_id,
                    "Allocated in adjacent zone"
                );
                return Ok(Allocation {
                    slot_id,
                    zone_id: neighbour,
                    cross_zone: true,
                });
            }
        }

        Err(ParkingError::CapacityExhausted(requested))
    }

    /// Return a slot to its zone.
    ///
    /// Freeing an already-free slot changes nothing and yields `Ok(false)`;
    /// callers use that to avoid crediting the same slot twice.
    pub fn free(
        &self,
        zones: &mut ZoneTable,
        slot_id: SlotId,
        zone_id: ZoneId,
    ) -> Result<bool, ParkingError> {
        let zone = zones
            .get_mut(zone_id)
            .ok_or(ParkingError::ZoneNotFound(zone_id))?;

        let freed = zone
            .free_slot(slot_id)
            .ok_or(ParkingError::SlotNotFound { slot_id, zone_id })?;
        trace!(zone_id, slot_id, freed, "Freed slot");
        Ok(freed)
    }
}
