//! Parking system: the orchestrator over topology, engine, ledger and history.
//!
//! Each lifecycle command validates the request's state first and only then
//! touches slots, the ledger or the history, so a rejected command leaves
//! everything as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use parkzone_config::ParkzoneConfig;
use parkzone_telemetry::{EventLogger, MetricsRecorder};

use crate::alloc::{Allocation, AllocationEngine};
use crate::error::ParkingError;
use crate::history::analytics::{peak_usage_zone, zone_utilization};
use crate::history::{Analytics, HistoryLog, HistoryRecord, SlotRef, ZoneUtilization};
use crate::ledger::{AllocationOperation, RollbackLedger};
use crate::request::{Action, Request, RequestState};
use crate::tariff::Tariff;
use crate::topology::{Zone, ZoneTable};
use crate::{AreaId, RequestId, Timestamp, ZoneId};

/// What a single rollback did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackOutcome {
    pub operation: AllocationOperation,
    /// State the request was forced out of, or `None` if it had already
    /// finished and left the active set.
    pub prior_state: Option<RequestState>,
    pub slot_freed: bool,
}

pub struct ParkingSystem {
    zones: ZoneTable,
    engine: AllocationEngine,
    ledger: RollbackLedger,
    history: HistoryLog,
    /// Requests not yet in a terminal state.
    active: BTreeMap<RequestId, Request>,
    next_request_id: RequestId,
    tariff: Tariff,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl ParkingSystem {
    /// Empty system accepting up to `max_zones` zones.
    pub fn new(max_zones: usize) -> Self {
        Self {
            zones: ZoneTable::with_capacity(max_zones),
            engine: AllocationEngine,
            ledger: RollbackLedger::default(),
            history: HistoryLog::new(),
            active: BTreeMap::new(),
            next_request_id: 1,
            tariff: Tariff::default(),
            metrics: None,
        }
    }

    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger = RollbackLedger::with_capacity(capacity);
        self
    }

    pub fn with_tariff(mut self, tariff: Tariff) -> Self {
        self.tariff = tariff;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build and lay out a system from validated configuration.
    pub fn from_config(config: &ParkzoneConfig) -> Result<Self, ParkingError> {
        config.check()?;

        let topology = &config.topology;
        let mut system = Self::new(topology.max_zones)
            .with_ledger_capacity(config.ledger.capacity)
            .with_tariff(Tariff::from(&config.pricing));

        for zone in &topology.zones {
            system.setup_zone(zone.id, zone.areas.len())?;
            for (index, area) in zone.areas.iter().enumerate() {
                system.setup_area(zone.id, index, area.id, area.capacity)?;
            }
        }
        for [a, b] in &topology.adjacency {
            system.add_zone_adjacency(*a, *b)?;
        }

        info!(
            zones = system.zones.len(),
            slots = system.zones.total_capacity(),
            "Parking system ready"
        );
        Ok(system)
    }

    // -- setup ------------------------------------------------------------
    //
    // Topology changes are meant for start-up. A zone or area is only rebuilt
    // while none of its slots are allocated.

    pub fn setup_zone(&mut self, zone_id: ZoneId, area_count: usize) -> Result<(), ParkingError> {
        self.zones.setup_zone(zone_id, area_count)
    }

    pub fn setup_area(
        &mut self,
        zone_id: ZoneId,
        area_index: usize,
        area_id: AreaId,
        slot_capacity: u32,
    ) -> Result<(), ParkingError> {
        self.zones
            .setup_area(zone_id, area_index, area_id, slot_capacity)?;
        self.sync_occupancy();
        Ok(())
    }

    pub fn add_zone_adjacency(&mut self, a: ZoneId, b: ZoneId) -> Result<(), ParkingError> {
        self.zones.connect(a, b)
    }

    // -- lifecycle --------------------------------------------------------

    #[instrument(skip(self))]
    pub fn create_request(
        &mut self,
        vehicle_id: &str,
        requested_zone: ZoneId,
        request_time: Timestamp,
    ) -> Result<RequestId, ParkingError> {
        if !self.zones.contains(requested_zone) {
            warn!("Request targets an unknown zone");
            return Err(ParkingError::ZoneNotFound(requested_zone));
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.active.insert(
            request_id,
            Request::new(request_id, vehicle_id, requested_zone, request_time),
        );

        observe(&self.metrics, |m| m.inc_requests());
        debug!(request_id, "Request created");
        Ok(request_id)
    }

    #[instrument(skip(self))]
    pub fn allocate(&mut self, request_id: RequestId) -> Result<Allocation, ParkingError> {
        let request = self
            .active
            .get_mut(&request_id)
            .ok_or(ParkingError::RequestNotFound(request_id))?;
        request.check(Action::Allocate)?;

        let allocation = match self.engine.allocate(&mut self.zones, request.requested_zone()) {
            Ok(allocation) => allocation,
            Err(err) => {
                warn!(zone_id = request.requested_zone(), "Allocation failed: {err}");
                if matches!(err, ParkingError::CapacityExhausted(_)) {
                    observe(&self.metrics, |m| m.inc_allocation_failures());
                }
                return Err(err);
            }
        };

        let previous_state = request.apply(Action::Allocate)?;
        let snapshot = request.clone();

        let evicted = self.ledger.push(AllocationOperation {
            request_id,
            vehicle_id: snapshot.vehicle_id().to_string(),
            slot_id: allocation.slot_id,
            zone_id: allocation.zone_id,
            timestamp: snapshot.created_at(),
            previous_state,
            new_state: snapshot.state(),
        });
        if let Some(evicted) = evicted {
            debug!(
                evicted_request = evicted.request_id,
                "Ledger full, oldest undo point dropped"
            );
        }

        EventLogger::log_event(
            "allocated",
            &[
                KeyValue::new("request_id", request_id as i64),
                KeyValue::new("vehicle_id", snapshot.vehicle_id().to_string()),
                KeyValue::new("zone_id", i64::from(allocation.zone_id)),
                KeyValue::new("slot_id", i64::from(allocation.slot_id)),
                KeyValue::new("cross_zone", allocation.cross_zone),
            ],
        );
        self.history.append(HistoryRecord::allocated(
            snapshot,
            SlotRef {
                slot_id: allocation.slot_id,
                zone_id: allocation.zone_id,
            },
            allocation.cross_zone,
        ));

        observe(&self.metrics, |m| m.inc_allocations(allocation.cross_zone));
        self.sync_occupancy();
        info!(
            zone_id = allocation.zone_id,
            slot_id = allocation.slot_id,
            cross_zone = allocation.cross_zone,
            "Request allocated"
        );
        Ok(allocation)
    }

    #[instrument(skip(self))]
    pub fn occupy(&mut self, request_id: RequestId) -> Result<(), ParkingError> {
        let request = self
            .active
            .get_mut(&request_id)
            .ok_or(ParkingError::RequestNotFound(request_id))?;
        request.check(Action::Occupy)?;

        let Some(record) = self.history.find_mut(request_id) else {
            error!("Allocated request has no history record");
            return Err(ParkingError::MissingHistory(request_id));
        };

        request.apply(Action::Occupy)?;
        record.request = request.clone();

        EventLogger::log_event(
            "occupied",
            &[KeyValue::new("request_id", request_id as i64)],
        );
        info!("Slot occupied");
        Ok(())
    }

    /// Finish a stay, returning the fee charged for it.
    #[instrument(skip(self))]
    pub fn release(
        &mut self,
        request_id: RequestId,
        release_time: Timestamp,
    ) -> Result<u64, ParkingError> {
        let request = self
            .active
            .get_mut(&request_id)
            .ok_or(ParkingError::RequestNotFound(request_id))?;
        request.check(Action::Release)?;

        if release_time < request.created_at() {
            return Err(ParkingError::ReleaseBeforeRequest {
                requested_at: request.created_at(),
                release_time,
            });
        }
        let duration = release_time.checked_sub(request.created_at()).ok_or(
            ParkingError::DurationOverflow {
                requested_at: request.created_at(),
                release_time,
            },
        )?;

        let Some(record) = self.history.find_mut(request_id) else {
            error!("Occupied request has no history record");
            return Err(ParkingError::MissingHistory(request_id));
        };
        let Some(slot) = record.allocation else {
            error!("History record for occupied request carries no slot");
            return Err(ParkingError::MissingHistory(request_id));
        };

        let freed = self
            .engine
            .free(&mut self.zones, slot.slot_id, slot.zone_id)
            .inspect_err(|err| error!("Could not free slot on release: {err}"))?;
        if !freed {
            warn!(slot_id = slot.slot_id, zone_id = slot.zone_id, "Released slot was already free");
        }

        request.apply(Action::Release)?;
        let fee = self.tariff.fee(duration, record.cross_zone);

        record.request = request.clone();
        record.release_time = Some(release_time);
        record.fee = Some(fee);
        self.active.remove(&request_id);

        observe(&self.metrics, |m| m.observe_release(duration));
        self.sync_occupancy();
        EventLogger::log_event(
            "released",
            &[
                KeyValue::new("request_id", request_id as i64),
                KeyValue::new("duration", duration),
                KeyValue::new("fee", fee as i64),
            ],
        );
        info!(duration, fee, "Request released");
        Ok(fee)
    }

    #[instrument(skip(self))]
    pub fn cancel(&mut self, request_id: RequestId) -> Result<(), ParkingError> {
        let request = self
            .active
            .get_mut(&request_id)
            .ok_or(ParkingError::RequestNotFound(request_id))?;
        request.check(Action::Cancel)?;

        if request.state() == RequestState::Allocated {
            let Some(record) = self.history.find_mut(request_id) else {
                error!("Allocated request has no history record");
                return Err(ParkingError::MissingHistory(request_id));
            };
            let Some(slot) = record.allocation else {
                error!("History record for allocated request carries no slot");
                return Err(ParkingError::MissingHistory(request_id));
            };

            self.engine
                .free(&mut self.zones, slot.slot_id, slot.zone_id)
                .inspect_err(|err| error!("Could not free slot on cancel: {err}"))?;
            request.apply(Action::Cancel)?;
            record.request = request.clone();
        } else {
            // Never allocated, so there is no record to update yet.
            request.apply(Action::Cancel)?;
            self.history
                .append(HistoryRecord::unallocated(request.clone()));
        }
        self.active.remove(&request_id);

        observe(&self.metrics, |m| m.inc_cancellations());
        self.sync_occupancy();
        EventLogger::log_event(
            "cancelled",
            &[KeyValue::new("request_id", request_id as i64)],
        );
        info!("Request cancelled");
        Ok(())
    }

    // -- rollback ---------------------------------------------------------

    /// Undo the most recent allocation still in the ledger.
    ///
    /// If the request is still active its slot is freed and it is forced to
    /// CANCELLED whatever its state, including OCCUPIED. If the request has
    /// already been released or cancelled, its slot went back to the pool at
    /// that point and may since belong to someone else, so only the ledger
    /// entry is discarded.
    #[instrument(skip(self))]
    pub fn rollback_last(&mut self) -> Result<RollbackOutcome, ParkingError> {
        let operation = self.ledger.pop().ok_or(ParkingError::LedgerEmpty)?;
        let request_id = operation.request_id;

        let outcome = match self.active.remove(&request_id) {
            Some(mut request) => {
                let slot_freed = self
                    .engine
                    .free(&mut self.zones, operation.slot_id, operation.zone_id)
                    .unwrap_or_else(|err| {
                        error!(request_id, "Could not free slot on rollback: {err}");
                        false
                    });

                let prior_state = request.force_cancel();
                if prior_state != RequestState::Allocated {
                    warn!(request_id, %prior_state, "Rolling back a request past allocation");
                }

                match self.history.find_mut(request_id) {
                    Some(record) => record.request = request,
                    None => error!(request_id, "Rolled back request has no history record"),
                }

                RollbackOutcome {
                    operation,
                    prior_state: Some(prior_state),
                    slot_freed,
                }
            }
            None => {
                warn!(request_id, "Request already finished, slot left untouched");
                RollbackOutcome {
                    operation,
                    prior_state: None,
                    slot_freed: false,
                }
            }
        };

        observe(&self.metrics, |m| m.inc_rollbacks());
        self.sync_occupancy();
        EventLogger::log_event(
            "rolled_back",
            &[
                KeyValue::new("request_id", request_id as i64),
                KeyValue::new("slot_freed", outcome.slot_freed),
            ],
        );
        Ok(outcome)
    }

    /// Roll back up to `k` allocations, stopping early when the ledger runs
    /// dry. Fails only if nothing at all was rolled back.
    pub fn rollback_last_k(&mut self, k: usize) -> Result<Vec<RollbackOutcome>, ParkingError> {
        if k == 0 {
            return Err(ParkingError::InvalidRollbackCount);
        }

        let mut outcomes = Vec::with_capacity(k.min(self.ledger.len()));
        while outcomes.len() < k {
            match self.rollback_last() {
                Ok(outcome) => outcomes.push(outcome),
                Err(ParkingError::LedgerEmpty) => break,
                Err(err) => return Err(err),
            }
        }

        if outcomes.is_empty() {
            return Err(ParkingError::LedgerEmpty);
        }
        info!(requested = k, rolled_back = outcomes.len(), "Rollback complete");
        Ok(outcomes)
    }

    // -- queries ----------------------------------------------------------

    pub fn analytics(&self) -> Analytics {
        self.history.analytics(&self.zones)
    }

    /// `None` only when no zone is configured.
    pub fn peak_usage_zone(&self) -> Option<ZoneId> {
        peak_usage_zone(&self.zones)
    }

    pub fn zone_utilization(&self) -> Vec<ZoneUtilization> {
        zone_utilization(&self.zones)
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn zone(&self, zone_id: ZoneId) -> Option<&Zone> {
        self.zones.get(zone_id)
    }

    pub fn active_request(&self, request_id: RequestId) -> Option<&Request> {
        self.active.get(&request_id)
    }

    /// Active requests in id order.
    pub fn active_requests(&self) -> impl Iterator<Item = &Request> {
        self.active.values()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn ledger(&self) -> &RollbackLedger {
        &self.ledger
    }

    pub fn tariff(&self) -> Tariff {
        self.tariff
    }

    fn sync_occupancy(&self) {
        observe(&self.metrics, |m| m.set_occupied_slots(self.zones.total_occupied()));
    }
}

fn observe(metrics: &Option<Arc<MetricsRecorder>>, record: impl FnOnce(&MetricsRecorder)) {
    if let Some(metrics) = metrics {
        record(metrics);
    }
}
