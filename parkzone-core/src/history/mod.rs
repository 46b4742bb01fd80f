//! ## parkzone-core::history
//! **Append-only outcome log feeding analytics**
//!
//! One record per request in practice: an allocation appends, and later
//! occupy/release/cancel commands re-snapshot that same record. A request
//! cancelled before it was ever allocated gets a fresh record at cancel time.
//! Records are never removed.

pub mod analytics;

use std::collections::HashMap;

use serde::Serialize;

use crate::request::{Request, RequestState};
use crate::{RequestId, SlotId, Timestamp, ZoneId};

pub use analytics::{Analytics, UtilizationBand, ZoneUtilization};

/// A slot address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRef {
    pub slot_id: SlotId,
    pub zone_id: ZoneId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Snapshot of the request as of its last recorded event.
    pub request: Request,
    /// `None` if the request was never allocated.
    pub allocation: Option<SlotRef>,
    /// Stamped on release.
    pub release_time: Option<Timestamp>,
    pub cross_zone: bool,
    /// Charge computed on release.
    pub fee: Option<u64>,
}

impl HistoryRecord {
    pub fn allocated(request: Request, allocation: SlotRef, cross_zone: bool) -> Self {
        Self {
            request,
            allocation: Some(allocation),
            release_time: None,
            cross_zone,
            fee: None,
        }
    }

    pub fn unallocated(request: Request) -> Self {
        Self {
            request,
            allocation: None,
            release_time: None,
            cross_zone: false,
            fee: None,
        }
    }

    pub fn state(&self) -> RequestState {
        self.request.state()
    }

    /// Length of a completed stay.
    pub fn duration(&self) -> Option<i64> {
        match (self.state(), self.release_time) {
            (RequestState::Released, Some(released)) => {
                released.checked_sub(self.request.created_at())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    records: Vec<HistoryRecord>,
    /// Latest record per request.
    index: HashMap<RequestId, usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: HistoryRecord) {
        self.index.insert(record.request.id(), self.records.len());
        self.records.push(record);
    }

    pub fn find(&self, request_id: RequestId) -> Option<&HistoryRecord> {
        self.index.get(&request_id).map(|&at| &self.records[at])
    }

    pub fn find_mut(&mut self, request_id: RequestId) -> Option<&mut HistoryRecord> {
        let at = *self.index.get(&request_id)?;
        self.records.get_mut(at)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }
}
