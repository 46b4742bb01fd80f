//! Rollback ledger.
//!
//! A bounded, chronological undo stack of successful allocations, newest on
//! top. Storage is a fixed ring indexed by a write cursor: when the ring is
//! full the next push overwrites the oldest entry, so a full ledger never
//! refuses an allocation, it just forgets its oldest undo point.

use serde::Serialize;

use crate::request::RequestState;
use crate::{RequestId, SlotId, Timestamp, ZoneId};

/// Default number of undo points kept.
pub const DEFAULT_LEDGER_CAPACITY: usize = 1000;

/// Immutable record of one successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationOperation {
    pub request_id: RequestId,
    pub vehicle_id: String,
    pub slot_id: SlotId,
    pub zone_id: ZoneId,
    pub timestamp: Timestamp,
    pub previous_state: RequestState,
    pub new_state: RequestState,
}

#[derive(Debug, Clone)]
pub struct RollbackLedger {
    ring: Vec<Option<AllocationOperation>>,
    /// Index the next push writes to. When full, also the oldest entry.
    cursor: usize,
    len: usize,
}

impl RollbackLedger {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: (0..capacity).map(|_| None).collect(),
            cursor: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push a new undo point, returning the entry evicted to make room.
    pub fn push(&mut self, operation: AllocationOperation) -> Option<AllocationOperation> {
        let evicted = if self.len == self.capacity() {
            self.ring[self.cursor].take()
        } else {
            self.len += 1;
            None
        };

        self.ring[self.cursor] = Some(operation);
        self.cursor = (self.cursor + 1) % self.capacity();
        evicted
    }

    /// Remove and return the most recent operation.
    pub fn pop(&mut self) -> Option<AllocationOperation> {
        if self.len == 0 {
            return None;
        }
        self.cursor = self.back(0);
        self.len -= 1;
        self.ring[self.cursor].take()
    }

    pub fn peek(&self) -> Option<&AllocationOperation> {
        if self.len == 0 {
            return None;
        }
        self.ring[self.back(0)].as_ref()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &AllocationOperation> + '_ {
        (0..self.len).filter_map(move |age| self.ring[self.back(age)].as_ref())
    }

    pub fn clear(&mut self) {
        self.ring.iter_mut().for_each(|entry| *entry = None);
        self.cursor = 0;
        self.len = 0;
    }

    /// Ring index of the entry `age` pushes older than the newest.
    #[inline]
    fn back(&self, age: usize) -> usize {
        let capacity = self.capacity();
        (self.cursor + capacity - 1 - age) % capacity
    }
}

impl Default for RollbackLedger {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(request_id: RequestId) -> AllocationOperation {
        AllocationOperation {
            request_id,
            vehicle_id: format!("V{request_id}"),
            slot_id: request_id as SlotId,
            zone_id: 1,
            timestamp: request_id as Timestamp,
            previous_state: RequestState::Requested,
            new_state: RequestState::Allocated,
        }
    }

    #[test]
    fn pops_newest_first() {
        let mut ledger = RollbackLedger::with_capacity(4);
        for id in 1..=3 {
            assert!(ledger.push(op(id)).is_none());
        }
        assert_eq!(ledger.peek().map(|o| o.request_id), Some(3));
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(3));
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(2));
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(1));
        assert!(ledger.pop().is_none());
        assert!(ledger.peek().is_none());
    }

    #[test]
    fn full_ledger_evicts_oldest() {
        let mut ledger = RollbackLedger::with_capacity(3);
        for id in 1..=3 {
            ledger.push(op(id));
        }
        let evicted = ledger.push(op(4)).expect("oldest entry evicted");
        assert_eq!(evicted.request_id, 1);
        assert_eq!(ledger.len(), 3);

        let order: Vec<RequestId> = ledger.iter().map(|o| o.request_id).collect();
        assert_eq!(order, vec![4, 3, 2]);
    }

    #[test]
    fn interleaved_push_pop_across_wraparound() {
        let mut ledger = RollbackLedger::with_capacity(2);
        ledger.push(op(1));
        ledger.push(op(2));
        ledger.push(op(3));
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(3));
        ledger.push(op(4));
        ledger.push(op(5));
        let order: Vec<RequestId> = ledger.iter().map(|o| o.request_id).collect();
        assert_eq!(order, vec![5, 4]);
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(5));
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(4));
        assert!(ledger.is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut ledger = RollbackLedger::with_capacity(0);
        assert_eq!(ledger.capacity(), 1);
        ledger.push(op(1));
        assert_eq!(ledger.push(op(2)).map(|o| o.request_id), Some(1));
        assert_eq!(ledger.pop().map(|o| o.request_id), Some(2));
    }

    #[test]
    fn clear_resets() {
        let mut ledger = RollbackLedger::default();
        assert_eq!(ledger.capacity(), DEFAULT_LEDGER_CAPACITY);
        ledger.push(op(1));
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.iter().count(), 0);
    }
}
