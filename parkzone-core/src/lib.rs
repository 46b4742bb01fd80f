//! # parkzone-core
//!
//! Slot allocation engine for a zoned parking facility.
//!
//! A facility is a table of zones, each split into fixed-capacity areas of
//! numbered slots. Requests target a zone and are served there first-fit,
//! falling back to directly adjacent zones only. Every successful
//! allocation leaves an undo point in a bounded rollback ledger, and every
//! outcome lands in an append-only history that analytics are computed from.
//!
//! ### Key Submodules:
//! - `topology`: slots, areas, zones and the bounded zone table
//! - `alloc`: same-zone first-fit with single-hop adjacent fallback
//! - `request`: the request state machine
//! - `ledger`: ring-buffered undo stack of allocations
//! - `history`: outcome log and on-demand analytics
//! - `system`: [`ParkingSystem`], the orchestrator over all of the above
//!
//! Everything is single-threaded and synchronous. Callers that share a
//! [`ParkingSystem`] across threads wrap it themselves.

pub mod alloc;
pub mod error;
pub mod history;
pub mod ledger;
pub mod request;
pub mod system;
pub mod tariff;
pub mod topology;

pub type ZoneId = u32;
pub type AreaId = u32;
/// Unique within its zone only.
pub type SlotId = u32;
pub type RequestId = u64;
/// Opaque, caller-supplied time unit.
pub type Timestamp = i64;

pub mod prelude {
    pub use crate::alloc::*;
    pub use crate::error::*;
    pub use crate::history::*;
    pub use crate::ledger::*;
    pub use crate::request::*;
    pub use crate::system::*;
    pub use crate::tariff::*;
    pub use crate::topology::*;
    pub use crate::{AreaId, RequestId, SlotId, Timestamp, ZoneId};
}

pub use error::{ErrorKind, ParkingError};
pub use system::{ParkingSystem, RollbackOutcome};
