//! ## parkzone-core::alloc
//! **Slot search and release over a zone table**
//!
//! - `engine`: first-fit search with single-hop adjacent-zone fallback

pub mod engine;

pub use engine::{Allocation, AllocationEngine};
