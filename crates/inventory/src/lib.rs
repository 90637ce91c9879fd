//! Inventory domain module.
//!
//! The single record type served by every store, plus the draft callers send
//! for create/update. Pure data and validation (no IO, no HTTP, no storage).

pub mod item;

pub use item::{InventoryRecord, ItemDraft};
