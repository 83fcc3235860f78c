//! Inventory-counting data model and ERP ports.
//!
//! DTOs mirror the ERP records the gateway exposes (camelCase on the wire);
//! the backend traits are the only way handlers reach the ERP.

pub mod backend;
pub mod counting;
pub mod item;
pub mod location;

pub use backend::{
    BackendError, BackendResult, CountingBackend, InventoryBackend, ItemBackend, LocationBackend,
};
pub use counting::{
    CountingJournal, CreateCountingJournal, CreateJournalLine, JournalLine, JournalSummary,
    LineDimensions, LineFilter, UpdateJournalLine,
};
pub use item::{Batch, InventLocation, Item, OnHand, OnHandDimensions, OnHandFilter};
pub use location::WmsLocation;
