//! `stocktake-core`: shared building blocks (identifiers, paging, errors).
//!
//! This crate contains no IO and no HTTP concerns.

pub mod error;
pub mod id;
pub mod paging;

pub use error::{DomainError, DomainResult};
pub use id::{BatchId, InventTransId, ItemId, JournalId, SiteId, WarehouseId, WmsLocationId};
pub use paging::{PageRequest, PagedList};
