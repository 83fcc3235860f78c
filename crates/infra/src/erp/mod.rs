//! ERP backends.
//!
//! Only the in-memory backend lives here; it implements every
//! `stocktake-inventory` port and exposes a few knobs (session id, outage,
//! foreign locks) for tests.

pub mod in_memory;
pub mod seed;

pub use in_memory::InMemoryErp;
