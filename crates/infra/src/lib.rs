//! Infrastructure layer: ERP backend implementations.

pub mod erp;

pub use erp::InMemoryErp;
