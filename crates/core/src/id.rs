//! Strongly-typed identifiers used across the gateway.
//!
//! ERP keys are opaque strings (`"J100"`, `"000123_067"`, `"WH001"`). The
//! newtypes only guarantee that a key is non-empty after trimming; they never
//! reinterpret its contents.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! impl_string_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $t(String);

        impl $t {
            /// Create a new identifier, rejecting empty/whitespace-only values.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: must not be empty", $name)));
                }
                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Case-insensitive comparison, as used for ERP keys.
            pub fn matches(&self, other: &str) -> bool {
                self.0.to_lowercase() == other.to_lowercase()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_string_id!(
    /// Counting journal identifier.
    JournalId,
    "JournalId"
);
impl_string_id!(
    /// Journal line (inventory transaction) identifier.
    InventTransId,
    "InventTransId"
);
impl_string_id!(
    /// Item (product master) identifier.
    ItemId,
    "ItemId"
);
impl_string_id!(
    /// Warehouse identifier (ERP `InventLocationId`).
    WarehouseId,
    "WarehouseId"
);
impl_string_id!(
    /// Site identifier (ERP `InventSiteId`).
    SiteId,
    "SiteId"
);
impl_string_id!(
    /// Bin/WMS location identifier inside a warehouse.
    WmsLocationId,
    "WmsLocationId"
);
impl_string_id!(
    /// Batch identifier.
    BatchId,
    "BatchId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_identifiers() {
        assert!(JournalId::new("").is_err());
        assert!(JournalId::new("   ").is_err());
        assert_eq!(
            "".parse::<WarehouseId>(),
            Err(DomainError::invalid_id("WarehouseId: must not be empty"))
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = JournalId::new("  J100 ").unwrap();
        assert_eq!(id.as_str(), "J100");
    }

    #[test]
    fn matches_ignores_case() {
        let id = WarehouseId::new("WH001").unwrap();
        assert!(id.matches("wh001"));
        assert!(!id.matches("WH002"));
    }

    #[test]
    fn deserialization_validates() {
        let ok: JournalId = serde_json::from_str("\"J100\"").unwrap();
        assert_eq!(ok.to_string(), "J100");
        assert!(serde_json::from_str::<JournalId>("\"\"").is_err());
    }
}
