//! Group-to-warehouse mapping.
//!
//! Warehouse access is granted through identity-provider groups whose name
//! (the last segment of a `/`-separated group path) starts with a reserved
//! prefix, e.g. `IMS_Warehouse_WH001` or `/Warehouses/IMS_Warehouse_WH001`.
//! A reserved "all warehouses" group (`IMS_Warehouse_ALL`) grants every
//! warehouse and dominates any enumerated grant.
//!
//! Three entry points deliberately disagree about users with *no* warehouse
//! groups:
//!
//! | entry point             | no warehouse groups |
//! |-------------------------|---------------------|
//! | [`WarehouseAccessResolver::resolve`] | empty set (no explicit grants) |
//! | [`has_access`]          | denied              |
//! | [`has_location_access`] | allowed (unrestricted) |

use stocktake_core::WarehouseId;

use crate::ClaimSet;
use crate::claims::fold;

/// Default prefix of warehouse groups.
pub const WAREHOUSE_GROUP_PREFIX: &str = "IMS_Warehouse_";
/// Default reserved group granting every warehouse.
pub const ALL_WAREHOUSES_GROUP: &str = "IMS_Warehouse_ALL";

/// Warehouses a user may access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseSet {
    /// Wildcard: every warehouse.
    All,
    /// An explicit list, deduplicated case-insensitively. May be empty.
    Only(Vec<WarehouseId>),
}

impl WarehouseSet {
    pub fn none() -> Self {
        WarehouseSet::Only(Vec::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, WarehouseSet::All)
    }

    /// True only for an explicit list without entries (never for `All`).
    pub fn is_empty(&self) -> bool {
        matches!(self, WarehouseSet::Only(ids) if ids.is_empty())
    }

    /// Explicitly granted warehouses (empty for `All`).
    pub fn ids(&self) -> &[WarehouseId] {
        match self {
            WarehouseSet::All => &[],
            WarehouseSet::Only(ids) => ids,
        }
    }

    pub fn contains(&self, warehouse_id: &str) -> bool {
        match self {
            WarehouseSet::All => true,
            WarehouseSet::Only(ids) => ids.iter().any(|id| id.matches(warehouse_id)),
        }
    }
}

/// Derives a [`WarehouseSet`] from a [`ClaimSet`]'s groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseAccessResolver {
    prefix: String,
    all_group: String,
}

impl Default for WarehouseAccessResolver {
    fn default() -> Self {
        Self::new(WAREHOUSE_GROUP_PREFIX, ALL_WAREHOUSES_GROUP)
    }
}

impl WarehouseAccessResolver {
    pub fn new(prefix: impl Into<String>, all_group: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            all_group: all_group.into(),
        }
    }

    /// Resolve the warehouses granted by `claims.groups`.
    ///
    /// Pure; recomputed per request. Membership in the all-warehouses group
    /// yields [`WarehouseSet::All`] whatever else is present.
    pub fn resolve(&self, claims: &ClaimSet) -> WarehouseSet {
        let mut ids: Vec<WarehouseId> = Vec::new();

        for group in claims.groups() {
            let name = last_segment(group);

            if fold(name) == fold(&self.all_group) {
                tracing::debug!(group = %group, "all-warehouses group present");
                return WarehouseSet::All;
            }

            let Some(candidate) = strip_prefix_ignore_case(name, &self.prefix) else {
                continue;
            };
            let Ok(id) = WarehouseId::new(candidate) else {
                continue;
            };
            if !ids.iter().any(|existing| existing.matches(id.as_str())) {
                ids.push(id);
            }
        }

        tracing::debug!(warehouses = ?ids, "resolved warehouse access");
        WarehouseSet::Only(ids)
    }

    /// Groups whose name carries the warehouse prefix (including the
    /// all-warehouses group), in claim order.
    pub fn warehouse_groups<'a>(&self, claims: &'a ClaimSet) -> Vec<&'a str> {
        claims
            .groups()
            .iter()
            .map(String::as_str)
            .filter(|group| strip_prefix_ignore_case(last_segment(group), &self.prefix).is_some())
            .collect()
    }
}

/// Strict check: `All`, or an explicit case-insensitive match.
///
/// An empty set grants nothing.
pub fn has_access(resolved: &WarehouseSet, warehouse_id: &str) -> bool {
    resolved.contains(warehouse_id)
}

/// Location-access check: like [`has_access`], except that a user without
/// any warehouse group is unrestricted.
pub fn has_location_access(resolved: &WarehouseSet, warehouse_id: &str) -> bool {
    resolved.is_empty() || resolved.contains(warehouse_id)
}

/// Keep only the entries whose warehouse passes [`has_location_access`].
pub fn filter_locations<T, F>(resolved: &WarehouseSet, items: Vec<T>, warehouse_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    if resolved.is_all() || resolved.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| has_location_access(resolved, warehouse_of(item)))
        .collect()
}

fn last_segment(group: &str) -> &str {
    group.rsplit('/').next().unwrap_or(group)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if fold(head) == fold(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}
