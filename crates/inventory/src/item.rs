//! Item master data, batches and on-hand stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{BatchId, ItemId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: ItemId,
    pub description: String,
    pub product_name: String,
    pub search_name: String,
    pub image: String,
    pub product_type: i32,
    pub production_type: i32,
    pub tracking_dimension_group_name: String,
}

impl Item {
    /// Free-text match used by paged item searches.
    pub fn matches_search(&self, term: &str) -> bool {
        contains_ignore_case(self.item_id.as_str(), term)
            || contains_ignore_case(&self.product_name, term)
            || contains_ignore_case(&self.search_name, term)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub item_id: ItemId,
    pub invent_batch_id: BatchId,
    pub prod_date: Option<DateTime<Utc>>,
    pub exp_date: Option<DateTime<Utc>>,
}

/// On-hand quantities for one combination of stock dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnHand {
    pub item_id: ItemId,
    pub unit_id: String,
    pub product_name: String,
    pub search_name: String,
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
    pub invent_batch_id: String,
    pub invent_serial_id: String,
    pub posted_qty: f64,
    pub registered: f64,
    pub picked: f64,
    pub deducted: f64,
    pub reserv_physical: f64,
    pub reserv_ordered: f64,
    pub avail_physical: f64,
    pub physical_invent: f64,
    pub ordered_sum: f64,
    pub storage_dimension_group_name: String,
    pub tracking_dimension_group_name: String,
}

/// Exact dimensions of `GET /api/Items/OnHand/:itemId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnHandDimensions {
    pub invent_batch_id: String,
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
}

impl OnHandDimensions {
    /// Empty dimensions act as wildcards.
    pub fn matches(&self, row: &OnHand) -> bool {
        wildcard_eq(&self.invent_batch_id, &row.invent_batch_id)
            && wildcard_eq(&self.invent_site_id, &row.invent_site_id)
            && wildcard_eq(&self.invent_location_id, &row.invent_location_id)
            && wildcard_eq(&self.wms_location_id, &row.wms_location_id)
    }
}

/// Filters of the paged on-hand list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnHandFilter {
    pub search_query: Option<String>,
    pub invent_location_id: Option<String>,
    pub wms_location_id: Option<String>,
    pub storage_dimension_group: Option<String>,
    pub tracking_dimension_group: Option<String>,
}

impl OnHandFilter {
    pub fn matches(&self, row: &OnHand) -> bool {
        let eq = |filter: &Option<String>, value: &str| {
            filter.as_deref().is_none_or(|f| f.eq_ignore_ascii_case(value))
        };

        self.search_query.as_deref().is_none_or(|term| {
            contains_ignore_case(row.item_id.as_str(), term)
                || contains_ignore_case(&row.product_name, term)
                || contains_ignore_case(&row.search_name, term)
        }) && eq(&self.invent_location_id, &row.invent_location_id)
            && eq(&self.wms_location_id, &row.wms_location_id)
            && eq(&self.storage_dimension_group, &row.storage_dimension_group_name)
            && eq(&self.tracking_dimension_group, &row.tracking_dimension_group_name)
    }
}

/// A warehouse (ERP `InventLocation`) within a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventLocation {
    pub invent_location_id: String,
    pub invent_site_id: String,
    pub name: String,
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn wildcard_eq(filter: &str, value: &str) -> bool {
    filter.trim().is_empty() || filter.eq_ignore_ascii_case(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(location: &str, wms: &str) -> OnHand {
        OnHand {
            item_id: ItemId::new("ITEM-1").unwrap(),
            unit_id: "pcs".into(),
            product_name: "Blue Widget".into(),
            search_name: "WIDGET".into(),
            invent_site_id: "S1".into(),
            invent_location_id: location.into(),
            wms_location_id: wms.into(),
            invent_batch_id: "B1".into(),
            invent_serial_id: String::new(),
            posted_qty: 10.0,
            registered: 0.0,
            picked: 0.0,
            deducted: 0.0,
            reserv_physical: 0.0,
            reserv_ordered: 0.0,
            avail_physical: 10.0,
            physical_invent: 10.0,
            ordered_sum: 0.0,
            storage_dimension_group_name: "SiteWH".into(),
            tracking_dimension_group_name: "Batch".into(),
        }
    }

    #[test]
    fn blank_dimensions_are_wildcards() {
        let dims = OnHandDimensions {
            invent_location_id: "wh001".into(),
            ..Default::default()
        };
        assert!(dims.matches(&row("WH001", "A-01")));
        assert!(!dims.matches(&row("WH002", "A-01")));
    }

    #[test]
    fn on_hand_filter_combines_search_and_dimensions() {
        let filter = OnHandFilter {
            search_query: Some("widget".into()),
            wms_location_id: Some("A-01".into()),
            ..Default::default()
        };
        assert!(filter.matches(&row("WH001", "a-01")));
        assert!(!filter.matches(&row("WH001", "B-02")));

        let filter = OnHandFilter {
            search_query: Some("gadget".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&row("WH001", "A-01")));
    }
}
