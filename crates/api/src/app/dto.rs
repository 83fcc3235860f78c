use serde::{Deserialize, Serialize};

use stocktake_core::PageRequest;
use stocktake_inventory::{LineFilter, OnHandFilter};

// -------------------------
// Query DTOs
// -------------------------
//
// Paging fields are repeated per query instead of flattened: query strings
// carry numbers as text, which flattening cannot deserialize.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinesQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub item_id: Option<String>,
    pub invent_batch_id: Option<String>,
}

impl LinesQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }

    pub fn filter(&self) -> LineFilter {
        LineFilter {
            item_id: non_blank(&self.item_id),
            invent_batch_id: non_blank(&self.invent_batch_id),
        }
    }
}

/// Paged listing with an optional free-text search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub search_query: Option<String>,
}

impl SearchQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }

    pub fn search(&self) -> Option<&str> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnHandQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub search_query: Option<String>,
    pub invent_location_id: Option<String>,
    pub wms_location_id: Option<String>,
    pub storage_dimension_group: Option<String>,
    pub tracking_dimension_group: Option<String>,
}

impl OnHandQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }

    pub fn filter(&self) -> OnHandFilter {
        OnHandFilter {
            search_query: non_blank(&self.search_query),
            invent_location_id: non_blank(&self.invent_location_id),
            wms_location_id: non_blank(&self.wms_location_id),
            storage_dimension_group: non_blank(&self.storage_dimension_group),
            tracking_dimension_group: non_blank(&self.tracking_dimension_group),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WmsLocationsQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub wms_location_id: Option<String>,
}

impl WmsLocationsQuery {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// -------------------------
// Response DTOs
// -------------------------

/// Body of `GET /whoami`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub subject: Option<String>,
    pub username: String,
    pub roles: Vec<String>,
    /// Raw groups that carry the warehouse prefix.
    pub warehouse_groups: Vec<String>,
    pub all_warehouses: bool,
    pub warehouses: Vec<String>,
}
