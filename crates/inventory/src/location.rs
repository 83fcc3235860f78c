use serde::{Deserialize, Serialize};

use stocktake_core::{WarehouseId, WmsLocationId};

/// Bin location inside a warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsLocation {
    pub wms_location_id: WmsLocationId,
    pub invent_location_id: WarehouseId,
    pub location_type: i32,
    pub max_pallet_count: i32,
    pub max_volume: f64,
    pub max_weight: f64,
}
