use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    routing::get,
    Router,
};

use stocktake_auth::Policy;
use stocktake_core::{SiteId, WarehouseId, WmsLocationId};
use stocktake_inventory::LocationBackend;

use crate::app::dto::WmsLocationsQuery;
use crate::app::routes::common::{parse_id, respond};
use crate::app::services::AppServices;
use crate::authz::RouteGuards;

pub fn router(guards: &RouteGuards) -> Router {
    Router::new()
        .route(
            "/InventLocations/:inventSiteId",
            guards.policy(get(invent_locations), &[Policy::ViewLocations]),
        )
        .route(
            "/WMSLocations/:inventLocationId",
            guards.warehouse_scoped(get(wms_locations), Policy::ViewLocations),
        )
        .route(
            "/WMSLocations/:inventLocationId/:wmsLocationId",
            guards.warehouse_scoped(get(wms_location), Policy::ViewLocations),
        )
}

pub async fn invent_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Path(site_id): Path<String>,
) -> Response {
    let site_id = match parse_id(site_id, SiteId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services.backend.invent_locations(&site_id).await,
        "Inventory locations retrieved successfully.",
    )
}

pub async fn wms_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
    Query(query): Query<WmsLocationsQuery>,
) -> Response {
    let warehouse_id = match parse_id(warehouse_id, WarehouseId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let filter = query
        .wms_location_id
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());

    respond(
        services
            .backend
            .wms_locations(&warehouse_id, filter, query.page())
            .await,
        "WMS locations retrieved successfully.",
    )
}

pub async fn wms_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse_id, wms_location_id)): Path<(String, String)>,
) -> Response {
    let warehouse_id = match parse_id(warehouse_id, WarehouseId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let wms_location_id = match parse_id(wms_location_id, WmsLocationId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services
            .backend
            .wms_location(&warehouse_id, &wms_location_id)
            .await,
        "WMS location retrieved successfully.",
    )
}
