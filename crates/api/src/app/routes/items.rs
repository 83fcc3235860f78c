use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use stocktake_auth::Policy;
use stocktake_core::{BatchId, ItemId, SiteId, WarehouseId};
use stocktake_inventory::{InventLocation, ItemBackend, OnHandDimensions};

use crate::app::dto::{OnHandQuery, SearchQuery};
use crate::app::errors;
use crate::app::response::ApiResponse;
use crate::app::routes::common::{parse_id, respond};
use crate::app::services::AppServices;
use crate::authz::RouteGuards;
use crate::context::PrincipalContext;

pub fn router(guards: &RouteGuards) -> Router {
    Router::new()
        .route("/", guards.policy(get(list_items), &[Policy::ViewItems]))
        .route("/:itemId", guards.policy(get(get_item), &[Policy::ViewItems]))
        .route(
            "/:itemId/Batches",
            guards.policy(get(list_batches), &[Policy::ViewItems]),
        )
        .route(
            "/:itemId/Batches/:inventBatchId",
            guards.policy(get(get_batch), &[Policy::ViewItems]),
        )
        .route("/OnHand", guards.policy(get(list_on_hand), &[Policy::ViewOnHand]))
        .route(
            "/OnHand/:itemId",
            guards.policy(get(item_on_hand), &[Policy::ViewOnHand]),
        )
        .route(
            "/OnHand/InventLocations/:inventSiteId",
            guards.policy(get(on_hand_invent_locations), &[Policy::ViewOnHand]),
        )
        .route(
            "/OnHand/WMSLocations/:inventLocationId",
            guards.warehouse_scoped(get(on_hand_wms_locations), Policy::ViewOnHand),
        )
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    respond(
        services.backend.list_items(query.search(), query.page()).await,
        "Inventory items retrieved successfully.",
    )
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item_id): Path<String>,
) -> Response {
    let item_id = match parse_id(item_id, ItemId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services.backend.get_item(&item_id).await,
        "Inventory item retrieved successfully.",
    )
}

pub async fn list_batches(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let item_id = match parse_id(item_id, ItemId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services
            .backend
            .list_batches(&item_id, query.search(), query.page())
            .await,
        "Inventory batches retrieved successfully.",
    )
}

pub async fn get_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Path((item_id, batch_id)): Path<(String, String)>,
) -> Response {
    let item_id = match parse_id(item_id, ItemId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let batch_id = match parse_id(batch_id, BatchId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    respond(
        services.backend.get_batch(&item_id, &batch_id).await,
        "Inventory batch retrieved successfully.",
    )
}

pub async fn list_on_hand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<OnHandQuery>,
) -> Response {
    let filter = query.filter();
    if let Err(denied) = services.ensure_location_access(&principal, filter.invent_location_id.as_deref()) {
        return denied;
    }

    respond(
        services.backend.list_on_hand(&filter, query.page()).await,
        "On-hand inventory retrieved successfully.",
    )
}

pub async fn item_on_hand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(item_id): Path<String>,
    Query(dimensions): Query<OnHandDimensions>,
) -> Response {
    let item_id = match parse_id(item_id, ItemId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = services.ensure_location_access(&principal, Some(&dimensions.invent_location_id)) {
        return denied;
    }

    respond(
        services.backend.on_hand(&item_id, &dimensions).await,
        "On-hand information retrieved successfully.",
    )
}

pub async fn on_hand_invent_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(site_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let site_id = match parse_id(site_id, SiteId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .backend
        .on_hand_invent_locations(&site_id, query.search())
        .await
    {
        Ok(locations) => {
            let locations = services.visible_locations(&principal, locations, warehouse_of);
            ApiResponse::ok(locations, "On-hand inventory locations retrieved successfully.")
                .into_response()
        }
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn on_hand_wms_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(warehouse_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let warehouse_id = match parse_id(warehouse_id, WarehouseId::new) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(denied) = services.ensure_location_access(&principal, Some(warehouse_id.as_str())) {
        return denied;
    }

    respond(
        services
            .backend
            .on_hand_wms_locations(&warehouse_id, query.search(), query.page())
            .await,
        "On-hand WMS locations retrieved successfully.",
    )
}

fn warehouse_of(location: &InventLocation) -> &str {
    &location.invent_location_id
}
