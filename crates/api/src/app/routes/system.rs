use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use stocktake_auth::WarehouseSet;

use crate::app::dto::WhoAmI;
use crate::app::response::ApiResponse;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Caller identity plus the warehouses its groups resolve to.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let claims = principal.claims();
    let resolver = services.policies.warehouses();
    let resolved = resolver.resolve(claims);

    let body = WhoAmI {
        subject: principal.identity().subject.clone(),
        username: principal.username().to_string(),
        roles: claims.flat_roles().map(str::to_string).collect(),
        warehouse_groups: resolver
            .warehouse_groups(claims)
            .into_iter()
            .map(str::to_string)
            .collect(),
        all_warehouses: resolved.is_all(),
        warehouses: match &resolved {
            WarehouseSet::All => Vec::new(),
            WarehouseSet::Only(ids) => ids.iter().map(|id| id.as_str().to_string()).collect(),
        },
    };

    ApiResponse::ok(body, "Current user retrieved successfully.").into_response()
}
