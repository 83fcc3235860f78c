use axum::{routing::get, Router};

use crate::authz::RouteGuards;

pub mod common;
pub mod items;
pub mod journals;
pub mod lines;
pub mod locations;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router(guards: &RouteGuards) -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest(
            "/api/CountingJournals",
            journals::router(guards).merge(lines::router(guards)),
        )
        .nest("/api/Items", items::router(guards))
        .nest("/api/Locations", locations::router(guards))
}
