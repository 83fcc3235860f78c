//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: handler dependencies (backend, policy engine, location checks)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: query/response DTOs
//! - `response.rs`: the `{ isSuccess, statusCode, message, errors, data }` envelope
//! - `errors.rs`: error-to-envelope mapping
//!
//! Request pipeline, outermost first: request id span, authentication,
//! policy gate, journal lock guard (journal-scoped routes), handler.

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;

use stocktake_auth::{
    JournalLockSource, JwtValidator, PolicyEngine, StaticKeyValidator, TokenError,
    WarehouseAccessResolver,
};
use stocktake_inventory::InventoryBackend;

use crate::authz::RouteGuards;
use crate::config::{ApiConfig, TokenKey};
use crate::journal_lock::{BackendLockSource, LockGuardState};
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod response;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Fails only when the configured verification key cannot be parsed.
pub fn build_app(config: &ApiConfig, backend: Arc<dyn InventoryBackend>) -> Result<Router, TokenError> {
    let jwt: Arc<dyn JwtValidator> = match &config.token_key {
        TokenKey::Hs256Secret(secret) => {
            Arc::new(StaticKeyValidator::hs256(secret.as_bytes(), &config.token))
        }
        TokenKey::Rs256Pem(pem) => {
            Arc::new(StaticKeyValidator::rs256_pem(pem.as_bytes(), &config.token)?)
        }
    };
    let auth_state = middleware::AuthState {
        jwt,
        default_user: config.default_erp_user.as_str().into(),
    };

    let policies = Arc::new(PolicyEngine::new(
        config.client_id.clone(),
        WarehouseAccessResolver::new(
            config.warehouse_group_prefix.clone(),
            config.all_warehouses_group.clone(),
        ),
    ));

    let lock_source: Arc<dyn JournalLockSource> =
        Arc::new(BackendLockSource::new(backend.clone()));
    let guards = RouteGuards::new(
        policies.clone(),
        LockGuardState::new(lock_source),
        config.location_enforcement,
    );

    let services = Arc::new(services::AppServices::new(
        backend,
        policies,
        config.location_enforcement,
    ));

    // Protected routes: require a valid bearer token.
    let protected = routes::router(&guards)
        .layer(Extension(services))
        .route_layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(from_fn(middleware::request_id_middleware))))
}
