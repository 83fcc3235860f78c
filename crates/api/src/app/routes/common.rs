use axum::response::{IntoResponse, Response};
use serde::Serialize;

use stocktake_core::DomainResult;
use stocktake_inventory::BackendResult;

use crate::app::errors;
use crate::app::response::ApiResponse;

/// Parse a route identifier; blank values are a 400.
pub fn parse_id<T>(raw: String, parse: impl FnOnce(String) -> DomainResult<T>) -> Result<T, Response> {
    parse(raw).map_err(errors::domain_error_to_response)
}

/// Map a backend result onto the envelope (`200` on success).
pub fn respond<T: Serialize>(result: BackendResult<T>, message: &str) -> Response {
    match result {
        Ok(data) => ApiResponse::ok(data, message).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

/// Like [`respond`] with `201 Created`.
pub fn respond_created<T: Serialize>(result: BackendResult<T>, message: &str) -> Response {
    match result {
        Ok(data) => ApiResponse::created(data, message).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
