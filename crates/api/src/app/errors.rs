use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use stocktake_auth::LockConflict;
use stocktake_core::DomainError;
use stocktake_inventory::BackendError;

use crate::app::response::ApiResponse;

pub const NO_RESPONSE_FROM_SERVICE: &str = "No response from service";

pub fn backend_error_to_response(err: BackendError) -> Response {
    match err {
        BackendError::NotFound(what) => json_error(StatusCode::NOT_FOUND, format!("{what} not found")),
        BackendError::Rejected(msg) => json_error(StatusCode::BAD_REQUEST, msg),
        BackendError::Unavailable(reason) => {
            tracing::warn!(reason = %reason, "ERP call failed");
            json_error(StatusCode::BAD_GATEWAY, NO_RESPONSE_FROM_SERVICE)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
            json_error(StatusCode::BAD_REQUEST, msg)
        }
    }
}

pub fn lock_conflict(conflict: &LockConflict) -> Response {
    ApiResponse::failure(StatusCode::LOCKED, LockConflict::MESSAGE)
        .with_errors(conflict.errors())
        .into_response()
}

pub fn unauthorized() -> Response {
    json_error(StatusCode::UNAUTHORIZED, "Unauthorized")
}

/// Generic denial; which check failed is only logged.
pub fn forbidden() -> Response {
    json_error(StatusCode::FORBIDDEN, "Forbidden")
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    ApiResponse::failure(status, message).into_response()
}
