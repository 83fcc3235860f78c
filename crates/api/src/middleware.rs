use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use stocktake_auth::{ClaimSet, Identity, JwtValidator};

use crate::app::errors;
use crate::context::PrincipalContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    /// ERP actor for tokens without a usable user name.
    pub default_user: Arc<str>,
}

/// Validate the bearer token and attach a [`PrincipalContext`].
///
/// Every failure is the same generic 401; the reason is logged at debug.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let raw = match extract_bearer(req.headers()) {
        Ok(token) => match state.jwt.validate(token) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(reason = %e, "rejecting bearer token");
                return errors::unauthorized();
            }
        },
        Err(reason) => {
            tracing::debug!(reason, "missing bearer token");
            return errors::unauthorized();
        }
    };

    let claims = ClaimSet::from_claims(&raw);
    let identity = Identity::from_claims(&raw, &state.default_user);
    tracing::Span::current().record("user", identity.username.as_str());

    req.extensions_mut()
        .insert(PrincipalContext::new(identity, claims));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("no authorization header")?;

    let header = header.to_str().map_err(|_| "authorization header is not ascii")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("authorization scheme is not bearer")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}

/// Wrap the request in an `http.request` span keyed by a request id.
///
/// A well-formed incoming `x-request-id` is kept; otherwise a UUIDv7 is
/// minted. The id is echoed on the response.
pub async fn request_id_middleware(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        user = tracing::field::Empty,
        status = tracing::field::Empty,
    );

    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status().as_u16();
    span.record("status", status);
    span.in_scope(|| {
        tracing::info!(
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        )
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
