//! The response envelope every endpoint returns.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// `{ isSuccess, statusCode, message, errors, data }`, with `statusCode`
/// mirrored in the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub is_success: bool,
    pub status_code: u16,
    pub message: String,
    pub errors: Vec<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::success(StatusCode::CREATED, data, message)
    }

    fn success(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            status_code: status.as_u16(),
            message: message.into(),
            errors: Vec::new(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            status_code: status.as_u16(),
            message: message.into(),
            errors: Vec::new(),
            data: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_is_camel_case() {
        let body = serde_json::to_value(ApiResponse::ok(json!({"a": 1}), "done")).unwrap();
        assert_eq!(
            body,
            json!({
                "isSuccess": true,
                "statusCode": 200,
                "message": "done",
                "errors": [],
                "data": {"a": 1}
            })
        );
    }

    #[test]
    fn failure_carries_status_and_null_data() {
        let response = ApiResponse::failure(StatusCode::LOCKED, "locked")
            .with_errors(vec!["Journal Session ID: 55".into()]);
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["statusCode"], 423);
        assert_eq!(body["data"], serde_json::Value::Null);
        assert_eq!(response.into_response().status(), StatusCode::LOCKED);
    }
}
