use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use chauffe_core::CoreError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub(super) fn map_core_error(err: CoreError) -> AppError {
    match err {
        CoreError::UserNotFound(user) => AppError::NotFound(format!("user not found: {user}")),
        CoreError::OrderNotFound(order) => AppError::NotFound(format!("order not found: {order}")),
        CoreError::Source(source) => AppError::BadGateway(format!("cloudmanager error: {source}")),
        CoreError::Store(store) => AppError::Internal(format!("cache store error: {store}")),
        CoreError::InvalidConfig(message) => AppError::Internal(message),
    }
}
