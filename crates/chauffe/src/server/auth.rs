use axum::http::HeaderMap;

use super::error::AppError;

pub(super) const API_TOKEN_HEADER: &str = "x-api-token";

/// Reject the request unless it carries this session's API token.
pub(super) fn check_auth(expected_token: &str, headers: &HeaderMap) -> Result<(), AppError> {
    let presented = headers
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    match presented {
        Some(token) if !token.is_empty() && token == expected_token => Ok(()),
        Some(_) => Err(AppError::Unauthorized("invalid X-API-Token".to_string())),
        None => Err(AppError::Unauthorized("missing X-API-Token".to_string())),
    }
}
