use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use chauffe_core::types::CacheStats;

use super::auth::check_auth;
use super::error::AppError;
use super::SharedState;

pub(super) async fn get_cache_stats(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<CacheStats>, AppError> {
    check_auth(&state.api_token, &headers)?;
    Ok(Json(state.cache.stats()))
}
