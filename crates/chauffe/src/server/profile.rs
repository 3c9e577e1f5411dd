use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use chauffe_core::ledger::UserStateProvider;
use chauffe_core::types::UserProfile;
use chauffe_core::{ProfilePayload, UserId};

use super::auth::check_auth;
use super::error::{map_core_error, AppError};
use super::{parse_id, SharedState};

// ==============================================================================
// DTOs
// ==============================================================================

/// The profile page model: the user's own record plus the (possibly
/// cached) blockchain data.
#[derive(Serialize)]
pub(super) struct ProfileResponse {
    user_id: UserId,
    profile: Option<UserProfile>,
    completed_orders_count: u64,
    #[serde(flatten)]
    data: ProfilePayload,
}

#[derive(Serialize)]
pub(super) struct InvalidateResponse {
    user_id: UserId,
    invalidated: bool,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn get_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let user = UserId(parse_id("user", &user_id)?);

    let data = state.cache.get_or_fetch(user).await.map_err(map_core_error)?;
    let profile = state.ledger.profile(user).await.map_err(map_core_error)?;
    let completed_orders_count = state
        .ledger
        .purchase_state(user)
        .await
        .map_err(map_core_error)?
        .map_or(0, |s| s.completed_orders_count);

    Ok(Json(ProfileResponse {
        user_id: user,
        profile,
        completed_orders_count,
        data,
    }))
}

/// The cached payload only; never contacts CloudManager.
pub(super) async fn get_cached_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<ProfilePayload>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let user = UserId(parse_id("user", &user_id)?);

    state
        .cache
        .get_cached_data(user)
        .await
        .map_err(map_core_error)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no cached profile data for user {user}")))
}

pub(super) async fn invalidate_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<InvalidateResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let user = UserId(parse_id("user", &user_id)?);

    state.cache.invalidate(user).await.map_err(map_core_error)?;
    Ok(Json(InvalidateResponse {
        user_id: user,
        invalidated: true,
    }))
}
