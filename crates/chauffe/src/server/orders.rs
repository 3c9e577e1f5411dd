use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use chauffe_core::ledger::UserStateProvider;
use chauffe_core::types::{Order, OrderId, UserProfile};
use chauffe_core::UserId;

use super::auth::check_auth;
use super::error::{map_core_error, AppError};
use super::{parse_id, SharedState};

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Serialize)]
pub(super) struct RegisterUserResponse {
    user_id: UserId,
    created: bool,
    profile: UserProfile,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct PlaceOrderRequest {
    quantity: u32,
    total_amount_cents: u64,
}

#[derive(Serialize)]
pub(super) struct OrderListResponse {
    user_id: UserId,
    orders: Vec<Order>,
}

// ==============================================================================
// Handlers
// ==============================================================================

/// Register a user account and make sure it has a profile.
pub(super) async fn register_user(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<RegisterUserResponse>), AppError> {
    check_auth(&state.api_token, &headers)?;
    let user = UserId(parse_id("user", &user_id)?);

    let created = state.ledger.register_user(user).await;
    let profile = state
        .ledger
        .ensure_profile(user)
        .await
        .map_err(map_core_error)?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(RegisterUserResponse {
            user_id: user,
            created,
            profile,
        }),
    ))
}

pub(super) async fn list_orders(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<OrderListResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let user = UserId(parse_id("user", &user_id)?);

    // Surfaces unknown users as 404 rather than an empty list.
    state.ledger.profile(user).await.map_err(map_core_error)?;
    let orders = state.ledger.orders_for(user).await;
    Ok(Json(OrderListResponse {
        user_id: user,
        orders,
    }))
}

pub(super) async fn place_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    req: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    check_auth(&state.api_token, &headers)?;
    let user = UserId(parse_id("user", &user_id)?);
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;

    if req.quantity == 0 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let order = state
        .ledger
        .place_order(user, req.quantity, req.total_amount_cents)
        .await
        .map_err(map_core_error)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Mark an order paid. The ledger's observers evict the owner's cached
/// profile.
pub(super) async fn complete_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let order_id = OrderId(parse_id("order", &order_id)?);

    let order = state
        .ledger
        .complete_order(order_id)
        .await
        .map_err(map_core_error)?;
    Ok(Json(order))
}
