mod auth;
mod error;
mod orders;
mod profile;
mod stats;

use std::sync::Arc;

use axum::http::header::InvalidHeaderValue;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};

use chauffe_core::ledger::OrderLedger;
use chauffe_core::ProfileCache;

use self::error::AppError;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub cache: Arc<ProfileCache>,
    pub ledger: Arc<OrderLedger>,
    pub api_token: String,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState, origin: &str) -> Result<Router, InvalidHeaderValue> {
    // Only reflect the allowed origin when the request's Origin header
    // actually matches. Otherwise, omit the header entirely so browsers
    // get a clean CORS rejection instead of a mismatched origin value.
    let allowed: axum::http::HeaderValue = origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |request_origin: &axum::http::HeaderValue, _| *request_origin == allowed,
        ))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::HeaderName::from_static(auth::API_TOKEN_HEADER),
        ]);

    let shared = Arc::new(state);

    let public_api = Router::new().route("/api/v1/health", get(health));

    let protected_api = Router::new()
        .route("/api/v1/profile/{user_id}", get(profile::get_profile))
        .route(
            "/api/v1/profile/{user_id}/cached",
            get(profile::get_cached_profile),
        )
        .route(
            "/api/v1/profile/{user_id}/cache",
            axum::routing::delete(profile::invalidate_profile),
        )
        .route("/api/v1/cache/stats", get(stats::get_cache_stats))
        .route("/api/v1/users/{user_id}", post(orders::register_user))
        .route(
            "/api/v1/users/{user_id}/orders",
            get(orders::list_orders).post(orders::place_order),
        )
        .route(
            "/api/v1/orders/{order_id}/complete",
            post(orders::complete_order),
        );

    Ok(Router::new()
        .merge(public_api)
        .merge(protected_api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .layer(cors)
        .with_state(shared))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_not_found() -> AppError {
    AppError::NotFound("API route not found".to_string())
}

/// Parse a numeric path segment such as a user or order id.
fn parse_id(kind: &str, raw: &str) -> Result<u64, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("invalid {kind} id `{raw}`: {e}")))
}
