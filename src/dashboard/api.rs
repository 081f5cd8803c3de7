//! Dashboard HTTP API
//!
//! REST endpoints under `/api/market`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use crate::oracle::PremiumAggregator;
use crate::types::{ConversionRate, PremiumResult, Symbol};

type AppState = Arc<PremiumAggregator>;

/// Create the API router with all endpoints
pub fn create_router(aggregator: Arc<PremiumAggregator>) -> Router {
    Router::new()
        .route("/api/market/bitcoin", get(get_bitcoin))
        .route("/api/market/premium/:symbol", get(get_premium))
        .route("/api/market/prices", get(get_prices))
        .route("/api/market/exchange-rate", get(get_exchange_rate))
        .route("/api/market/exchange-rate/refresh", post(refresh_exchange_rate))
        .route("/api/market/usdt-rate", get(get_usdt_rate))
        .route("/api/market/usd-rate", get(get_usd_rate))
        .route("/api/market/usdt-premium", get(get_usdt_premium))
        .route("/api/market/health", get(get_health))
        .with_state(aggregator)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn bad_request(msg: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(msg)),
    )
        .into_response()
}

/// Single-symbol results: an error-status result becomes a 502
fn single_premium(result: PremiumResult) -> Response {
    if result.is_success() {
        Json(ApiResponse::success(premium_view(result))).into_response()
    } else {
        let reason = result
            .error
            .unwrap_or_else(|| format!("premium unavailable for {}", result.symbol));
        (StatusCode::BAD_GATEWAY, Json(ApiResponse::<()>::error(reason))).into_response()
    }
}

/// GET /api/market/bitcoin - BTC premium
async fn get_bitcoin(State(aggregator): State<AppState>) -> impl IntoResponse {
    match Symbol::parse("BTC") {
        Ok(symbol) => single_premium(aggregator.premium_for(&symbol).await),
        Err(e) => bad_request(e.to_string()),
    }
}

/// GET /api/market/premium/:symbol
async fn get_premium(
    State(aggregator): State<AppState>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    match Symbol::parse(&symbol) {
        Ok(symbol) => single_premium(aggregator.premium_for(&symbol).await),
        Err(e) => bad_request(e.to_string()),
    }
}

/// GET /api/market/prices?symbols=BTC,ETH - one result per symbol, in order
async fn get_prices(
    State(aggregator): State<AppState>,
    Query(query): Query<SymbolsQuery>,
) -> impl IntoResponse {
    match aggregator.aggregate_list(query.symbols_or_default()).await {
        Ok(results) => {
            let views: Vec<PremiumResult> = results.into_iter().map(premium_view).collect();
            Json(ApiResponse::success(views)).into_response()
        }
        Err(e) => bad_request(e.to_string()),
    }
}

/// GET /api/market/exchange-rate - cached rate, fiat benchmark and spread
async fn get_exchange_rate(State(aggregator): State<AppState>) -> impl IntoResponse {
    let mut overview = aggregator.rate_overview().await;
    overview.rate_premium_percent = overview
        .rate_premium_percent
        .map(|p| crate::oracle::premium::round_for_display(p, DISPLAY_DP));
    Json(ApiResponse::success(overview))
}

/// POST /api/market/exchange-rate/refresh
async fn refresh_exchange_rate(State(aggregator): State<AppState>) -> impl IntoResponse {
    let rate: ConversionRate = aggregator.refresh_rate().await;
    Json(ApiResponse::success(rate))
}

/// GET /api/market/usdt-rate
async fn get_usdt_rate(State(aggregator): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(aggregator.conversion_rate().await))
}

/// GET /api/market/usd-rate - fiat benchmark, fetched on demand
async fn get_usd_rate(State(aggregator): State<AppState>) -> impl IntoResponse {
    match aggregator.fiat_rate().await {
        Ok(rate) => Json(ApiResponse::success(rate)).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiResponse::<()>::error(e.to_string())),
        )
            .into_response(),
    }
}

/// GET /api/market/usdt-premium - USDT/KRW against USD/KRW
async fn get_usdt_premium(State(aggregator): State<AppState>) -> impl IntoResponse {
    let view = UsdtPremiumView::from(aggregator.rate_overview().await);
    Json(ApiResponse::success(view))
}

/// GET /api/market/health - per-source connectivity
async fn get_health(State(aggregator): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(aggregator.check_health().await))
}
