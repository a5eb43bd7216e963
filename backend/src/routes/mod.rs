//! Route definitions for the CoffeeStudio calculator API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - margin calculator
        .nest("/margins", margin_routes(state.clone()))
        // Protected routes - margin run history per lot
        .nest("/lots", lot_routes(state.clone()))
        // Protected routes - landed cost
        .nest("/logistics", logistics_routes(state.clone()))
        // Protected routes - Peru cooperative sourcing
        .nest("/peru", sourcing_routes(state.clone()))
        // Protected routes - market reference data
        .nest("/market", market_routes(state))
}

/// Margin calculator routes (protected)
fn margin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/calc", post(handlers::calculate_margin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Lot margin run routes (protected)
fn lot_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/:lot_id/margin-runs",
            get(handlers::list_margin_runs).post(handlers::create_margin_run),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Logistics routes (protected)
fn logistics_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/landed-cost", post(handlers::calculate_landed_cost))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Cooperative sourcing routes (protected)
fn sourcing_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/regions", get(handlers::list_regions).post(handlers::upsert_region))
        .route("/regions/seed", post(handlers::seed_regions))
        .route("/cooperatives/:cooperative_id/analyze", post(handlers::analyze_cooperative))
        .route(
            "/cooperatives/:cooperative_id/sourcing-analysis",
            get(handlers::get_sourcing_analysis),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Market data routes (protected)
fn market_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/observations",
            get(handlers::list_observations).post(handlers::create_observation),
        )
        .route("/fx/refresh", post(handlers::refresh_fx_rate))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
