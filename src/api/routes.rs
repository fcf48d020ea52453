//! API route definitions

use super::handlers::{self, ApiState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Graph ingestion
        // ====================================================================
        .route("/api/graph/profile-sync", post(handlers::sync_profile))
        .route("/api/graph/swipe", post(handlers::record_swipe))
        .route("/api/graph/adjustment", post(handlers::record_adjustment))
        .route("/api/graph/meal-log", post(handlers::record_meal_log))
        // ====================================================================
        // Graph reads
        // ====================================================================
        .route("/api/graph/health", get(handlers::graph_health))
        .route("/api/graph/insights", get(handlers::get_insights))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
