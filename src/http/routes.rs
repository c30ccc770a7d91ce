use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Flights and assignments
        .route(
            "/flights",
            get(handlers::list_flights).post(handlers::create_flight),
        )
        .route(
            "/flights/:id",
            get(handlers::get_flight).patch(handlers::update_flight),
        )
        .route("/flights/:id/assignments", post(handlers::add_assignment))
        // Per-agent operations
        .route(
            "/flights/:id/ops/:agent_id",
            patch(handlers::update_agent_ops),
        )
        .route(
            "/flights/:id/ops/:agent_id/voice",
            post(handlers::apply_voice),
        )
        .route("/flights/:id/ops/:agent_id/push", post(handlers::push_agent))
        // Voice parsing
        .route("/voice/parse", post(handlers::parse_voice))
        // Exports
        .route("/export.csv", get(handlers::export_csv))
        // Sheets relay
        .route(
            "/api/push",
            post(handlers::relay_push)
                .options(handlers::relay_preflight)
                .fallback(handlers::relay_method_not_allowed),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
