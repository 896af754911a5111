//! REST API routes.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::auth::{self, AdminToken};
use crate::api::{hazards, request_id, routing, shelters};
use crate::config::Config;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let admin_token = AdminToken::new(config.admin_token.clone());

    let public_routes = Router::new()
        .route("/health", get(health))
        // Hazard feed
        .route("/v1/hazards", get(hazards::list_hazards).post(hazards::report_hazard))
        .route("/v1/hazards/stats", get(hazards::hazard_stats))
        .route("/v1/hazards/:id", get(hazards::get_hazard))
        .route("/v1/hazards/:id/upvote", post(hazards::upvote_hazard))
        // Shelters
        .route("/v1/shelters", get(shelters::list_shelters))
        .route("/v1/shelters/nearest", get(shelters::nearest))
        .route("/v1/shelters/:id", get(shelters::get_shelter))
        .route("/v1/analyze", post(shelters::analyze))
        // Routing
        .route("/v1/routes/avoidance", post(routing::compute_avoidance))
        .route("/v1/routes/plan", post(routing::plan_route));

    // Moderator routes (require admin token)
    let admin_routes = Router::new()
        .route("/v1/hazards/:id/verify", post(hazards::verify_hazard))
        .layer(middleware::from_fn_with_state(admin_token, auth::require_admin));

    public_routes
        .merge(admin_routes)
        .layer(middleware::from_fn(request_id::ensure_request_id))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "hazards": state.hazards().len(),
        "shelters": state.shelters().len(),
        "routing_provider": state.planner().provider().name(),
    }))
}
