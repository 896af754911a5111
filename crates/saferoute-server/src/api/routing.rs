//! Hazard-aware routing endpoints.

use axum::{extract::State, Extension, Json};
use saferoute_core::{compute_avoidance_with_rules, AvoidanceResult, Location, PlannedRoute};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiError;
use super::request_id::RequestId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvoidanceRequest {
    pub origin: Location,
    pub destination: Location,
    /// Overrides the configured buffer factor for this request
    pub buffer_factor: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub origin: Location,
    pub destination: Location,
    /// Requests sharing a session supersede each other
    pub session_id: Option<String>,
}

fn validate_endpoints(origin: Location, destination: Location) -> Result<(), ApiError> {
    for (label, location) in [("origin", origin), ("destination", destination)] {
        if !location.is_valid() {
            return Err(ApiError::BadRequest(format!("invalid {label} {location}")));
        }
    }
    Ok(())
}

/// Hazards in the way of the straight segment and candidate detour waypoints.
pub async fn compute_avoidance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AvoidanceRequest>,
) -> Result<Json<AvoidanceResult>, ApiError> {
    validate_endpoints(req.origin, req.destination)?;
    let mut rules = *state.planner().rules();
    if let Some(buffer_factor) = req.buffer_factor {
        rules = rules.with_buffer_factor(buffer_factor).sanitized();
    }
    let hazards = state.hazards().snapshot();
    Ok(Json(compute_avoidance_with_rules(
        req.origin,
        req.destination,
        &hazards,
        &rules,
    )))
}

/// Plan a road route around reported hazards through the routing provider.
pub async fn plan_route(
    State(state): State<Arc<AppState>>,
    request_id: Option<Extension<RequestId>>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<PlannedRoute>, ApiError> {
    validate_endpoints(req.origin, req.destination)?;
    let route_id = Uuid::new_v4().to_string();
    let hazards = state.hazards().snapshot();

    let provider = state
        .planner()
        .provider()
        .with_request_id(request_id.map(|Extension(RequestId(id))| id));
    let planner = state.planner().with_provider(provider);

    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let planned = match session_id {
        Some(session_id) => {
            let ticket = state.begin_route_request(session_id);
            planner
                .plan_for_ticket(&ticket, route_id, req.origin, req.destination, &hazards)
                .await?
        }
        None => {
            planner
                .plan(route_id, req.origin, req.destination, &hazards)
                .await?
        }
    };

    tracing::info!(
        route_id = %planned.route.id,
        outcome = ?planned.route.outcome,
        distance_km = planned.route.distance_km,
        hazards_avoided = planned.route.hazards_avoided.len(),
        "Route planned"
    );
    Ok(Json(planned))
}
