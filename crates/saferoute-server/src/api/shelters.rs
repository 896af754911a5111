//! Shelter lookup and location analysis endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use saferoute_core::shelters::{DEFAULT_ANALYSIS_RADIUS_M, DEFAULT_SHELTER_LIMIT};
use saferoute_core::{
    analyze_location, nearest_shelters, Location, LocationAnalysis, Shelter, ShelterDistance,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

const MAX_SHELTER_LIMIT: usize = 50;

pub async fn list_shelters(State(state): State<Arc<AppState>>) -> Json<Vec<Shelter>> {
    Json(state.shelters().to_vec())
}

pub async fn get_shelter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Shelter>, ApiError> {
    state
        .get_shelter(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("shelter {id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lng: f64,
    pub limit: Option<usize>,
}

/// Open shelters with free capacity, nearest first.
pub async fn nearest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<Vec<ShelterDistance>>, ApiError> {
    let from = Location::new(query.lat, query.lng);
    if !from.is_valid() {
        return Err(ApiError::BadRequest(format!("invalid location {from}")));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SHELTER_LIMIT)
        .clamp(1, MAX_SHELTER_LIMIT);
    Ok(Json(nearest_shelters(from, state.shelters(), limit)))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub location: Location,
    pub radius_m: Option<f64>,
    pub shelter_limit: Option<usize>,
}

/// Nearby hazards and recommended shelters for one location.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<LocationAnalysis>, ApiError> {
    if !req.location.is_valid() {
        return Err(ApiError::BadRequest(format!("invalid location {}", req.location)));
    }
    let radius_m = req
        .radius_m
        .filter(|radius| radius.is_finite() && *radius > 0.0)
        .unwrap_or(DEFAULT_ANALYSIS_RADIUS_M);
    let limit = req
        .shelter_limit
        .unwrap_or(DEFAULT_SHELTER_LIMIT)
        .clamp(1, MAX_SHELTER_LIMIT);

    let hazards = state.hazards().snapshot();
    Ok(Json(analyze_location(
        req.location,
        &hazards,
        state.shelters(),
        radius_m,
        limit,
    )))
}
