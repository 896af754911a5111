//! Hazard feed and reporting endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use saferoute_core::{
    build_feed, FeedFilter, FeedOrder, Hazard, HazardReport, HazardRepository, HazardSeverity,
    HazardStats, HazardType,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default, rename = "type")]
    pub hazard_type: Option<HazardType>,
    #[serde(default)]
    pub severity: Option<HazardSeverity>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub sort: FeedOrder,
}

impl FeedQuery {
    fn filter(&self) -> FeedFilter {
        FeedFilter {
            hazard_type: self.hazard_type,
            severity: self.severity,
            verified: self.verified,
        }
    }
}

/// List hazards, newest first unless `sort=severity`.
pub async fn list_hazards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Json<Vec<Hazard>> {
    let hazards = state.hazards().snapshot();
    Json(build_feed(&hazards, &query.filter(), query.sort))
}

/// Report a new hazard. Reports start unverified.
pub async fn report_hazard(
    State(state): State<Arc<AppState>>,
    Json(report): Json<HazardReport>,
) -> Result<(StatusCode, Json<Hazard>), ApiError> {
    report.validate()?;
    let hazard = report.into_hazard(Uuid::new_v4().to_string(), Utc::now());
    state.hazards().append(hazard.clone()).await?;
    tracing::info!(
        hazard_id = %hazard.id,
        hazard_type = hazard.hazard_type.as_str(),
        severity = hazard.severity.as_str(),
        "Hazard reported at {}",
        hazard.location
    );
    Ok((StatusCode::CREATED, Json(hazard)))
}

pub async fn get_hazard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Hazard>, ApiError> {
    state
        .hazards()
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("hazard {id} not found")))
}

pub async fn upvote_hazard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Hazard>, ApiError> {
    let hazard = state.hazards().modify(&id, Hazard::upvote).await?;
    tracing::debug!(hazard_id = %id, upvotes = hazard.upvotes, "Hazard upvoted");
    Ok(Json(hazard))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

/// Mark a hazard verified (or unverified). Moderator only.
pub async fn verify_hazard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<VerifyRequest>>,
) -> Result<Json<Hazard>, ApiError> {
    let verified = body.map(|Json(req)| req.verified).unwrap_or(true);
    let hazard = state
        .hazards()
        .modify(&id, |hazard| hazard.set_verified(verified))
        .await?;
    tracing::info!(hazard_id = %id, verified, "Hazard verification changed");
    Ok(Json(hazard))
}

pub async fn hazard_stats(State(state): State<Arc<AppState>>) -> Json<HazardStats> {
    Json(HazardStats::from_hazards(&state.hazards().snapshot()))
}
