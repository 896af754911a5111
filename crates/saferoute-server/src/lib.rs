//! Shared library surface for SafeRoute server and tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod persistence;
pub mod provider;
pub mod state;

use anyhow::{Context, Result};
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use saferoute_core::mock::{generate_mock_hazards, DEFAULT_CENTER};
use saferoute_core::{HazardRepository, RoutePlanner, ShelterRepository};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::persistence::ShelterFile;
use crate::provider::ServerProvider;
use crate::state::{AppState, HazardStore};

const MOCK_HAZARD_COUNT: usize = 12;

/// Open the database, load hazards and shelters, and build the planner.
pub async fn bootstrap(config: &Config) -> Result<AppState> {
    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await
        .context("Failed to initialize database")?;
    let hazards = HazardStore::with_database(db);
    hazards.load_from_database().await?;

    if config.seed_mock_data && hazards.is_empty() {
        let mut rng = StdRng::from_os_rng();
        let now = chrono::Utc::now();
        for mut hazard in generate_mock_hazards(&mut rng, DEFAULT_CENTER, MOCK_HAZARD_COUNT, now) {
            // Mock ids are only unique per batch
            hazard.id = uuid::Uuid::new_v4().to_string();
            hazards.append(hazard).await?;
        }
        tracing::info!("Seeded {} mock hazards", MOCK_HAZARD_COUNT);
    }

    let shelter_file = ShelterFile::new(&config.shelters_path);
    let shelters = match shelter_file.load().await {
        Ok(shelters) => shelters,
        Err(saferoute_core::RepositoryError::Storage(err)) => {
            tracing::warn!("Shelter file unavailable, starting without shelters: {}", err);
            Vec::new()
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Invalid shelter file {}", shelter_file.path().display())
            })
        }
    };
    tracing::info!("Loaded {} shelters", shelters.len());

    let provider = ServerProvider::from_config(config)?;
    tracing::info!("Routing provider: {}", provider.name());
    let planner = RoutePlanner::new(provider, config.rules);

    Ok(AppState::new(hazards, shelters, planner))
}

/// Router with state, tracing, and CORS layers applied.
pub fn app(state: Arc<AppState>, config: &Config) -> Router {
    api::routes(config)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
