//! API routes for the SafeRoute server.

pub mod auth;
pub mod error;
pub mod hazards;
pub mod request_id;
mod routes;
pub mod routing;
pub mod shelters;

use crate::config::Config;
use axum::Router;

pub fn routes(config: &Config) -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router(config)
}
