//! Road-routing provider selected from config.

use anyhow::Result;
use saferoute_core::{
    Location, ProviderError, ProviderRoute, RouteProvider, StraightLineProvider,
};
use saferoute_osrm::OsrmClient;

use crate::config::{Config, RoutingProviderKind};

#[derive(Debug, Clone)]
pub enum ServerProvider {
    Osrm(OsrmClient),
    StraightLine(StraightLineProvider),
}

impl ServerProvider {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(match config.routing_provider {
            RoutingProviderKind::Osrm => Self::Osrm(OsrmClient::new(
                config.osrm_url.clone(),
                config.osrm_profile.clone(),
                config.osrm_timeout,
            )?),
            RoutingProviderKind::StraightLine => {
                Self::StraightLine(StraightLineProvider::default())
            }
        })
    }

    /// Copy of this provider that tags outgoing requests with `request_id`.
    pub fn with_request_id(&self, request_id: Option<String>) -> Self {
        match self {
            Self::Osrm(client) => {
                let mut client = client.clone();
                client.set_request_id(request_id);
                Self::Osrm(client)
            }
            Self::StraightLine(provider) => Self::StraightLine(*provider),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Osrm(_) => "osrm",
            Self::StraightLine(_) => "straight_line",
        }
    }
}

impl RouteProvider for ServerProvider {
    async fn route(&self, waypoints: &[Location]) -> Result<ProviderRoute, ProviderError> {
        match self {
            Self::Osrm(client) => client.route(waypoints).await,
            Self::StraightLine(provider) => provider.route(waypoints).await,
        }
    }
}
