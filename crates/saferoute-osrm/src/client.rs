//! OSRM `route` service client.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use saferoute_core::{Location, ProviderError, ProviderRoute, RouteProvider};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// HTTP client for an OSRM routing server.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// GeoJSON order: `[lng, lat]`
    coordinates: Vec<[f64; 2]>,
}

impl OsrmClient {
    pub fn new(
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
            request_id: None,
        })
    }

    /// Forward the caller's request id to OSRM as `X-Request-ID`.
    pub fn set_request_id(&mut self, request_id: Option<String>) {
        self.request_id = request_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn apply_request_id(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.request_id.as_deref() {
            Some(value) => request.header("X-Request-ID", value),
            None => request,
        }
    }

    /// `{base}/route/v1/{profile}/{lng,lat;lng,lat;...}` with full GeoJSON geometry.
    pub fn route_url(&self, waypoints: &[Location]) -> String {
        let coordinates = waypoints
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lng, point.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url, self.profile, coordinates
        )
    }
}

impl RouteProvider for OsrmClient {
    async fn route(&self, waypoints: &[Location]) -> Result<ProviderRoute, ProviderError> {
        if waypoints.len() < 2 {
            return Err(ProviderError::InvalidResponse(
                "at least two waypoints are required".to_string(),
            ));
        }

        let url = self.route_url(waypoints);
        debug!(waypoints = waypoints.len(), %url, "requesting OSRM route");

        let response = self
            .apply_request_id(self.client.get(&url))
            .send()
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Unavailable(format!("OSRM returned {status}")));
        }

        // OSRM reports NoRoute and InvalidQuery as 400 with a JSON body.
        let body = response
            .text()
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;
        parse_route_response(&body)
    }
}

/// Parse an OSRM `route` response body.
pub fn parse_route_response(body: &str) -> Result<ProviderRoute, ProviderError> {
    let response: RouteResponse = serde_json::from_str(body)
        .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;

    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Err(ProviderError::NoRoute),
        other => {
            return Err(ProviderError::InvalidResponse(format!(
                "{}: {}",
                other,
                response.message.unwrap_or_default()
            )))
        }
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(ProviderError::NoRoute)?;
    let path: Vec<Location> = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Location::new(lat, lng))
        .collect();
    if path.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "route geometry is empty".to_string(),
        ));
    }

    Ok(ProviderRoute {
        path,
        distance_m: route.distance,
        duration_s: route.duration,
    })
}
