//! SafeRoute server client.

use anyhow::{bail, Context, Result};
use saferoute_core::{
    FeedFilter, FeedOrder, Hazard, HazardReport, HazardStats, Location, PlannedRoute,
    ShelterDistance,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Client for the SafeRoute REST API.
pub struct SafeRouteClient {
    base_url: String,
    admin_token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct PlanRequest<'a> {
    origin: Location,
    destination: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

impl SafeRouteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Bearer token for moderator endpoints.
    pub fn set_admin_token(&mut self, token: Option<String>) {
        self.admin_token = token.filter(|value| !value.trim().is_empty());
    }

    pub async fn report_hazard(&self, report: &HazardReport) -> Result<Hazard> {
        let response = self
            .client
            .post(format!("{}/v1/hazards", self.base_url))
            .json(report)
            .send()
            .await
            .context("Failed to send hazard report")?;
        read_json(response).await
    }

    pub async fn list_hazards(&self, filter: &FeedFilter, order: FeedOrder) -> Result<Vec<Hazard>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(kind) = filter.hazard_type {
            query.push(("type", kind.as_str().to_string()));
        }
        if let Some(severity) = filter.severity {
            query.push(("severity", severity.as_str().to_string()));
        }
        if let Some(verified) = filter.verified {
            query.push(("verified", verified.to_string()));
        }
        let sort = match order {
            FeedOrder::Recent => "recent",
            FeedOrder::Severity => "severity",
        };
        query.push(("sort", sort.to_string()));

        let response = self
            .client
            .get(format!("{}/v1/hazards", self.base_url))
            .query(&query)
            .send()
            .await
            .context("Failed to fetch hazards")?;
        read_json(response).await
    }

    pub async fn hazard_stats(&self) -> Result<HazardStats> {
        let response = self
            .client
            .get(format!("{}/v1/hazards/stats", self.base_url))
            .send()
            .await
            .context("Failed to fetch hazard stats")?;
        read_json(response).await
    }

    pub async fn upvote_hazard(&self, id: &str) -> Result<Hazard> {
        let response = self
            .client
            .post(format!("{}/v1/hazards/{}/upvote", self.base_url, id))
            .send()
            .await
            .context("Failed to upvote hazard")?;
        read_json(response).await
    }

    pub async fn verify_hazard(&self, id: &str, verified: bool) -> Result<Hazard> {
        let Some(token) = self.admin_token.as_deref() else {
            bail!("verifying hazards requires an admin token");
        };
        let response = self
            .client
            .post(format!("{}/v1/hazards/{}/verify", self.base_url, id))
            .bearer_auth(token)
            .json(&serde_json::json!({ "verified": verified }))
            .send()
            .await
            .context("Failed to verify hazard")?;
        read_json(response).await
    }

    pub async fn nearest_shelters(
        &self,
        from: Location,
        limit: usize,
    ) -> Result<Vec<ShelterDistance>> {
        let response = self
            .client
            .get(format!("{}/v1/shelters/nearest", self.base_url))
            .query(&[
                ("lat", from.lat.to_string()),
                ("lng", from.lng.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch shelters")?;
        read_json(response).await
    }

    pub async fn plan_route(
        &self,
        origin: Location,
        destination: Location,
        session_id: Option<&str>,
    ) -> Result<PlannedRoute> {
        let response = self
            .client
            .post(format!("{}/v1/routes/plan", self.base_url))
            .json(&PlanRequest {
                origin,
                destination,
                session_id,
            })
            .send()
            .await
            .context("Failed to request route")?;
        read_json(response).await
    }
}

/// Decode a success body, or surface the server's `{ "error": ... }` message.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value["error"].as_str().map(str::to_string))
            .unwrap_or(body);
        bail!("server returned {}: {}", status, message);
    }
    response
        .json::<T>()
        .await
        .context("Failed to parse server response")
}
