//! SafeRoute CLI - command line tools for the SafeRoute backend.
//!
//! The `saferoute` binary runs avoidance and mock generation offline and
//! talks to a running server for reports, feeds, and route planning.

pub mod client;

pub use client::SafeRouteClient;

use anyhow::{Context, Result};
use saferoute_core::{Hazard, HazardDocument, Location};
use std::path::Path;

/// Parse `"lat,lng"` into a validated location.
pub fn parse_location(value: &str) -> Result<Location, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{value}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;
    let location = Location::new(lat, lng);
    if !location.is_valid() {
        return Err(format!("location {location} is out of range"));
    }
    Ok(location)
}

/// Read hazards from a `{ "hazards": [...] }` document or a bare array.
pub fn load_hazards(path: &Path) -> Result<Vec<Hazard>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = HazardDocument::parse(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(document.hazards)
}
