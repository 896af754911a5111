//! Core data models for SafeRoute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the map in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Rounded coordinate key used to detect coinciding points.
    pub fn rounded_key(&self) -> (i64, i64) {
        (
            (self.lat * 1e6).round() as i64,
            (self.lng * 1e6).round() as i64,
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    Flood,
    Fire,
    Earthquake,
    Landslide,
    Storm,
    Other,
}

impl HazardType {
    pub const ALL: [HazardType; 6] = [
        HazardType::Flood,
        HazardType::Fire,
        HazardType::Earthquake,
        HazardType::Landslide,
        HazardType::Storm,
        HazardType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::Flood => "flood",
            HazardType::Fire => "fire",
            HazardType::Earthquake => "earthquake",
            HazardType::Landslide => "landslide",
            HazardType::Storm => "storm",
            HazardType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HazardSeverity {
    pub const ALL: [HazardSeverity; 4] = [
        HazardSeverity::Low,
        HazardSeverity::Medium,
        HazardSeverity::High,
        HazardSeverity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardSeverity::Low => "low",
            HazardSeverity::Medium => "medium",
            HazardSeverity::High => "high",
            HazardSeverity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Impact radius assigned to a report that does not carry one.
    pub fn default_impact_radius_m(&self) -> f64 {
        match self {
            HazardSeverity::Critical => 500.0,
            HazardSeverity::High => 400.0,
            HazardSeverity::Medium => 300.0,
            HazardSeverity::Low => 200.0,
        }
    }
}

/// A reported environmental danger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: String,
    pub location: Location,
    /// Radius of effect in meters
    pub impact_radius_m: f64,
    pub severity: HazardSeverity,
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reported_by: String,
    pub reported_at: DateTime<Utc>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Hazard {
    /// Hazards loaded from files must carry a usable location and radius.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.location.is_valid() {
            return Err(ValidationError::InvalidLocation(self.location));
        }
        if !self.impact_radius_m.is_finite() || self.impact_radius_m <= 0.0 {
            return Err(ValidationError::InvalidImpactRadius(self.impact_radius_m));
        }
        Ok(())
    }

    pub fn upvote(&mut self) {
        self.upvotes = self.upvotes.saturating_add(1);
    }

    pub fn set_verified(&mut self, verified: bool) {
        self.verified = verified;
    }
}

/// Hazard submission from a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardReport {
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub severity: HazardSeverity,
    pub location: Location,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reported_by: Option<String>,
    /// Overrides the severity default when present
    #[serde(default)]
    pub impact_radius_m: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl HazardReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.location.is_valid() {
            return Err(ValidationError::InvalidLocation(self.location));
        }
        if let Some(radius) = self.impact_radius_m {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ValidationError::InvalidImpactRadius(radius));
            }
        }
        Ok(())
    }

    /// Turn the report into an unverified hazard with the given id.
    pub fn into_hazard(self, id: impl Into<String>, reported_at: DateTime<Utc>) -> Hazard {
        let impact_radius_m = self
            .impact_radius_m
            .unwrap_or_else(|| self.severity.default_impact_radius_m());
        Hazard {
            id: id.into(),
            location: self.location,
            impact_radius_m,
            severity: self.severity,
            hazard_type: self.hazard_type,
            description: self.description,
            reported_by: self
                .reported_by
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| "User Report".to_string()),
            reported_at,
            verified: false,
            upvotes: 0,
            image: self.image,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelterStatus {
    #[default]
    Active,
    Inactive,
}

/// A designated safe facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub capacity: u32,
    #[serde(default)]
    pub current_occupancy: u32,
    pub facility_type: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub status: ShelterStatus,
}

impl Shelter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.location.is_valid() {
            return Err(ValidationError::InvalidLocation(self.location));
        }
        if self.capacity == 0 {
            return Err(ValidationError::ZeroCapacity(self.id.clone()));
        }
        if self.current_occupancy > self.capacity {
            return Err(ValidationError::OverCapacity {
                id: self.id.clone(),
                occupancy: self.current_occupancy,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_occupancy)
    }

    pub fn is_accepting(&self) -> bool {
        self.status == ShelterStatus::Active && self.available_capacity() > 0
    }
}

/// Which branch of the fallback decision produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Plain route did not cross any hazard buffer
    Direct,
    /// Detour waypoints were accepted
    Detoured,
    /// Plain route kept even though it crosses a hazard buffer
    FellBack { reason: FallbackReason },
    /// Origin and destination coincide
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No detour waypoints could be produced
    NoViableDetour,
    /// The provider failed on the detour request
    DetourFailed,
    /// The detour exceeded the allowed distance ratio
    DetourTooLong,
}

/// A computed path hint between two points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub origin: Location,
    pub destination: Location,
    /// Requested waypoints, origin and destination excluded
    pub waypoints: Vec<Location>,
    /// Provider geometry
    #[serde(default)]
    pub path: Vec<Location>,
    pub hazards_avoided: Vec<String>,
    pub distance_km: f64,
    pub estimated_time_min: f64,
    pub outcome: RouteOutcome,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid location {0}")]
    InvalidLocation(Location),
    #[error("impact radius must be positive and finite, got {0}")]
    InvalidImpactRadius(f64),
    #[error("shelter {0} has zero capacity")]
    ZeroCapacity(String),
    #[error("shelter {id} occupancy {occupancy} exceeds capacity {capacity}")]
    OverCapacity {
        id: String,
        occupancy: u32,
        capacity: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(severity: HazardSeverity) -> HazardReport {
        HazardReport {
            hazard_type: HazardType::Flood,
            severity,
            location: Location::new(27.6228, 85.5412),
            description: "river over the road".to_string(),
            reported_by: None,
            impact_radius_m: None,
            image: None,
        }
    }

    #[test]
    fn report_uses_severity_default_radius() {
        let hazard = report(HazardSeverity::Critical).into_hazard("h1", Utc::now());
        assert_eq!(hazard.impact_radius_m, 500.0);
        assert_eq!(hazard.reported_by, "User Report");
        assert!(!hazard.verified);
        assert_eq!(hazard.upvotes, 0);

        let hazard = report(HazardSeverity::Low).into_hazard("h2", Utc::now());
        assert_eq!(hazard.impact_radius_m, 200.0);
    }

    #[test]
    fn report_rejects_bad_radius_and_location() {
        let mut bad = report(HazardSeverity::High);
        bad.impact_radius_m = Some(0.0);
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidImpactRadius(_))
        ));

        let mut bad = report(HazardSeverity::High);
        bad.location = Location::new(91.0, 0.0);
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidLocation(_))
        ));
    }

    #[test]
    fn severity_orders_low_to_critical() {
        assert!(HazardSeverity::Critical > HazardSeverity::High);
        assert!(HazardSeverity::Medium > HazardSeverity::Low);
        assert_eq!(HazardSeverity::parse("HIGH"), Some(HazardSeverity::High));
        assert_eq!(HazardType::parse("landslide"), Some(HazardType::Landslide));
        assert_eq!(HazardType::parse("meteor"), None);
    }

    #[test]
    fn hazard_json_uses_type_field() {
        let hazard = report(HazardSeverity::Medium).into_hazard("h3", Utc::now());
        let value = serde_json::to_value(&hazard).unwrap();
        assert_eq!(value["type"], "flood");
        assert_eq!(value["severity"], "medium");
        assert!(value.get("image").is_none());
    }

    #[test]
    fn shelter_capacity_rules() {
        let mut shelter = Shelter {
            id: "s1".to_string(),
            name: "Dhulikhel Hospital".to_string(),
            location: Location::new(27.62, 85.54),
            capacity: 100,
            current_occupancy: 100,
            facility_type: "Hospital".to_string(),
            contact: String::new(),
            facilities: vec![],
            status: ShelterStatus::Active,
        };
        assert!(shelter.validate().is_ok());
        assert!(!shelter.is_accepting());

        shelter.current_occupancy = 101;
        assert!(matches!(
            shelter.validate(),
            Err(ValidationError::OverCapacity { .. })
        ));

        shelter.capacity = 0;
        assert!(matches!(
            shelter.validate(),
            Err(ValidationError::ZeroCapacity(_))
        ));
    }
}
