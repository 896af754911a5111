//! Shelter lookup and location analysis.

use crate::models::{Hazard, Location, Shelter};
use crate::spatial::haversine_distance;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANALYSIS_RADIUS_M: f64 = 2_000.0;
pub const DEFAULT_SHELTER_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelterDistance {
    pub shelter: Shelter,
    pub distance_m: f64,
}

/// Active shelters with free capacity, nearest first.
pub fn nearest_shelters(
    from: Location,
    shelters: &[Shelter],
    limit: usize,
) -> Vec<ShelterDistance> {
    let mut candidates: Vec<ShelterDistance> = shelters
        .iter()
        .filter(|shelter| shelter.is_accepting())
        .map(|shelter| ShelterDistance {
            shelter: shelter.clone(),
            distance_m: haversine_distance(from, shelter.location),
        })
        .collect();
    candidates.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    candidates.truncate(limit);
    candidates
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyHazard {
    pub hazard: Hazard,
    /// Distance from the queried location to the hazard center
    pub distance_m: f64,
    /// Queried location lies within the hazard's impact radius
    pub inside_impact_area: bool,
}

/// Hazards and shelters relevant to one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationAnalysis {
    pub location: Location,
    pub nearby_hazards: Vec<NearbyHazard>,
    pub recommended_shelters: Vec<ShelterDistance>,
    pub response: String,
}

/// Collect hazards whose impact area comes within `radius_m` of `location`
/// and recommend shelters that are open and outside every impact area.
pub fn analyze_location(
    location: Location,
    hazards: &[Hazard],
    shelters: &[Shelter],
    radius_m: f64,
    shelter_limit: usize,
) -> LocationAnalysis {
    let mut nearby_hazards: Vec<NearbyHazard> = hazards
        .iter()
        .filter_map(|hazard| {
            let distance_m = haversine_distance(location, hazard.location);
            (distance_m - hazard.impact_radius_m <= radius_m).then(|| NearbyHazard {
                hazard: hazard.clone(),
                distance_m,
                inside_impact_area: distance_m <= hazard.impact_radius_m,
            })
        })
        .collect();
    nearby_hazards.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

    let safe_shelters: Vec<Shelter> = shelters
        .iter()
        .filter(|shelter| {
            hazards.iter().all(|hazard| {
                haversine_distance(shelter.location, hazard.location) > hazard.impact_radius_m
            })
        })
        .cloned()
        .collect();
    let recommended_shelters = nearest_shelters(location, &safe_shelters, shelter_limit);

    let response = summarize(&nearby_hazards, &recommended_shelters, radius_m);
    LocationAnalysis {
        location,
        nearby_hazards,
        recommended_shelters,
        response,
    }
}

fn summarize(hazards: &[NearbyHazard], shelters: &[ShelterDistance], radius_m: f64) -> String {
    let mut parts = Vec::new();
    match hazards.iter().find(|nearby| nearby.inside_impact_area) {
        Some(inside) => parts.push(format!(
            "You are inside the impact area of a {} {} hazard. Move away now.",
            inside.hazard.severity.as_str(),
            inside.hazard.hazard_type.as_str()
        )),
        None if hazards.is_empty() => {
            parts.push(format!("No reported hazards within {:.0} m.", radius_m))
        }
        None => parts.push(format!(
            "{} reported hazard(s) within {:.0} m.",
            hazards.len(),
            radius_m
        )),
    }
    match shelters.first() {
        Some(nearest) => parts.push(format!(
            "Nearest open shelter: {} ({:.1} km, {} places free).",
            nearest.shelter.name,
            nearest.distance_m / 1000.0,
            nearest.shelter.available_capacity()
        )),
        None => parts.push("No open shelter with free capacity found.".to_string()),
    }
    parts.join(" ")
}
