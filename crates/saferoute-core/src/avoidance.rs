//! Hazard avoidance: flags hazards on the straight path and proposes bypass points.
//!
//! Nothing here computes a route. The output is fed to a road-routing provider
//! by [`crate::planner`].

use crate::models::{Hazard, Location};
use crate::rules::AvoidanceRules;
use crate::spatial::{
    bearing, distance_to_path_m, haversine_distance, offset_by_bearing, project_onto_segment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::FRAC_PI_2;

/// Segments shorter than this are treated as origin == destination.
const DEGENERATE_SEGMENT_M: f64 = 0.01;

/// Hazards obstructing the straight path and the detour points around them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceResult {
    /// Hazard ids in encounter order, without duplicates
    pub hazards_in_path: Vec<String>,
    /// Waypoints to insert between origin and destination
    pub detour_waypoints: Vec<Location>,
}

impl AvoidanceResult {
    pub fn is_empty(&self) -> bool {
        self.hazards_in_path.is_empty() && self.detour_waypoints.is_empty()
    }
}

/// Compute avoidance with a custom buffer factor and default safety margin.
pub fn compute_avoidance(
    origin: Location,
    destination: Location,
    hazards: &[Hazard],
    buffer_factor: f64,
) -> AvoidanceResult {
    let rules = AvoidanceRules::default().with_buffer_factor(buffer_factor);
    compute_avoidance_with_rules(origin, destination, hazards, &rules)
}

/// Compute avoidance using the configured rules.
pub fn compute_avoidance_with_rules(
    origin: Location,
    destination: Location,
    hazards: &[Hazard],
    rules: &AvoidanceRules,
) -> AvoidanceResult {
    if is_degenerate_segment(origin, destination) {
        return AvoidanceResult::default();
    }

    let in_path: Vec<&Hazard> = encounter_order(
        origin,
        destination,
        hazards.iter().filter(|hazard| {
            let projection = project_onto_segment(hazard.location, origin, destination);
            projection.within_segment()
                && projection.cross_track_m < buffered_radius_m(hazard, rules)
        }),
    );

    let mut seen = HashSet::new();
    let hazards_in_path = in_path
        .iter()
        .filter(|hazard| seen.insert(hazard.id.as_str()))
        .map(|hazard| hazard.id.clone())
        .collect();

    AvoidanceResult {
        hazards_in_path,
        detour_waypoints: detour_waypoints(origin, destination, in_path, rules),
    }
}

/// True when origin and destination coincide.
pub fn is_degenerate_segment(origin: Location, destination: Location) -> bool {
    haversine_distance(origin, destination) < DEGENERATE_SEGMENT_M
}

/// Impact radius scaled by the buffer factor.
pub fn buffered_radius_m(hazard: &Hazard, rules: &AvoidanceRules) -> f64 {
    hazard.impact_radius_m * rules.buffer_factor
}

/// Sort hazards by where their projection falls along origin → destination.
///
/// Ties keep input order.
pub fn encounter_order<'a>(
    origin: Location,
    destination: Location,
    hazards: impl IntoIterator<Item = &'a Hazard>,
) -> Vec<&'a Hazard> {
    let mut keyed: Vec<(f64, &Hazard)> = hazards
        .into_iter()
        .map(|hazard| {
            let along = project_onto_segment(hazard.location, origin, destination).along_track_m;
            (along, hazard)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, hazard)| hazard).collect()
}

/// Detour points on the left and right of each hazard, perpendicular to the
/// origin → destination bearing.
///
/// Points whose rounded coordinates were already emitted are dropped.
pub fn detour_waypoints<'a>(
    origin: Location,
    destination: Location,
    hazards: impl IntoIterator<Item = &'a Hazard>,
    rules: &AvoidanceRules,
) -> Vec<Location> {
    if is_degenerate_segment(origin, destination) {
        return Vec::new();
    }

    let heading = bearing(origin, destination);
    let mut seen = HashSet::new();
    let mut waypoints = Vec::new();

    for hazard in hazards {
        let clearance_m = buffered_radius_m(hazard, rules) + rules.safety_margin_m;
        if !clearance_m.is_finite() {
            continue;
        }
        for side in [-FRAC_PI_2, FRAC_PI_2] {
            let waypoint = offset_by_bearing(hazard.location, clearance_m, heading + side);
            if seen.insert(waypoint.rounded_key()) {
                waypoints.push(waypoint);
            }
        }
    }

    waypoints
}

/// Hazards whose buffered radius reaches any leg of `path`.
pub fn hazards_crossing_path<'a>(
    path: &[Location],
    hazards: &'a [Hazard],
    rules: &AvoidanceRules,
) -> Vec<&'a Hazard> {
    hazards
        .iter()
        .filter(|hazard| {
            distance_to_path_m(hazard.location, path)
                .is_some_and(|distance| distance < buffered_radius_m(hazard, rules))
        })
        .collect()
}
