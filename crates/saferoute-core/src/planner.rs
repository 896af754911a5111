//! Fallback decision around an external road-routing provider.
//!
//! The plain request is retried once on provider failure. When the plain path
//! crosses a hazard buffer the planner asks again with detour waypoints and
//! keeps the detour only if it is not much longer than the plain path.

use crate::avoidance::{
    compute_avoidance_with_rules, detour_waypoints, encounter_order, hazards_crossing_path,
    is_degenerate_segment,
};
use crate::generation::RequestTicket;
use crate::models::{FallbackReason, Hazard, Location, Route, RouteOutcome};
use crate::rules::AvoidanceRules;
use crate::spatial::path_length_m;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, info, warn};

const PLAIN_ATTEMPTS: u32 = 2;

/// Geometry and summary returned by a routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRoute {
    pub path: Vec<Location>,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("routing provider unavailable: {0}")]
    Unavailable(String),
    #[error("routing provider returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("routing provider found no route")]
    NoRoute,
}

/// Road-routing service consumed by the planner.
pub trait RouteProvider {
    /// Route through `waypoints` in order. The first and last entries are the
    /// origin and destination.
    fn route(
        &self,
        waypoints: &[Location],
    ) -> impl Future<Output = Result<ProviderRoute, ProviderError>> + Send;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("routing failed after {attempts} attempts: {source}")]
    RoutingFailed {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
    #[error("request {generation} superseded by request {latest}")]
    Superseded { generation: u64, latest: u64 },
}

/// Steps taken while planning, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PlanPhase {
    Pending { attempt: u32 },
    ProviderResult { attempt: u32, distance_m: f64 },
    ProviderError { attempt: u32, message: String },
    DetourRequested { waypoints: usize },
    DetourResult { distance_m: f64 },
    DetourError { message: String },
    Accepted { outcome: RouteOutcome },
    Failed,
}

/// A route together with the phases that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub route: Route,
    pub phases: Vec<PlanPhase>,
}

/// Plans hazard-aware routes through a [`RouteProvider`].
#[derive(Debug, Clone)]
pub struct RoutePlanner<P> {
    provider: P,
    rules: AvoidanceRules,
}

impl<P: RouteProvider> RoutePlanner<P> {
    pub fn new(provider: P, rules: AvoidanceRules) -> Self {
        Self {
            provider,
            rules: rules.sanitized(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn rules(&self) -> &AvoidanceRules {
        &self.rules
    }

    /// Same rules, different provider.
    pub fn with_provider<Q: RouteProvider>(&self, provider: Q) -> RoutePlanner<Q> {
        RoutePlanner {
            provider,
            rules: self.rules,
        }
    }

    /// Plan a route, discarding the result if `ticket` was superseded meanwhile.
    pub async fn plan_for_ticket(
        &self,
        ticket: &RequestTicket,
        route_id: impl Into<String>,
        origin: Location,
        destination: Location,
        hazards: &[Hazard],
    ) -> Result<PlannedRoute, PlanError> {
        let result = self.plan(route_id, origin, destination, hazards).await;
        if !ticket.is_current() {
            debug!(
                generation = ticket.generation(),
                latest = ticket.latest_generation(),
                "discarding stale route result"
            );
            return Err(PlanError::Superseded {
                generation: ticket.generation(),
                latest: ticket.latest_generation(),
            });
        }
        result
    }

    /// Plan a route from `origin` to `destination` around `hazards`.
    ///
    /// `hazards` is treated as a read-only snapshot for the whole call.
    pub async fn plan(
        &self,
        route_id: impl Into<String>,
        origin: Location,
        destination: Location,
        hazards: &[Hazard],
    ) -> Result<PlannedRoute, PlanError> {
        let route_id = route_id.into();
        let mut phases = Vec::new();

        if is_degenerate_segment(origin, destination) {
            debug!(%origin, "origin equals destination, nothing to route");
            let outcome = RouteOutcome::Degenerate;
            phases.push(PlanPhase::Accepted { outcome });
            return Ok(PlannedRoute {
                route: Route {
                    id: route_id,
                    origin,
                    destination,
                    waypoints: Vec::new(),
                    path: vec![origin],
                    hazards_avoided: Vec::new(),
                    distance_km: 0.0,
                    estimated_time_min: 0.0,
                    outcome,
                },
                phases,
            });
        }

        let straight = compute_avoidance_with_rules(origin, destination, hazards, &self.rules);
        let plain_waypoints = [origin, destination];
        let plain = self.request_plain(&plain_waypoints, &mut phases).await?;

        let crossing = hazards_crossing_path(&plain.path, hazards, &self.rules);
        if crossing.is_empty() {
            let avoided = avoided_ids(
                &straight.hazards_in_path,
                &[],
                &plain.path,
                hazards,
                &self.rules,
            );
            return Ok(self.accept(
                route_id,
                origin,
                destination,
                Vec::new(),
                plain,
                avoided,
                RouteOutcome::Direct,
                phases,
            ));
        }

        let crossing_ids: Vec<String> = crossing.iter().map(|hazard| hazard.id.clone()).collect();
        info!(
            hazards = crossing_ids.len(),
            "plain route crosses hazard buffers, requesting detour"
        );

        let detours = detour_waypoints(
            origin,
            destination,
            encounter_order(origin, destination, crossing),
            &self.rules,
        );
        // Only a hazard whose clearance overflows to infinity yields no
        // detour point.
        if detours.is_empty() {
            let avoided = avoided_ids(
                &straight.hazards_in_path,
                &crossing_ids,
                &plain.path,
                hazards,
                &self.rules,
            );
            let outcome = RouteOutcome::FellBack {
                reason: FallbackReason::NoViableDetour,
            };
            return Ok(self.accept(
                route_id,
                origin,
                destination,
                Vec::new(),
                plain,
                avoided,
                outcome,
                phases,
            ));
        }

        let mut detour_request = Vec::with_capacity(detours.len() + 2);
        detour_request.push(origin);
        detour_request.extend(detours.iter().copied());
        detour_request.push(destination);
        phases.push(PlanPhase::DetourRequested {
            waypoints: detours.len(),
        });

        match self.provider.route(&detour_request).await {
            Ok(detour) => {
                phases.push(PlanPhase::DetourResult {
                    distance_m: detour.distance_m,
                });
                if self.rules.accepts_detour(plain.distance_m, detour.distance_m) {
                    let avoided = avoided_ids(
                        &straight.hazards_in_path,
                        &crossing_ids,
                        &detour.path,
                        hazards,
                        &self.rules,
                    );
                    Ok(self.accept(
                        route_id,
                        origin,
                        destination,
                        detours,
                        detour,
                        avoided,
                        RouteOutcome::Detoured,
                        phases,
                    ))
                } else {
                    info!(
                        plain_m = plain.distance_m,
                        detour_m = detour.distance_m,
                        max_ratio = self.rules.max_detour_ratio,
                        "detour too long, keeping plain route"
                    );
                    let avoided = avoided_ids(
                        &straight.hazards_in_path,
                        &crossing_ids,
                        &plain.path,
                        hazards,
                        &self.rules,
                    );
                    let outcome = RouteOutcome::FellBack {
                        reason: FallbackReason::DetourTooLong,
                    };
                    Ok(self.accept(
                        route_id,
                        origin,
                        destination,
                        Vec::new(),
                        plain,
                        avoided,
                        outcome,
                        phases,
                    ))
                }
            }
            Err(err) => {
                warn!(error = %err, "detour request failed, keeping plain route");
                phases.push(PlanPhase::DetourError {
                    message: err.to_string(),
                });
                let avoided = avoided_ids(
                    &straight.hazards_in_path,
                    &crossing_ids,
                    &plain.path,
                    hazards,
                    &self.rules,
                );
                let outcome = RouteOutcome::FellBack {
                    reason: FallbackReason::DetourFailed,
                };
                Ok(self.accept(
                    route_id,
                    origin,
                    destination,
                    Vec::new(),
                    plain,
                    avoided,
                    outcome,
                    phases,
                ))
            }
        }
    }

    async fn request_plain(
        &self,
        waypoints: &[Location],
        phases: &mut Vec<PlanPhase>,
    ) -> Result<ProviderRoute, PlanError> {
        let mut attempt = 1;
        loop {
            phases.push(PlanPhase::Pending { attempt });
            match self.provider.route(waypoints).await {
                Ok(route) => {
                    phases.push(PlanPhase::ProviderResult {
                        attempt,
                        distance_m: route.distance_m,
                    });
                    return Ok(route);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "plain route request failed");
                    phases.push(PlanPhase::ProviderError {
                        attempt,
                        message: err.to_string(),
                    });
                    if attempt >= PLAIN_ATTEMPTS {
                        phases.push(PlanPhase::Failed);
                        return Err(PlanError::RoutingFailed {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    attempt += 1;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn accept(
        &self,
        route_id: String,
        origin: Location,
        destination: Location,
        waypoints: Vec<Location>,
        chosen: ProviderRoute,
        hazards_avoided: Vec<String>,
        outcome: RouteOutcome,
        mut phases: Vec<PlanPhase>,
    ) -> PlannedRoute {
        debug!(?outcome, distance_m = chosen.distance_m, "route accepted");
        phases.push(PlanPhase::Accepted { outcome });
        PlannedRoute {
            route: Route {
                id: route_id,
                origin,
                destination,
                waypoints,
                path: chosen.path,
                hazards_avoided,
                distance_km: chosen.distance_m / 1000.0,
                estimated_time_min: chosen.duration_s / 60.0,
                outcome,
            },
            phases,
        }
    }
}

/// Offline provider that connects waypoints with great-circle legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineProvider {
    pub speed_mps: f64,
}

impl Default for StraightLineProvider {
    fn default() -> Self {
        // 40 km/h
        Self { speed_mps: 11.11 }
    }
}

impl RouteProvider for StraightLineProvider {
    async fn route(&self, waypoints: &[Location]) -> Result<ProviderRoute, ProviderError> {
        if waypoints.len() < 2 {
            return Err(ProviderError::NoRoute);
        }
        let distance_m = path_length_m(waypoints);
        Ok(ProviderRoute {
            path: waypoints.to_vec(),
            distance_m,
            duration_s: distance_m / self.speed_mps.max(0.1),
        })
    }
}

/// Hazards that obstruct the straight line or the plain road path but not the
/// chosen path, in first-seen order.
fn avoided_ids(
    straight: &[String],
    crossing: &[String],
    chosen_path: &[Location],
    hazards: &[Hazard],
    rules: &AvoidanceRules,
) -> Vec<String> {
    let still_crossing: HashSet<&str> = hazards_crossing_path(chosen_path, hazards, rules)
        .into_iter()
        .map(|hazard| hazard.id.as_str())
        .collect();
    let mut seen = HashSet::new();
    straight
        .iter()
        .chain(crossing)
        .filter(|id| !still_crossing.contains(id.as_str()))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::RequestGeneration;
    use crate::models::{HazardSeverity, HazardType};
    use crate::spatial::path_length_m;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const ORIGIN: Location = Location::new(0.0, 0.0);
    const DESTINATION: Location = Location::new(0.0, 0.1);

    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<ProviderRoute, ProviderError>>>,
        calls: Mutex<Vec<Vec<Location>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<ProviderRoute, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<Location>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RouteProvider for ScriptedProvider {
        async fn route(&self, waypoints: &[Location]) -> Result<ProviderRoute, ProviderError> {
            self.calls.lock().unwrap().push(waypoints.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::Unavailable("script exhausted".into())))
        }
    }

    fn route_along(path: Vec<Location>, scale: f64) -> ProviderRoute {
        let distance_m = path_length_m(&path) * scale;
        ProviderRoute {
            path,
            distance_m,
            duration_s: distance_m / 10.0,
        }
    }

    fn straight_route() -> ProviderRoute {
        route_along(vec![ORIGIN, DESTINATION], 1.0)
    }

    fn bent_route() -> ProviderRoute {
        route_along(vec![ORIGIN, Location::new(0.02, 0.05), DESTINATION], 1.0)
    }

    fn hazard(id: &str, lat: f64, lng: f64) -> Hazard {
        Hazard {
            id: id.to_string(),
            location: Location::new(lat, lng),
            impact_radius_m: 200.0,
            severity: HazardSeverity::Critical,
            hazard_type: HazardType::Flood,
            description: String::new(),
            reported_by: "test".to_string(),
            reported_at: Utc::now(),
            verified: true,
            upvotes: 0,
            image: None,
        }
    }

    fn planner(
        responses: Vec<Result<ProviderRoute, ProviderError>>,
    ) -> RoutePlanner<ScriptedProvider> {
        RoutePlanner::new(ScriptedProvider::new(responses), AvoidanceRules::default())
    }

    #[tokio::test]
    async fn clear_plain_route_is_direct() {
        let planner = planner(vec![Ok(straight_route())]);
        let hazards = vec![hazard("far", 1.0, 1.0)];

        let planned = planner
            .plan("route-1", ORIGIN, DESTINATION, &hazards)
            .await
            .unwrap();

        assert_eq!(planned.route.outcome, RouteOutcome::Direct);
        assert!(planned.route.hazards_avoided.is_empty());
        assert!(planned.route.waypoints.is_empty());
        assert!((planned.route.distance_km - 11.12).abs() < 0.05);
        assert_eq!(planner.provider().calls().len(), 1);
    }

    #[tokio::test]
    async fn crossing_plain_route_takes_acceptable_detour() {
        let planner = planner(vec![Ok(straight_route()), Ok(bent_route())]);
        let hazards = vec![hazard("flood", 0.0, 0.05)];

        let planned = planner
            .plan("route-1", ORIGIN, DESTINATION, &hazards)
            .await
            .unwrap();

        assert_eq!(planned.route.outcome, RouteOutcome::Detoured);
        assert_eq!(planned.route.hazards_avoided, vec!["flood".to_string()]);
        assert_eq!(planned.route.waypoints.len(), 2);

        let calls = planner.provider().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec![ORIGIN, DESTINATION]);
        assert_eq!(calls[1].len(), 4);
        assert_eq!(calls[1].first(), Some(&ORIGIN));
        assert_eq!(calls[1].last(), Some(&DESTINATION));
    }

    #[tokio::test]
    async fn much_longer_detour_falls_back_to_plain() {
        let mut long_detour = bent_route();
        long_detour.distance_m = straight_route().distance_m * 2.5;
        let planner = planner(vec![Ok(straight_route()), Ok(long_detour)]);
        let hazards = vec![hazard("flood", 0.0, 0.05)];

        let planned = planner
            .plan("route-1", ORIGIN, DESTINATION, &hazards)
            .await
            .unwrap();

        assert_eq!(
            planned.route.outcome,
            RouteOutcome::FellBack {
                reason: FallbackReason::DetourTooLong
            }
        );
        assert_eq!(planned.route.distance_km, straight_route().distance_m / 1000.0);
        assert!(planned.route.waypoints.is_empty());
        assert!(planned.route.hazards_avoided.is_empty());
    }

    #[tokio::test]
    async fn failed_detour_keeps_plain_route() {
        let planner = planner(vec![
            Ok(straight_route()),
            Err(ProviderError::Unavailable("timeout".into())),
        ]);
        let hazards = vec![hazard("flood", 0.0, 0.05)];

        let planned = planner
            .plan("route-1", ORIGIN, DESTINATION, &hazards)
            .await
            .unwrap();

        assert_eq!(
            planned.route.outcome,
            RouteOutcome::FellBack {
                reason: FallbackReason::DetourFailed
            }
        );
        assert!(planned
            .phases
            .iter()
            .any(|phase| matches!(phase, PlanPhase::DetourError { .. })));
    }

    #[tokio::test]
    async fn provider_error_is_retried_once_with_plain_waypoints() {
        let planner = planner(vec![
            Err(ProviderError::Unavailable("connection refused".into())),
            Ok(straight_route()),
        ]);

        let planned = planner
            .plan("route-1", ORIGIN, DESTINATION, &[])
            .await
            .unwrap();

        assert_eq!(planned.route.outcome, RouteOutcome::Direct);
        let calls = planner.provider().calls();
        assert_eq!(calls, vec![vec![ORIGIN, DESTINATION], vec![ORIGIN, DESTINATION]]);
        assert_eq!(planned.phases[0], PlanPhase::Pending { attempt: 1 });
        assert!(matches!(planned.phases[1], PlanPhase::ProviderError { attempt: 1, .. }));
        assert_eq!(planned.phases[2], PlanPhase::Pending { attempt: 2 });
    }

    #[tokio::test]
    async fn second_provider_error_fails_routing() {
        let planner = planner(vec![
            Err(ProviderError::Unavailable("down".into())),
            Err(ProviderError::NoRoute),
        ]);

        let err = planner
            .plan("route-1", ORIGIN, DESTINATION, &[])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlanError::RoutingFailed {
                attempts: 2,
                source: ProviderError::NoRoute
            }
        );
        assert_eq!(planner.provider().calls().len(), 2);
    }

    #[tokio::test]
    async fn degenerate_request_skips_provider() {
        let planner = planner(vec![]);
        let hazards = vec![hazard("flood", 0.0, 0.0)];

        let planned = planner
            .plan("route-1", ORIGIN, ORIGIN, &hazards)
            .await
            .unwrap();

        assert_eq!(planned.route.outcome, RouteOutcome::Degenerate);
        assert_eq!(planned.route.distance_km, 0.0);
        assert!(planner.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn superseded_ticket_discards_result() {
        let planner = planner(vec![Ok(straight_route())]);
        let generation = RequestGeneration::new();
        let stale = generation.begin();
        let _newer = generation.begin();

        let err = planner
            .plan_for_ticket(&stale, "route-1", ORIGIN, DESTINATION, &[])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlanError::Superseded {
                generation: 1,
                latest: 2
            }
        );
    }

    #[tokio::test]
    async fn current_ticket_returns_result() {
        let planner = planner(vec![Ok(straight_route())]);
        let generation = RequestGeneration::new();
        let ticket = generation.begin();

        let planned = planner
            .plan_for_ticket(&ticket, "route-7", ORIGIN, DESTINATION, &[])
            .await
            .unwrap();
        assert_eq!(planned.route.id, "route-7");
    }

    #[tokio::test]
    async fn straight_line_provider_detours_through_waypoints() {
        let planner =
            RoutePlanner::new(StraightLineProvider::default(), AvoidanceRules::default());
        let hazards = vec![hazard("flood", 0.0, 0.05)];

        let planned = planner
            .plan("route-9", ORIGIN, DESTINATION, &hazards)
            .await
            .unwrap();

        assert_eq!(planned.route.outcome, RouteOutcome::Detoured);
        assert_eq!(planned.route.waypoints.len(), 2);
        assert_eq!(planned.route.path.len(), 4);
        assert!(planned.route.estimated_time_min > 0.0);
    }

    #[tokio::test]
    async fn unbounded_clearance_keeps_plain_route() {
        let planner = planner(vec![Ok(straight_route())]);
        let mut overflowing = hazard("quake", 0.0, 0.05);
        overflowing.impact_radius_m = f64::MAX;

        let planned = planner
            .plan("route-1", ORIGIN, DESTINATION, &[overflowing])
            .await
            .unwrap();

        assert_eq!(
            planned.route.outcome,
            RouteOutcome::FellBack {
                reason: FallbackReason::NoViableDetour
            }
        );
        assert!(planned.route.waypoints.is_empty());
        assert!(planned.route.hazards_avoided.is_empty());
        assert_eq!(planner.provider().calls().len(), 1);
        assert!(!planned
            .phases
            .iter()
            .any(|phase| matches!(phase, PlanPhase::DetourRequested { .. })));
    }
}
