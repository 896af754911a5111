pub mod avoidance;
pub mod feed;
pub mod generation;
pub mod mock;
pub mod models;
pub mod planner;
pub mod repository;
pub mod rules;
pub mod shelters;
pub mod spatial;

pub use avoidance::{
    compute_avoidance, compute_avoidance_with_rules, hazards_crossing_path, AvoidanceResult,
};
pub use feed::{build_feed, FeedFilter, FeedOrder, HazardStats};
pub use generation::{RequestGeneration, RequestTicket};
pub use models::{
    FallbackReason, Hazard, HazardReport, HazardSeverity, HazardType, Location, Route,
    RouteOutcome, Shelter, ShelterStatus, ValidationError,
};
pub use planner::{
    PlanError, PlanPhase, PlannedRoute, ProviderError, ProviderRoute, RoutePlanner, RouteProvider,
    StraightLineProvider,
};
pub use repository::{
    HazardDocument, HazardRepository, InMemoryHazardRepository, InMemoryShelterRepository,
    RepositoryError, ShelterDocument, ShelterRepository,
};
pub use rules::AvoidanceRules;
pub use shelters::{
    analyze_location, nearest_shelters, LocationAnalysis, NearbyHazard, ShelterDistance,
};
pub use spatial::haversine_distance;
