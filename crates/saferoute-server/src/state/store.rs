//! Shared application state.

use dashmap::DashMap;
use saferoute_core::{RequestGeneration, RequestTicket, RoutePlanner, Shelter};
use std::time::{Duration, Instant};

use super::hazards::HazardStore;
use crate::cache::{prune_cache, CacheEntry};
use crate::provider::ServerProvider;

const MAX_TRACKED_SESSIONS: usize = 10_000;
const SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

struct SessionGeneration {
    generation: RequestGeneration,
    touched_at: Instant,
}

impl CacheEntry for SessionGeneration {
    fn touched_at(&self) -> Instant {
        self.touched_at
    }
}

/// Application state - hazards, shelters, and per-session route generations.
pub struct AppState {
    hazards: HazardStore,
    shelters: Vec<Shelter>,
    planner: RoutePlanner<ServerProvider>,
    sessions: DashMap<String, SessionGeneration>,
}

impl AppState {
    pub fn new(
        hazards: HazardStore,
        shelters: Vec<Shelter>,
        planner: RoutePlanner<ServerProvider>,
    ) -> Self {
        Self {
            hazards,
            shelters,
            planner,
            sessions: DashMap::new(),
        }
    }

    pub fn hazards(&self) -> &HazardStore {
        &self.hazards
    }

    pub fn shelters(&self) -> &[Shelter] {
        &self.shelters
    }

    pub fn get_shelter(&self, id: &str) -> Option<&Shelter> {
        self.shelters.iter().find(|shelter| shelter.id == id)
    }

    pub fn planner(&self) -> &RoutePlanner<ServerProvider> {
        &self.planner
    }

    /// Start a planning request for `session_id`, superseding the session's
    /// earlier in-flight requests.
    pub fn begin_route_request(&self, session_id: &str) -> RequestTicket {
        let ticket = {
            let mut entry = self
                .sessions
                .entry(session_id.to_string())
                .or_insert_with(|| SessionGeneration {
                    generation: RequestGeneration::new(),
                    touched_at: Instant::now(),
                });
            entry.touched_at = Instant::now();
            entry.generation.begin()
        };
        if self.sessions.len() > MAX_TRACKED_SESSIONS {
            prune_cache(&self.sessions, MAX_TRACKED_SESSIONS, SESSION_IDLE_TTL);
        }
        ticket
    }

    pub fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }
}
