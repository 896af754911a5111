//! Server configuration from environment.

use saferoute_core::AvoidanceRules;
use saferoute_osrm::DEFAULT_OSRM_URL;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingProviderKind {
    Osrm,
    /// Offline great-circle legs, no network
    StraightLine,
}

impl FromStr for RoutingProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "osrm" => Ok(Self::Osrm),
            "straight_line" | "straight-line" | "offline" => Ok(Self::StraightLine),
            other => Err(format!("unknown routing provider '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    pub shelters_path: String,
    pub routing_provider: RoutingProviderKind,
    pub osrm_url: String,
    pub osrm_profile: String,
    pub osrm_timeout: Duration,
    /// Bearer token for hazard verification. Verification is disabled when unset.
    pub admin_token: Option<String>,
    pub rules: AvoidanceRules,
    pub seed_mock_data: bool,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_path: "data/saferoute.db".to_string(),
            database_max_connections: 5,
            shelters_path: "data/shelters.json".to_string(),
            routing_provider: RoutingProviderKind::Osrm,
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            osrm_profile: "driving".to_string(),
            osrm_timeout: Duration::from_secs(10),
            admin_token: None,
            rules: AvoidanceRules::default(),
            seed_mock_data: false,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rules = AvoidanceRules {
            buffer_factor: parse_env("SAFEROUTE_BUFFER_FACTOR")
                .unwrap_or(defaults.rules.buffer_factor),
            safety_margin_m: parse_env("SAFEROUTE_SAFETY_MARGIN_M")
                .unwrap_or(defaults.rules.safety_margin_m),
            max_detour_ratio: parse_env("SAFEROUTE_MAX_DETOUR_RATIO")
                .unwrap_or(defaults.rules.max_detour_ratio),
        }
        .sanitized();

        Self {
            server_port: parse_env("SAFEROUTE_PORT").unwrap_or(defaults.server_port),
            database_path: env::var("SAFEROUTE_DATABASE_PATH").unwrap_or(defaults.database_path),
            database_max_connections: parse_env("SAFEROUTE_DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections)
                .max(1),
            shelters_path: env::var("SAFEROUTE_SHELTERS_PATH").unwrap_or(defaults.shelters_path),
            routing_provider: parse_env("SAFEROUTE_ROUTING_PROVIDER")
                .unwrap_or(defaults.routing_provider),
            osrm_url: env::var("SAFEROUTE_OSRM_URL").unwrap_or(defaults.osrm_url),
            osrm_profile: env::var("SAFEROUTE_OSRM_PROFILE").unwrap_or(defaults.osrm_profile),
            osrm_timeout: parse_env("SAFEROUTE_OSRM_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.osrm_timeout),
            admin_token: env::var("SAFEROUTE_ADMIN_TOKEN")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            rules,
            seed_mock_data: env_flag("SAFEROUTE_SEED_MOCK"),
            log_json: env::var("SAFEROUTE_LOG_FORMAT")
                .map(|value| value.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
