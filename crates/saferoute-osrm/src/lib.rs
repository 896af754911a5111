//! SafeRoute OSRM - road routing through an OSRM HTTP endpoint
//!
//! Implements the core [`saferoute_core::RouteProvider`] seam.

pub mod client;

pub use client::{parse_route_response, OsrmClient, DEFAULT_OSRM_URL};
