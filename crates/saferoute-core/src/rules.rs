//! Thresholds for hazard avoidance and detour acceptance.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BUFFER_FACTOR: f64 = 1.2;
pub const DEFAULT_SAFETY_MARGIN_M: f64 = 50.0;
pub const DEFAULT_MAX_DETOUR_RATIO: f64 = 1.5;

/// Configuration for hazard avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceRules {
    /// Multiplier applied to a hazard's impact radius for intersection tests
    pub buffer_factor: f64,
    /// Extra clearance added beyond the buffered radius when placing detours (meters)
    pub safety_margin_m: f64,
    /// A detour is accepted only if its distance is at most this multiple of the plain route
    pub max_detour_ratio: f64,
}

impl Default for AvoidanceRules {
    fn default() -> Self {
        Self {
            buffer_factor: DEFAULT_BUFFER_FACTOR,
            safety_margin_m: DEFAULT_SAFETY_MARGIN_M,
            max_detour_ratio: DEFAULT_MAX_DETOUR_RATIO,
        }
    }
}

impl AvoidanceRules {
    pub fn with_buffer_factor(mut self, buffer_factor: f64) -> Self {
        self.buffer_factor = buffer_factor;
        self
    }

    /// Replace non-finite or non-positive values with the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            buffer_factor: positive_or(self.buffer_factor, defaults.buffer_factor),
            safety_margin_m: if self.safety_margin_m.is_finite() && self.safety_margin_m >= 0.0 {
                self.safety_margin_m
            } else {
                defaults.safety_margin_m
            },
            max_detour_ratio: positive_or(self.max_detour_ratio, defaults.max_detour_ratio),
        }
    }

    /// Whether a detour of `detour_m` is acceptable against a plain route of `plain_m`.
    pub fn accepts_detour(&self, plain_m: f64, detour_m: f64) -> bool {
        detour_m <= plain_m * self.max_detour_ratio
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_replaces_invalid_values() {
        let rules = AvoidanceRules {
            buffer_factor: f64::NAN,
            safety_margin_m: -3.0,
            max_detour_ratio: 0.0,
        }
        .sanitized();
        assert_eq!(rules, AvoidanceRules::default());
    }

    #[test]
    fn detour_ratio_boundary_is_inclusive() {
        let rules = AvoidanceRules::default();
        assert!(rules.accepts_detour(1000.0, 1500.0));
        assert!(!rules.accepts_detour(1000.0, 1500.1));
        assert!(!rules.accepts_detour(1000.0, 2500.0));
    }
}
