//! Hazard feed: filtering, ordering, and summary counts.

use crate::models::{Hazard, HazardSeverity, HazardType};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedOrder {
    /// Newest report first
    #[default]
    Recent,
    /// Most severe first, newest first within a severity
    Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    #[serde(default, rename = "type")]
    pub hazard_type: Option<HazardType>,
    #[serde(default)]
    pub severity: Option<HazardSeverity>,
    #[serde(default)]
    pub verified: Option<bool>,
}

impl FeedFilter {
    pub fn matches(&self, hazard: &Hazard) -> bool {
        self.hazard_type.map_or(true, |kind| hazard.hazard_type == kind)
            && self.severity.map_or(true, |severity| hazard.severity == severity)
            && self.verified.map_or(true, |verified| hazard.verified == verified)
    }
}

/// Apply `filter` and order the remaining hazards.
pub fn build_feed(hazards: &[Hazard], filter: &FeedFilter, order: FeedOrder) -> Vec<Hazard> {
    let mut feed: Vec<Hazard> = hazards
        .iter()
        .filter(|hazard| filter.matches(hazard))
        .cloned()
        .collect();
    match order {
        FeedOrder::Recent => feed.sort_by_key(|hazard| Reverse(hazard.reported_at)),
        FeedOrder::Severity => {
            feed.sort_by_key(|hazard| (Reverse(hazard.severity), Reverse(hazard.reported_at)))
        }
    }
    feed
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardStats {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
}

impl HazardStats {
    pub fn from_hazards(hazards: &[Hazard]) -> Self {
        let verified = hazards.iter().filter(|hazard| hazard.verified).count();
        Self {
            total: hazards.len(),
            verified,
            unverified: hazards.len() - verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::{Duration, TimeZone, Utc};

    fn hazard(
        id: &str,
        severity: HazardSeverity,
        kind: HazardType,
        hours_ago: i64,
        verified: bool,
    ) -> Hazard {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Hazard {
            id: id.to_string(),
            location: Location::new(37.77, -122.41),
            impact_radius_m: severity.default_impact_radius_m(),
            severity,
            hazard_type: kind,
            description: String::new(),
            reported_by: "user-1".to_string(),
            reported_at: now - Duration::hours(hours_ago),
            verified,
            upvotes: 0,
            image: None,
        }
    }

    fn sample() -> Vec<Hazard> {
        vec![
            hazard("old-critical", HazardSeverity::Critical, HazardType::Fire, 48, true),
            hazard("new-low", HazardSeverity::Low, HazardType::Flood, 1, false),
            hazard("mid-high", HazardSeverity::High, HazardType::Flood, 5, true),
            hazard("new-critical", HazardSeverity::Critical, HazardType::Storm, 2, false),
        ]
    }

    fn ids(feed: &[Hazard]) -> Vec<&str> {
        feed.iter().map(|hazard| hazard.id.as_str()).collect()
    }

    #[test]
    fn recent_order_is_newest_first() {
        let feed = build_feed(&sample(), &FeedFilter::default(), FeedOrder::Recent);
        assert_eq!(ids(&feed), vec!["new-low", "new-critical", "mid-high", "old-critical"]);
    }

    #[test]
    fn severity_order_breaks_ties_by_recency() {
        let feed = build_feed(&sample(), &FeedFilter::default(), FeedOrder::Severity);
        assert_eq!(ids(&feed), vec!["new-critical", "old-critical", "mid-high", "new-low"]);
    }

    #[test]
    fn filters_combine() {
        let filter = FeedFilter {
            hazard_type: Some(HazardType::Flood),
            severity: None,
            verified: Some(true),
        };
        let feed = build_feed(&sample(), &filter, FeedOrder::Recent);
        assert_eq!(ids(&feed), vec!["mid-high"]);
    }

    #[test]
    fn stats_count_verification() {
        let stats = HazardStats::from_hazards(&sample());
        assert_eq!(
            stats,
            HazardStats {
                total: 4,
                verified: 2,
                unverified: 2
            }
        );
    }

    #[test]
    fn upvote_and_verify_mutate_in_place() {
        let mut hazard = hazard("h", HazardSeverity::Low, HazardType::Other, 0, false);
        hazard.upvote();
        hazard.upvote();
        hazard.set_verified(true);
        assert_eq!(hazard.upvotes, 2);
        assert!(hazard.verified);
    }
}
