//! Random hazards and shelters around a center point, for demos and seeding.

use crate::models::{Hazard, HazardSeverity, HazardType, Location, Shelter, ShelterStatus};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Kathmandu University, Dhulikhel.
pub const DEFAULT_CENTER: Location = Location::new(27.6228, 85.5412);

const FACILITY_TYPES: [&str; 5] = [
    "School",
    "Community Center",
    "Hospital",
    "Church",
    "Government Building",
];

const FACILITIES: [&str; 6] = [
    "water",
    "first aid",
    "food",
    "blankets",
    "power",
    "sanitation",
];

/// Uniform random point within a square of half-side `radius_km` around `center`.
pub fn random_location<R: Rng + ?Sized>(rng: &mut R, center: Location, radius_km: f64) -> Location {
    let radius_lat = radius_km / 111.0;
    let radius_lng = radius_km / (111.0 * center.lat.to_radians().cos().max(1e-6));
    Location::new(
        center.lat + rng.random_range(-1.0..=1.0) * radius_lat,
        center.lng + rng.random_range(-1.0..=1.0) * radius_lng,
    )
}

pub fn generate_mock_hazards<R: Rng + ?Sized>(
    rng: &mut R,
    center: Location,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<Hazard> {
    (0..count)
        .map(|i| {
            let hazard_type = HazardType::ALL[rng.random_range(0..HazardType::ALL.len())];
            let severity = HazardSeverity::ALL[rng.random_range(0..HazardSeverity::ALL.len())];
            Hazard {
                id: format!("hazard-{i}"),
                location: random_location(rng, center, 5.0),
                impact_radius_m: severity.default_impact_radius_m(),
                severity,
                hazard_type,
                description: format!(
                    "{} {} reported in this area. Please avoid.",
                    severity.as_str(),
                    hazard_type.as_str()
                ),
                reported_by: format!("user-{}", rng.random_range(0..10)),
                reported_at: now - Duration::days(rng.random_range(0..7)),
                verified: rng.random_bool(0.7),
                upvotes: rng.random_range(0..50),
                image: None,
            }
        })
        .collect()
}

pub fn generate_mock_shelters<R: Rng + ?Sized>(
    rng: &mut R,
    center: Location,
    count: usize,
) -> Vec<Shelter> {
    (0..count)
        .map(|i| {
            let capacity = rng.random_range(50..350);
            let facilities = FACILITIES
                .iter()
                .filter(|_| rng.random_bool(0.5))
                .map(|facility| facility.to_string())
                .collect();
            Shelter {
                id: format!("shelter-{i}"),
                name: format!("Safe Shelter {i}"),
                location: random_location(rng, center, 8.0),
                capacity,
                current_occupancy: rng.random_range(0..100).min(capacity),
                facility_type: FACILITY_TYPES[rng.random_range(0..FACILITY_TYPES.len())]
                    .to_string(),
                contact: format!("+1-555-{}", rng.random_range(1000..10000)),
                facilities,
                status: ShelterStatus::Active,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::haversine_distance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mock_hazards_stay_near_center_and_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        let hazards = generate_mock_hazards(&mut rng, DEFAULT_CENTER, 20, Utc::now());
        assert_eq!(hazards.len(), 20);
        for hazard in &hazards {
            assert!(hazard.location.is_valid());
            // 5 km half-side square, diagonal ~7.1 km
            assert!(haversine_distance(DEFAULT_CENTER, hazard.location) < 7_500.0);
            assert_eq!(hazard.impact_radius_m, hazard.severity.default_impact_radius_m());
        }
    }

    #[test]
    fn mock_shelters_pass_validation() {
        let mut rng = StdRng::seed_from_u64(11);
        let shelters = generate_mock_shelters(&mut rng, DEFAULT_CENTER, 10);
        assert!(shelters.iter().all(|shelter| shelter.validate().is_ok()));
    }

    #[test]
    fn same_seed_gives_same_data() {
        let now = Utc::now();
        let a = generate_mock_hazards(&mut StdRng::seed_from_u64(3), DEFAULT_CENTER, 5, now);
        let b = generate_mock_hazards(&mut StdRng::seed_from_u64(3), DEFAULT_CENTER, 5, now);
        assert_eq!(a, b);
    }
}
