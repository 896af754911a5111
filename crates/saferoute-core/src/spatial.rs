//! Spatial math for hazard proximity and detour placement.

use crate::models::Location;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two locations in meters (Haversine formula).
pub fn haversine_distance(a: Location, b: Location) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Total length of a polyline in meters.
pub fn path_length_m(path: &[Location]) -> f64 {
    path.windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum()
}

/// Initial bearing from `from` to `to` in radians (0 = north, π/2 = east).
pub fn bearing(from: Location, to: Location) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_lambda = (to.lng - from.lng).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Destination reached by travelling `distance_m` from `start` along `bearing_rad`.
pub fn offset_by_bearing(start: Location, distance_m: f64, bearing_rad: f64) -> Location {
    if distance_m.abs() <= f64::EPSILON {
        return start;
    }

    let lat1 = start.lat.to_radians();
    let lon1 = start.lng.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    Location::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Projection of a point onto the great circle through a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Unsigned distance from the point to the great circle, meters
    pub cross_track_m: f64,
    /// Signed distance from the segment start to the projected point, meters.
    /// Negative when the projection falls behind the start.
    pub along_track_m: f64,
    /// Length of the segment, meters
    pub segment_length_m: f64,
}

impl SegmentProjection {
    /// True when the projected point lies between the segment endpoints.
    pub fn within_segment(&self) -> bool {
        self.along_track_m >= 0.0 && self.along_track_m <= self.segment_length_m
    }
}

/// Project `point` onto the great circle running from `start` towards `end`.
pub fn project_onto_segment(point: Location, start: Location, end: Location) -> SegmentProjection {
    let segment_length_m = haversine_distance(start, end);
    let d13 = haversine_distance(start, point);
    if d13 <= f64::EPSILON {
        return SegmentProjection {
            cross_track_m: 0.0,
            along_track_m: 0.0,
            segment_length_m,
        };
    }

    let delta13 = d13 / EARTH_RADIUS_M;
    let theta13 = bearing(start, point);
    let theta12 = bearing(start, end);
    let angle = theta13 - theta12;

    let cross_angular = (delta13.sin() * angle.sin()).clamp(-1.0, 1.0).asin();
    let along_cos = (delta13.cos() / cross_angular.cos()).clamp(-1.0, 1.0);
    let along_angular = along_cos.acos() * angle.cos().signum();

    SegmentProjection {
        cross_track_m: (cross_angular * EARTH_RADIUS_M).abs(),
        along_track_m: along_angular * EARTH_RADIUS_M,
        segment_length_m,
    }
}

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lat(ref_lat_deg).max(1e-9)
}

/// Convert an east/west offset in meters to degrees longitude.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lon(ref_lat_deg).max(1e-9)
}

/// Minimum distance from a point to a line segment in meters.
///
/// Uses a local east/north frame anchored at the segment start, so it is
/// meant for short segments such as the legs of a road-routing geometry.
pub fn distance_to_segment_m(point: Location, seg_start: Location, seg_end: Location) -> f64 {
    let ref_lat = seg_start.lat;

    let px = (point.lng - seg_start.lng) * meters_per_deg_lon(ref_lat);
    let py = (point.lat - seg_start.lat) * meters_per_deg_lat(ref_lat);

    let sx = (seg_end.lng - seg_start.lng) * meters_per_deg_lon(ref_lat);
    let sy = (seg_end.lat - seg_start.lat) * meters_per_deg_lat(ref_lat);

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 0.0001 {
        return (px * px + py * py).sqrt();
    }

    // t = ((P-A) · (B-A)) / |B-A|²
    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);

    let dx = px - t * sx;
    let dy = py - t * sy;

    (dx * dx + dy * dy).sqrt()
}

/// Minimum distance from a point to any leg of a polyline in meters.
pub fn distance_to_path_m(point: Location, path: &[Location]) -> Option<f64> {
    match path {
        [] => None,
        [only] => Some(haversine_distance(point, *only)),
        _ => path
            .windows(2)
            .map(|pair| distance_to_segment_m(point, pair[0], pair[1]))
            .min_by(|a, b| a.total_cmp(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(Location::new(0.0, 0.0), Location::new(1.0, 0.0));
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Location::new(27.6228, 85.5412);
        assert!(haversine_distance(point, point) < 0.001);
    }

    #[test]
    fn offset_by_bearing_round_trips_distance() {
        let start = Location::new(27.6228, 85.5412);
        let moved = offset_by_bearing(start, 250.0, std::f64::consts::FRAC_PI_2);
        let dist = haversine_distance(start, moved);
        assert!((dist - 250.0).abs() < 0.5, "got {dist}");
        assert!(moved.lng > start.lng);
    }

    #[test]
    fn projection_of_point_on_segment_has_zero_cross_track() {
        let start = Location::new(0.0, 0.0);
        let end = Location::new(0.0, 1.0);
        let projection = project_onto_segment(Location::new(0.0, 0.5), start, end);
        assert!(projection.cross_track_m < 0.01);
        assert!(projection.within_segment());
        assert!((projection.along_track_m - projection.segment_length_m / 2.0).abs() < 1.0);
    }

    #[test]
    fn projection_behind_start_is_out_of_bounds() {
        let start = Location::new(0.0, 0.0);
        let end = Location::new(0.0, 1.0);
        let projection = project_onto_segment(Location::new(0.001, -0.01), start, end);
        assert!(projection.along_track_m < 0.0);
        assert!(!projection.within_segment());

        let beyond = project_onto_segment(Location::new(0.0, 1.2), start, end);
        assert!(!beyond.within_segment());
    }

    #[test]
    fn cross_track_matches_perpendicular_offset() {
        let start = Location::new(0.0, 0.0);
        let end = Location::new(0.0, 1.0);
        let north = Location::new(meters_to_lat(300.0, 0.0), 0.4);
        let projection = project_onto_segment(north, start, end);
        assert!((projection.cross_track_m - 300.0).abs() < 5.0);
    }

    #[test]
    fn distance_to_segment_clamps_to_endpoints() {
        let start = Location::new(33.0, -117.0);
        let end = Location::new(33.0, -117.0 + meters_to_lon(100.0, 33.0));
        let west = Location::new(33.0, -117.0 - meters_to_lon(40.0, 33.0));
        let dist = distance_to_segment_m(west, start, end);
        assert!((dist - 40.0).abs() < 0.5, "got {dist}");
    }

    #[test]
    fn distance_to_path_handles_short_paths() {
        let point = Location::new(0.0, 0.0);
        assert!(distance_to_path_m(point, &[]).is_none());
        let single = distance_to_path_m(point, &[Location::new(0.0, 0.0)]).unwrap();
        assert!(single < 0.001);
    }
}
