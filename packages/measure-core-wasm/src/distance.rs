use geo_types::{LineString, Point};

/// Longitude/latitude pair in decimal degrees (`x` = longitude, `y` = latitude).
pub type GeoPoint = Point<f64>;

// Mean Earth radius used by the measurement labels, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// Labels switch from meters to kilometers at this distance
const KILOMETER_THRESHOLD: f64 = 1000.0;

/// Great-circle distance between two points on a spherical Earth, in meters.
///
/// Uses the haversine formula. NaN coordinates yield NaN.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Sum of the haversine distances between consecutive points of a line.
pub fn polyline_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|l| distance_meters(l.start.into(), l.end.into()))
        .sum()
}

/// Format a distance for a vertex label: "963 m" below one kilometer, "1.93 km" above.
pub fn format_distance(meters: f64) -> String {
    if meters.is_nan() || meters < KILOMETER_THRESHOLD {
        format!("{} m", meters.round())
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine};

    #[test]
    fn zero_distance_for_identical_points() {
        let p = GeoPoint::new(114.0, 30.0);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn hundredth_degree_east_at_thirty_north() {
        let d = distance_meters(GeoPoint::new(114.0, 30.0), GeoPoint::new(114.01, 30.0));
        assert!((d - 962.97).abs() < 0.5, "unexpected distance {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_meters(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        let expected = EARTH_RADIUS_METERS * 1f64.to_radians();
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn symmetric() {
        let a = GeoPoint::new(-73.98, 40.75);
        let b = GeoPoint::new(2.35, 48.86);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn agrees_with_geo_haversine() {
        // geo uses a slightly larger mean radius (6371008.8 m)
        let a = GeoPoint::new(114.29747863235701, 30.59377993447046);
        let b = GeoPoint::new(114.3021070541231, 30.59377993447046);
        let ours = distance_meters(a, b);
        let theirs = Haversine::distance(a, b);
        assert!(((ours - theirs) / theirs).abs() < 1e-5);
    }

    #[test]
    fn nan_propagates() {
        let d = distance_meters(GeoPoint::new(f64::NAN, 30.0), GeoPoint::new(114.0, 30.0));
        assert!(d.is_nan());
        assert_eq!(format_distance(d), "NaN m");
    }

    #[test]
    fn formats_meters_and_kilometers() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(962.97), "963 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1000.0), "1.00 km");
        assert_eq!(format_distance(1925.94), "1.93 km");
    }

    #[test]
    fn polyline_length_sums_edges() {
        let line: LineString<f64> = vec![(114.0, 30.0), (114.01, 30.0), (114.02, 30.0)].into();
        let expected = distance_meters(GeoPoint::new(114.0, 30.0), GeoPoint::new(114.01, 30.0))
            + distance_meters(GeoPoint::new(114.01, 30.0), GeoPoint::new(114.02, 30.0));
        assert!((polyline_length(&line) - expected).abs() < 1e-9);
    }
}
