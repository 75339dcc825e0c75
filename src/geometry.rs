//! Framing of a waypoint set: centroid and discrete zoom level.

use crate::models::GeoPoint;

/// Used only when asked to frame an empty point set.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    latitude: 37.5665,
    longitude: 126.9780,
};

/// Zoom used when there is no extent to measure.
pub const DEFAULT_ZOOM: u8 = 14;

/// Exclusive upper bounds on the larger coordinate range, tightest first.
const ZOOM_THRESHOLDS: [(f64, u8); 7] = [
    (0.005, 16),
    (0.01, 15),
    (0.02, 14),
    (0.05, 13),
    (0.1, 12),
    (0.2, 11),
    (0.5, 10),
];

const WIDEST_ZOOM: u8 = 9;

/// Unweighted arithmetic mean of latitudes and longitudes.
pub fn compute_center(points: &[GeoPoint]) -> GeoPoint {
    if points.is_empty() {
        return DEFAULT_CENTER;
    }

    let n = points.len() as f64;
    let (lat_sum, lng_sum) = points.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.latitude, lng + p.longitude)
    });

    GeoPoint::new(lat_sum / n, lng_sum / n)
}

pub fn compute_zoom_level(points: &[GeoPoint]) -> u8 {
    if points.len() < 2 {
        return DEFAULT_ZOOM;
    }

    let lat_range = range(points.iter().map(|p| p.latitude));
    let lng_range = range(points.iter().map(|p| p.longitude));
    zoom_for_extent(lat_range.max(lng_range))
}

fn zoom_for_extent(max_diff: f64) -> u8 {
    ZOOM_THRESHOLDS
        .iter()
        .find(|(bound, _)| max_diff < *bound)
        .map(|(_, zoom)| *zoom)
        .unwrap_or(WIDEST_ZOOM)
}

fn range(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    max - min
}
