//! Great-circle distance and point-in-polygon helpers shared by the
//! segment resolver and the KNN searchers.

use geo::{Contains, HaversineDistance};
use geo_types::{Coord, Point, Polygon};

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = Point::new(lon1, lat1);
    let b = Point::new(lon2, lat2);
    a.haversine_distance(&b) / 1000.0
}

pub fn point_in_polygon(lat: f64, lon: f64, polygon: &Polygon<f64>) -> bool {
    let pt = Point::new(lon, lat);
    polygon.contains(&pt)
}

pub fn centroid(polygon: &Polygon<f64>) -> (f64, f64) {
    use geo::Centroid;
    match polygon.centroid() {
        Some(c) => (c.y(), c.x()),
        None => (0.0, 0.0),
    }
}

/// A coarse bounding box around a point, used to prefilter spatial-store
/// candidates before the more expensive haversine/scoring pass.
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(lat: f64, lon: f64, delta_lat: f64, delta_lon: f64) -> Self {
        BoundingBox {
            min_lat: lat - delta_lat,
            max_lat: lat + delta_lat,
            min_lon: lon - delta_lon,
            max_lon: lon + delta_lon,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// A box wide enough to cover `radius_km` in every direction from
    /// `(lat, lon)`, accounting for longitude degrees shrinking away from
    /// the equator.
    pub fn around_km(lat: f64, lon: f64, radius_km: f64) -> Self {
        let delta_lat = radius_km / 111.0;
        let cos_lat = lat.to_radians().cos().abs().max(0.01);
        let delta_lon = radius_km / (111.320 * cos_lat);
        BoundingBox::around(lat, lon, delta_lat, delta_lon)
    }
}

#[allow(dead_code)]
pub(crate) fn coord(lat: f64, lon: f64) -> Coord<f64> {
    Coord { x: lon, y: lat }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_identical_points() {
        let d = haversine_km(55.75, 37.61, 55.75, 37.61);
        assert!(d < 1e-6);
    }

    #[test]
    fn haversine_roughly_matches_known_distance() {
        // Moscow Kremlin to Sheremetyevo airport, roughly 29km apart.
        let d = haversine_km(55.7520, 37.6175, 55.9726, 37.4146);
        assert!(d > 25.0 && d < 35.0, "got {d}");
    }

    #[test]
    fn bounding_box_contains_center_not_far_point() {
        let bbox = BoundingBox::around(55.75, 37.61, 0.05, 0.07);
        assert!(bbox.contains(55.75, 37.61));
        assert!(!bbox.contains(56.5, 37.61));
    }

    #[test]
    fn around_km_covers_a_point_within_radius_not_beyond() {
        let bbox = BoundingBox::around_km(55.75, 37.61, 5.0);
        assert!(bbox.contains(55.75, 37.61));
        // ~50km north, well outside a 5km box.
        assert!(!bbox.contains(56.2, 37.61));
    }
}
