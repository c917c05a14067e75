//! Segment/district resolver (§4.2): point-in-polygon over a cached region
//! set, highest level wins; nearest-centroid fallback within a 5 km cap;
//! address-text last resort. Grounded on
//! `original_source/etl/district_matcher.py`.

mod cache;
mod text_fallback;

pub use cache::{polygon_from_geojson, RegionCache};
pub use text_fallback::extract_district_token;

use crate::geo_utils::haversine_km;
use crate::models::Region;

const NEAREST_CENTROID_CAP_KM: f64 = 5.0;

/// Resolves a point to the most specific region containing it. Falls back
/// to the nearest centroid within the cap, then to `None` — never guesses
/// past that boundary.
pub fn resolve_region<'a>(regions: &'a [Region], lat: f64, lon: f64) -> Option<&'a Region> {
    let mut best: Option<&Region> = None;
    for region in regions {
        if crate::geo_utils::point_in_polygon(lat, lon, &region.boundary) {
            match best {
                Some(b) if b.level >= region.level => {}
                _ => best = Some(region),
            }
        }
    }
    if best.is_some() {
        return best;
    }

    regions
        .iter()
        .map(|r| (r, haversine_km(lat, lon, r.centroid_lat, r.centroid_lon)))
        .filter(|(_, d)| *d <= NEAREST_CENTROID_CAP_KM)
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(r, _)| r)
}

/// Address-text last resort: extract a district token from the address
/// and match it against the cached region names (exact, then substring).
pub fn resolve_region_by_address<'a>(regions: &'a [Region], address: &str) -> Option<&'a Region> {
    let token = extract_district_token(address)?;
    regions
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(&token))
        .or_else(|| regions.iter().find(|r| r.name.to_lowercase().contains(&token.to_lowercase())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Coord, LineString, Polygon};
    use uuid::Uuid;

    fn square_region(level: i32, name: &str, min: f64, max: f64) -> Region {
        let ring = LineString::new(vec![
            Coord { x: min, y: min },
            Coord { x: max, y: min },
            Coord { x: max, y: max },
            Coord { x: min, y: max },
            Coord { x: min, y: min },
        ]);
        Region {
            id: Uuid::new_v4(),
            name: name.to_string(),
            level,
            parent_id: None,
            boundary: Polygon::new(ring, vec![]),
            centroid_lat: (min + max) / 2.0,
            centroid_lon: (min + max) / 2.0,
        }
    }

    #[test]
    fn prefers_most_specific_level_when_nested() {
        let city = square_region(0, "Moscow", 0.0, 10.0);
        let district = square_region(1, "Center", 4.0, 6.0);
        let regions = vec![city, district];
        let resolved = resolve_region(&regions, 5.0, 5.0).unwrap();
        assert_eq!(resolved.name, "Center");
    }

    #[test]
    fn falls_back_to_nearest_centroid_within_cap() {
        let region = square_region(1, "Center", 0.0, 0.01);
        let regions = vec![region];
        // ~3km north in latitude degrees, point itself is outside the tiny polygon.
        let resolved = resolve_region(&regions, 0.03, 0.005);
        assert!(resolved.is_some());
    }

    #[test]
    fn returns_none_past_the_cap() {
        let region = square_region(1, "Center", 0.0, 0.01);
        let regions = vec![region];
        let resolved = resolve_region(&regions, 10.0, 10.0);
        assert!(resolved.is_none());
    }
}
