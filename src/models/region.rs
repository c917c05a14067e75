//! Region hierarchy (§3: Region) used by the segment/district resolver.

use geo_types::Polygon;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
    /// 0 = coarsest (e.g. city), increasing levels are more specific
    /// (administrative district, then neighborhood).
    pub level: i32,
    pub parent_id: Option<Uuid>,
    pub boundary: Polygon<f64>,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
}
