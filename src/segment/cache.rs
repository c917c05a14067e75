//! Read-mostly region polygon cache, refreshed on an interval (§5). A
//! request handler takes a read lock; the refresh task takes a write lock
//! only while swapping in a freshly loaded `Vec<Region>`.

use std::sync::Arc;
use std::time::Duration;

use geo_types::{Coord, LineString, Polygon};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::db::PgSpatialStore;
use crate::error::CoreResult;
use crate::models::Region;

pub struct RegionCache {
    inner: Arc<RwLock<Vec<Region>>>,
}

impl RegionCache {
    pub async fn load(store: &PgSpatialStore) -> CoreResult<Self> {
        let regions = store.load_all_regions().await?;
        Ok(RegionCache {
            inner: Arc::new(RwLock::new(regions)),
        })
    }

    pub async fn snapshot(&self) -> Vec<Region> {
        self.inner.read().await.clone()
    }

    /// Spawns a background task that reloads the cache on `interval`,
    /// logging (not panicking) on a failed refresh — a stale cache is
    /// preferable to a crashed server.
    pub fn spawn_refresh(&self, store: PgSpatialStore, interval: Duration) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match store.load_all_regions().await {
                    Ok(fresh) => {
                        let n = fresh.len();
                        *inner.write().await = fresh;
                        info!("region cache refreshed: {n} regions");
                    }
                    Err(e) => warn!("region cache refresh failed, keeping stale copy: {e}"),
                }
            }
        });
    }
}

/// Parses a GeoJSON polygon/multipolygon feature's boundary into a
/// `geo_types::Polygon`, keeping only the outer ring of the first polygon
/// when given a multipolygon (region boundaries in this system are single
/// contiguous shapes).
pub fn polygon_from_geojson(text: &str) -> Result<Polygon<f64>, String> {
    let geometry: geojson::Geometry = text.parse().map_err(|e| format!("invalid geojson: {e}"))?;
    match geometry.value {
        geojson::Value::Polygon(rings) => Ok(polygon_from_rings(&rings)),
        geojson::Value::MultiPolygon(polys) => polys
            .first()
            .map(|rings| polygon_from_rings(rings))
            .ok_or_else(|| "empty multipolygon".to_string()),
        other => Err(format!("unsupported geometry type: {other:?}")),
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Polygon<f64> {
    let exterior = rings.first().cloned().unwrap_or_default();
    let coords: Vec<Coord<f64>> = exterior
        .iter()
        .map(|p| Coord {
            x: p[0],
            y: p[1],
        })
        .collect();
    let interiors: Vec<LineString<f64>> = rings
        .iter()
        .skip(1)
        .map(|ring| {
            LineString::new(
                ring.iter()
                    .map(|p| Coord { x: p[0], y: p[1] })
                    .collect(),
            )
        })
        .collect();
    Polygon::new(LineString::new(coords), interiors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_polygon() {
        let geojson = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;
        let poly = polygon_from_geojson(geojson).unwrap();
        assert_eq!(poly.exterior().0.len(), 5);
    }
}
