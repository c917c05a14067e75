//! Region hierarchy loading, backing the in-memory polygon cache used by
//! the segment resolver (§4.2). Grounded on
//! `district_matcher.py::find_district_by_coordinates` (ordered by level,
//! most specific first).

use sqlx::Row;

use crate::error::CoreResult;
use crate::models::Region;

use super::PgSpatialStore;

impl PgSpatialStore {
    pub async fn load_all_regions(&self) -> CoreResult<Vec<Region>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, level, parent_id, boundary_geojson,
                   centroid_lat, centroid_lon
            FROM regions
            ORDER BY level DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut regions = Vec::with_capacity(rows.len());
        for row in rows {
            let geojson_text: String = row.get("boundary_geojson");
            let Ok(boundary) = crate::segment::polygon_from_geojson(&geojson_text) else {
                continue;
            };
            regions.push(Region {
                id: row.get("id"),
                name: row.get("name"),
                level: row.get("level"),
                parent_id: row.get("parent_id"),
                boundary,
                centroid_lat: row.get("centroid_lat"),
                centroid_lon: row.get("centroid_lon"),
            });
        }
        Ok(regions)
    }

    pub async fn upsert_region(
        &self,
        id: uuid::Uuid,
        name: &str,
        level: i32,
        parent_id: Option<uuid::Uuid>,
        boundary_geojson: &str,
        centroid_lat: f64,
        centroid_lon: f64,
    ) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO regions (id, name, level, parent_id, boundary_geojson, centroid_lat, centroid_lon)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                level = EXCLUDED.level,
                parent_id = EXCLUDED.parent_id,
                boundary_geojson = EXCLUDED.boundary_geojson,
                centroid_lat = EXCLUDED.centroid_lat,
                centroid_lon = EXCLUDED.centroid_lon
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(level)
        .bind(parent_id)
        .bind(boundary_geojson)
        .bind(centroid_lat)
        .bind(centroid_lon)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
