//! Grid aggregate storage/lookup for the cascading fallback chain (§4.6).
//! Grounded on `grid_estimator.py`'s `_exact_match` / `_relaxed_height` /
//! `_relaxed_type` / `_district_level` / `_global_average` queries and
//! `_get_property_segment_id`.

use sqlx::Row;

use crate::error::CoreResult;
use crate::models::{BuildingHeight, BuildingType, PropertySegment};

use super::PgSpatialStore;

pub struct GridRow {
    pub avg_price_per_sqm: f64,
    pub median_price_per_sqm: f64,
    pub sample_count: i32,
    pub confidence_score: f64,
}

impl PgSpatialStore {
    /// All known segments, for the grid refresh batch job to walk.
    pub async fn list_all_segments(&self) -> CoreResult<Vec<PropertySegment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, region_id, building_type, building_height, rooms
            FROM property_segments
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PropertySegment {
                id: r.get("id"),
                region_id: r.get("region_id"),
                building_type: r.get("building_type"),
                building_height: r.get("building_height"),
                rooms: r.get("rooms"),
            })
            .collect())
    }

    pub async fn exact_segment_match(
        &self,
        region_id: uuid::Uuid,
        building_type: BuildingType,
        building_height: BuildingHeight,
        rooms: i32,
    ) -> CoreResult<Option<GridRow>> {
        let row = sqlx::query(
            r#"
            SELECT ga.avg_price_per_sqm, ga.median_price_per_sqm,
                   ga.sample_count, ga.confidence_score
            FROM grid_aggregates ga
            JOIN property_segments ps ON ps.id = ga.segment_id
            WHERE ps.region_id = $1 AND ps.building_type = $2
              AND ps.building_height = $3 AND ps.rooms = $4
              AND ga.sample_count >= 3
            "#,
        )
        .bind(region_id)
        .bind(building_type)
        .bind(building_height)
        .bind(rooms.min(5))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| GridRow {
            avg_price_per_sqm: r.get("avg_price_per_sqm"),
            median_price_per_sqm: r.get("median_price_per_sqm"),
            sample_count: r.get("sample_count"),
            confidence_score: r.get("confidence_score"),
        }))
    }

    pub async fn relaxed_height_match(
        &self,
        region_id: uuid::Uuid,
        building_type: BuildingType,
        rooms: i32,
    ) -> CoreResult<Option<(f64, f64, i32)>> {
        let row = sqlx::query(
            r#"
            SELECT avg(lp.price / NULLIF(l.area_total, 0)) AS avg_psm,
                   percentile_cont(0.5) WITHIN GROUP (ORDER BY lp.price / NULLIF(l.area_total, 0)) AS median_psm,
                   count(*) AS n
            FROM listings l
            JOIN LATERAL (
                SELECT price FROM listing_prices WHERE listing_id = l.id ORDER BY seen_at DESC LIMIT 1
            ) lp ON true
            WHERE l.region_id = $1 AND l.building_type = $2
              AND LEAST(l.rooms, 5) = $3 AND l.is_active
            "#,
        )
        .bind(region_id)
        .bind(building_type)
        .bind(rooms.min(5))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| {
            let avg: Option<f64> = r.get("avg_psm");
            let median: Option<f64> = r.get("median_psm");
            let n: i64 = r.get("n");
            match (avg, median) {
                (Some(a), Some(m)) => Some((a, m, n as i32)),
                _ => None,
            }
        }))
    }

    pub async fn relaxed_type_match(
        &self,
        region_id: uuid::Uuid,
        rooms: i32,
    ) -> CoreResult<Option<(f64, f64, i32)>> {
        let row = sqlx::query(
            r#"
            SELECT avg(lp.price / NULLIF(l.area_total, 0)) AS avg_psm,
                   percentile_cont(0.5) WITHIN GROUP (ORDER BY lp.price / NULLIF(l.area_total, 0)) AS median_psm,
                   count(*) AS n
            FROM listings l
            JOIN LATERAL (
                SELECT price FROM listing_prices WHERE listing_id = l.id ORDER BY seen_at DESC LIMIT 1
            ) lp ON true
            WHERE l.region_id = $1 AND LEAST(l.rooms, 5) = $2 AND l.is_active
            "#,
        )
        .bind(region_id)
        .bind(rooms.min(5))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| {
            let avg: Option<f64> = r.get("avg_psm");
            let median: Option<f64> = r.get("median_psm");
            let n: i64 = r.get("n");
            match (avg, median) {
                (Some(a), Some(m)) => Some((a, m, n as i32)),
                _ => None,
            }
        }))
    }

    pub async fn region_level_match(&self, region_id: uuid::Uuid) -> CoreResult<Option<(f64, f64, i32)>> {
        let row = sqlx::query(
            r#"
            SELECT avg(lp.price / NULLIF(l.area_total, 0)) AS avg_psm,
                   percentile_cont(0.5) WITHIN GROUP (ORDER BY lp.price / NULLIF(l.area_total, 0)) AS median_psm,
                   count(*) AS n
            FROM listings l
            JOIN LATERAL (
                SELECT price FROM listing_prices WHERE listing_id = l.id ORDER BY seen_at DESC LIMIT 1
            ) lp ON true
            WHERE l.region_id = $1 AND l.is_active
            "#,
        )
        .bind(region_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| {
            let avg: Option<f64> = r.get("avg_psm");
            let median: Option<f64> = r.get("median_psm");
            let n: i64 = r.get("n");
            match (avg, median) {
                (Some(a), Some(m)) => Some((a, m, n as i32)),
                _ => None,
            }
        }))
    }

    pub async fn global_average(&self, window_days: i64) -> CoreResult<f64> {
        let avg: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT avg(lp.price / NULLIF(l.area_total, 0))
            FROM listings l
            JOIN LATERAL (
                SELECT price FROM listing_prices WHERE listing_id = l.id ORDER BY seen_at DESC LIMIT 1
            ) lp ON true
            WHERE l.is_active AND l.first_seen_at >= now() - make_interval(days => $1::int)
            "#,
        )
        .bind(window_days as i32)
        .fetch_one(&self.pool)
        .await?;
        Ok(avg.unwrap_or(0.0))
    }

    /// Upserts the daily-recomputed top-level aggregate row for a segment
    /// (the grid refresh batch job's write path).
    pub async fn upsert_grid_aggregate(
        &self,
        segment_id: uuid::Uuid,
        avg_price_per_sqm: f64,
        median_price_per_sqm: f64,
        sample_count: i32,
        confidence_score: f64,
    ) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO grid_aggregates (segment_id, avg_price_per_sqm, median_price_per_sqm, sample_count, confidence_score, computed_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (segment_id) DO UPDATE SET
                avg_price_per_sqm = EXCLUDED.avg_price_per_sqm,
                median_price_per_sqm = EXCLUDED.median_price_per_sqm,
                sample_count = EXCLUDED.sample_count,
                confidence_score = EXCLUDED.confidence_score,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(segment_id)
        .bind(avg_price_per_sqm)
        .bind(median_price_per_sqm)
        .bind(sample_count)
        .bind(confidence_score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
