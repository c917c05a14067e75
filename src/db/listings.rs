//! Listing candidate queries for the KNN searcher (§4.3), modeled on
//! `knn_searcher.py::_find_comparables`'s bounding-box + active/latest-price
//! CTE, and on the teacher's bind-chain convention in
//! `ingestion/write.rs::find_existing_property`.

use sqlx::Row;

use crate::error::CoreResult;
use crate::geo_utils::BoundingBox;
use crate::models::{BuildingHeight, BuildingType, Listing};

use super::PgSpatialStore;

impl PgSpatialStore {
    /// Active listings inside a bounding box, optionally constrained by a
    /// room-count tolerance. The caller applies area/building-class/age
    /// filters and scoring afterward — this is the coarse prefilter only.
    pub async fn find_listing_candidates(
        &self,
        bbox: &BoundingBox,
        rooms: Option<i32>,
        room_tolerance: i32,
        max_age_days: i64,
    ) -> CoreResult<Vec<Listing>> {
        let rows = sqlx::query(
            r#"
            SELECT
                l.id, l.external_id, l.raw_address, l.normalized_address,
                l.latitude, l.longitude, l.region_id,
                l.building_type, l.building_height,
                l.rooms, l.area_total, l.floor, l.total_floors, l.year_built,
                l.first_seen_at, l.published_at, l.is_active, l.is_repost,
                l.original_listing_id
            FROM listings l
            JOIN LATERAL (
                SELECT price FROM listing_prices lp
                WHERE lp.listing_id = l.id
                ORDER BY lp.seen_at DESC
                LIMIT 1
            ) latest ON true
            WHERE l.is_active
              AND l.latitude BETWEEN $1 AND $2
              AND l.longitude BETWEEN $3 AND $4
              AND l.first_seen_at >= now() - make_interval(days => $5::int)
              AND ($6::int IS NULL OR abs(l.rooms - $6::int) <= $7::int)
            "#,
        )
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lon)
        .bind(bbox.max_lon)
        .bind(max_age_days as i32)
        .bind(rooms)
        .bind(room_tolerance)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_listing).collect())
    }

    pub async fn latest_price(
        &self,
        listing_id: uuid::Uuid,
    ) -> CoreResult<Option<rust_decimal::Decimal>> {
        let price: Option<rust_decimal::Decimal> = sqlx::query_scalar(
            r#"SELECT price FROM listing_prices WHERE listing_id = $1 ORDER BY seen_at DESC LIMIT 1"#,
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(price)
    }
}

fn row_to_listing(row: sqlx::postgres::PgRow) -> Listing {
    Listing {
        id: row.get("id"),
        external_id: row.get("external_id"),
        raw_address: row.get("raw_address"),
        normalized_address: row.get("normalized_address"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        region_id: row.get("region_id"),
        building_type: row.get::<BuildingType, _>("building_type"),
        building_height: row.get::<BuildingHeight, _>("building_height"),
        rooms: row.get("rooms"),
        area_total: row.get("area_total"),
        floor: row.get("floor"),
        total_floors: row.get("total_floors"),
        year_built: row.get("year_built"),
        first_seen_at: row.get("first_seen_at"),
        published_at: row.get("published_at"),
        is_active: row.get("is_active"),
        is_repost: row.get("is_repost"),
        original_listing_id: row.get("original_listing_id"),
    }
}
