//! Recorded-deal candidate queries for the transaction searcher (§4.4),
//! modeled on `rosreestr_searcher.py`'s equivalent of
//! `knn_searcher.py::_find_comparables`.

use sqlx::Row;

use crate::error::CoreResult;
use crate::geo_utils::BoundingBox;
use crate::models::{BuildingType, RecordedDeal};

use super::PgSpatialStore;

impl PgSpatialStore {
    pub async fn find_deal_candidates(
        &self,
        bbox: &BoundingBox,
        rooms: Option<i32>,
        max_age_days: i64,
    ) -> CoreResult<Vec<RecordedDeal>> {
        let rows = sqlx::query(
            r#"
            SELECT id, address, normalized_address, latitude, longitude,
                   region_id, building_type, rooms, area_total, floor,
                   year_built, deal_price, deal_date
            FROM recorded_deals
            WHERE latitude BETWEEN $1 AND $2
              AND longitude BETWEEN $3 AND $4
              AND deal_date >= now() - make_interval(days => $5::int)
              AND ($6::int IS NULL OR rooms = $6::int)
            "#,
        )
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lon)
        .bind(bbox.max_lon)
        .bind(max_age_days as i32)
        .bind(rooms)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RecordedDeal {
                id: row.get("id"),
                address: row.get("address"),
                normalized_address: row.get("normalized_address"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                region_id: row.get("region_id"),
                building_type: row.get::<BuildingType, _>("building_type"),
                rooms: row.get("rooms"),
                area_total: row.get("area_total"),
                floor: row.get("floor"),
                year_built: row.get("year_built"),
                deal_price: row.get("deal_price"),
                deal_date: row.get("deal_date"),
            })
            .collect())
    }
}
