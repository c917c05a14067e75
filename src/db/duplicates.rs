//! Duplicate/repost persistence (§4.8), grounded on
//! `duplicate_detector.py`'s `link_duplicates`,
//! `get_price_history_from_duplicates` (recursive CTE, depth cap 10), and
//! `record_price_change`.

use sqlx::Row;

use crate::error::CoreResult;
use crate::models::Listing;

use super::PgSpatialStore;

impl PgSpatialStore {
    pub async fn find_candidate_duplicates(&self, listing: &Listing) -> CoreResult<Vec<Listing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, external_id, raw_address, normalized_address,
                   latitude, longitude, region_id, building_type, building_height,
                   rooms, area_total, floor, total_floors, year_built,
                   first_seen_at, published_at, is_active, is_repost, original_listing_id
            FROM listings
            WHERE id != $1
              AND normalized_address = $2
              AND rooms = $3
              AND abs(area_total - $4) <= 2.0
            "#,
        )
        .bind(listing.id)
        .bind(&listing.normalized_address)
        .bind(listing.rooms)
        .bind(listing.area_total.unwrap_or(0.0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Listing {
                id: row.get("id"),
                external_id: row.get("external_id"),
                raw_address: row.get("raw_address"),
                normalized_address: row.get("normalized_address"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                region_id: row.get("region_id"),
                building_type: row.get("building_type"),
                building_height: row.get("building_height"),
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
            })
            .collect())
    }

    pub async fn link_duplicate(
        &self,
        original_id: uuid::Uuid,
        duplicate_id: uuid::Uuid,
        similarity: f64,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO listing_duplicates (original_listing_id, duplicate_listing_id, similarity, detected_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (original_listing_id, duplicate_listing_id) DO UPDATE SET
                similarity = EXCLUDED.similarity,
                detected_at = EXCLUDED.detected_at
            "#,
        )
        .bind(original_id)
        .bind(duplicate_id)
        .bind(similarity)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"UPDATE listings SET is_repost = TRUE, original_listing_id = $1 WHERE id = $2"#,
        )
        .bind(original_id)
        .bind(duplicate_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Walks the `original_listing_id` chain up to depth 10, returning the
    /// unified price history across every repost in the chain.
    pub async fn price_history_via_duplicates(
        &self,
        listing_id: uuid::Uuid,
    ) -> CoreResult<Vec<(uuid::Uuid, rust_decimal::Decimal, chrono::DateTime<chrono::Utc>)>> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE chain(id, original_listing_id, depth) AS (
                SELECT id, original_listing_id, 0 FROM listings WHERE id = $1
                UNION ALL
                SELECT l.id, l.original_listing_id, c.depth + 1
                FROM listings l
                JOIN chain c ON l.id = c.original_listing_id
                WHERE c.depth < 10
            )
            SELECT lp.listing_id, lp.price, lp.seen_at
            FROM chain c
            JOIN listing_prices lp ON lp.listing_id = c.id
            ORDER BY lp.seen_at
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get("listing_id"), r.get("price"), r.get("seen_at")))
            .collect())
    }

    pub async fn record_price_change(
        &self,
        listing_id: uuid::Uuid,
        new_price: rust_decimal::Decimal,
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO listing_prices (listing_id, price, seen_at) VALUES ($1, $2, now())
               ON CONFLICT (listing_id, seen_at) DO NOTHING"#,
        )
        .bind(listing_id)
        .bind(new_price)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE listings l SET
                price_change_count = COALESCE(l.price_change_count, 0) + 1
            WHERE l.id = $1
            "#,
        )
        .bind(listing_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
