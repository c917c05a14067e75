//! Persistence for completed valuations (§3: ValuationRecord).

use sqlx::Row;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::ValuationRecord;

use super::PgSpatialStore;

impl PgSpatialStore {
    pub async fn record_valuation(
        &self,
        latitude: f64,
        longitude: f64,
        estimated_price: f64,
        confidence: f64,
        method_used: &str,
    ) -> CoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO valuation_records (id, latitude, longitude, estimated_price, confidence, method_used, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            "#,
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .bind(estimated_price)
        .bind(confidence)
        .bind(method_used)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn recent_valuations_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_deg: f64,
        limit: i64,
    ) -> CoreResult<Vec<ValuationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, latitude, longitude, estimated_price, confidence, method_used, computed_at
            FROM valuation_records
            WHERE latitude BETWEEN $1 AND $2 AND longitude BETWEEN $3 AND $4
            ORDER BY computed_at DESC
            LIMIT $5
            "#,
        )
        .bind(latitude - radius_deg)
        .bind(latitude + radius_deg)
        .bind(longitude - radius_deg)
        .bind(longitude + radius_deg)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ValuationRecord {
                id: r.get("id"),
                latitude: r.get("latitude"),
                longitude: r.get("longitude"),
                estimated_price: r.get("estimated_price"),
                confidence: r.get("confidence"),
                method_used: r.get("method_used"),
                computed_at: r.get("computed_at"),
            })
            .collect())
    }
}
