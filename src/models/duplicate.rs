//! Duplicate/repost detection entities (§3: DuplicateEdge, §4.8 supplement).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DuplicateEdge {
    pub original_listing_id: Uuid,
    pub duplicate_listing_id: Uuid,
    pub similarity: f64,
    pub detected_at: DateTime<Utc>,
}

/// Richer exposure record folded back in from the original's
/// `calculate_exposure_stats` (§4.8 supplement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureStats {
    pub listing_id: Uuid,
    pub days_on_market: i64,
    pub initial_price: Decimal,
    pub current_price: Decimal,
    pub price_change_pct: f64,
    pub price_change_count: i32,
    pub is_repost: bool,
}
