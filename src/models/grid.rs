//! Grid segment / aggregate entities (§3: PropertySegment, GridAggregate).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::enums::{BuildingHeight, BuildingType, FallbackLevel};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PropertySegment {
    pub id: Uuid,
    pub region_id: Uuid,
    pub building_type: BuildingType,
    pub building_height: BuildingHeight,
    pub rooms: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GridAggregate {
    pub segment_id: Uuid,
    pub avg_price_per_sqm: f64,
    pub median_price_per_sqm: f64,
    pub sample_count: i32,
    pub confidence_score: f64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GridEstimate {
    pub price_per_sqm: f64,
    pub confidence: f64,
    pub sample_count: i32,
    pub fallback_level: FallbackLevel,
}
