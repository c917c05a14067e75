//! Listing entities (§3: Listing, ListingPrice).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BuildingHeight, BuildingType};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub external_id: String,
    pub raw_address: String,
    pub normalized_address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub region_id: Option<Uuid>,
    pub building_type: BuildingType,
    pub building_height: BuildingHeight,
    pub rooms: Option<i32>,
    pub area_total: Option<f64>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,
    pub first_seen_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_repost: bool,
    pub original_listing_id: Option<Uuid>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingPrice {
    pub listing_id: Uuid,
    pub price: Decimal,
    pub seen_at: DateTime<Utc>,
}

/// A comparable found and scored during a KNN search (§4.3/§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparable {
    pub id: Uuid,
    pub price: f64,
    pub price_per_sqm: f64,
    pub distance_km: f64,
    pub similarity_score: f64,
    pub weight: f64,
}
