//! Valuation request/response wire shapes (§6) and intermediate estimate
//! types shared by the KNN, hybrid, grid and combined engines.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BuildingType, MethodTag};
use super::listing::Comparable;

fn default_k() -> i32 {
    10
}
fn default_max_distance_km() -> f64 {
    5.0
}
fn default_max_age_days() -> i64 {
    90
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub building_type: Option<BuildingType>,
    pub rooms: Option<i32>,
    pub area_total: f64,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,

    /// How many comparables to keep, after scoring, before weighting.
    #[serde(default = "default_k")]
    pub k: i32,
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
    /// A listing to exclude from its own comparable set — set when
    /// re-valuing a listing already in the store.
    #[serde(default)]
    pub exclude_listing_id: Option<Uuid>,
}

impl ValuationRequest {
    /// `k` clamped to the 1-50 range the comparable search actually honors.
    pub fn k(&self) -> usize {
        self.k.clamp(1, 50) as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationResponse {
    pub estimated_price: f64,
    pub price_per_sqm: f64,
    pub confidence: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub method_used: MethodTag,
    pub sample_count: i32,

    pub grid_weight: f64,
    pub knn_weight: f64,
    pub comparables: Vec<Comparable>,
    pub comparables_count: i32,
    pub rosreestr_deals: Option<Vec<Comparable>>,
    pub rosreestr_count: Option<i32>,

    pub interest_price: Option<f64>,
    pub interest_price_per_sqm: Option<f64>,
    pub expected_profit: Option<f64>,
    pub profit_rate: Option<f64>,
    pub monthly_profit_rate: Option<f64>,
    pub investment_breakdown: Option<BTreeMap<String, f64>>,

    pub timestamp: DateTime<Utc>,
}

impl ValuationResponse {
    /// One-line human summary, mirroring the emoji-prefixed status lines
    /// the original system renders for operators/analysts.
    pub fn summary(&self) -> String {
        format!(
            "💰 {:.0}₽ ({:.0}₽/m²) · confidence {:.0} · {:?} · n={}",
            self.estimated_price,
            self.price_per_sqm,
            self.confidence,
            self.method_used,
            self.sample_count
        )
    }
}

/// Result of a KNN comparable search before it's folded into a hybrid or
/// combined estimate (§4.3/§4.4).
#[derive(Debug, Clone)]
pub struct KnnEstimate {
    pub weighted_mean_price: f64,
    pub median_price: f64,
    pub weighted_mean_price_per_sqm: f64,
    pub median_price_per_sqm: f64,
    pub confidence: f64,
    pub comparables: Vec<super::listing::Comparable>,
}

/// Persisted record of a completed valuation (§3: ValuationRecord).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ValuationRecord {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub estimated_price: f64,
    pub confidence: f64,
    pub method_used: String,
    pub computed_at: chrono::DateTime<chrono::Utc>,
}
