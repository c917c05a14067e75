//! Recorded-deal entities (§3: RecordedDeal / the original's "rosreestr"
//! transactions).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::enums::BuildingType;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordedDeal {
    pub id: Uuid,
    pub address: String,
    pub normalized_address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub region_id: Option<Uuid>,
    pub building_type: BuildingType,
    pub rooms: Option<i32>,
    pub area_total: Option<f64>,
    pub floor: Option<i32>,
    pub year_built: Option<i32>,
    pub deal_price: Decimal,
    pub deal_date: DateTime<Utc>,
}
