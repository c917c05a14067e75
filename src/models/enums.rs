//! Closed enumerations. Every one carries an explicit unknown/other variant
//! rather than falling back to a bare string, per the "dynamic typing ->
//! closed variants" redesign.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "building_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BuildingType {
    Panel,
    Brick,
    Monolithic,
    Block,
    Wood,
    Other,
    Unknown,
}

impl Default for BuildingType {
    fn default() -> Self {
        BuildingType::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "building_height", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BuildingHeight {
    Low,
    Medium,
    High,
    Unknown,
}

impl Default for BuildingHeight {
    fn default() -> Self {
        BuildingHeight::Unknown
    }
}

impl BuildingHeight {
    /// Buckets a floor count into a height class: low up to 5 floors,
    /// medium 6-10, high 11 and up.
    pub fn from_total_floors(total_floors: Option<i32>) -> Self {
        match total_floors {
            Some(f) if f <= 5 => BuildingHeight::Low,
            Some(f) if f <= 10 => BuildingHeight::Medium,
            Some(_) => BuildingHeight::High,
            None => BuildingHeight::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Own,
    Partner,
    PartnerFlip,
    BankFlip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodTag {
    #[serde(rename = "bottom_1_with_bargain")]
    Bottom1WithBargain,
    #[serde(rename = "bottom_2_with_bargain")]
    Bottom2WithBargain,
    #[serde(rename = "bottom_3_with_bargain")]
    Bottom3WithBargain,
    GridOnly,
    CombinedWeighted,
    ListingsOnly,
    TransactionsOnly,
}

impl MethodTag {
    /// The pure-KNN path always emits a bottom-K tag, never a confidence
    /// label: `bottom_1_with_bargain` up through `bottom_3_with_bargain`
    /// depending on how many comparables actually fed the estimate.
    pub fn bottom_k(sample_count: usize) -> Self {
        match sample_count.min(3) {
            0 | 1 => MethodTag::Bottom1WithBargain,
            2 => MethodTag::Bottom2WithBargain,
            _ => MethodTag::Bottom3WithBargain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLevel {
    Exact,
    RelaxedHeight,
    RelaxedType,
    RegionLevel,
    Global,
}
