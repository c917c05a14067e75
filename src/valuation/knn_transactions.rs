//! K-nearest-neighbor comparable search over recorded deals (§4.4).
//! Ported from `original_source/etl/valuation/rosreestr_searcher.py`, which
//! mirrors `knn_searcher.py`'s structure but differs in scoring weights
//! (area/year/floor/distance: 30/25/15/30, no building-type dimension),
//! area tolerance (±20%), default staleness (365 days), and never applies
//! a bargain discount — recorded deals are already closed prices. The
//! building-class filter is year-only, the same asymmetric rule the
//! listings searcher applies, with no height component.

use crate::db::PgSpatialStore;
use crate::error::{CoreError, CoreResult};
use crate::geo_utils::{haversine_km, BoundingBox};
use crate::models::{Comparable, KnnEstimate, RecordedDeal, ValuationRequest};

use super::{median, passes_year_rule, BACKFILL_TARGET, MIN_COMPARABLES};

pub async fn find_and_estimate(
    store: &PgSpatialStore,
    req: &ValuationRequest,
    max_age_days: i64,
) -> CoreResult<KnnEstimate> {
    if req.area_total <= 0.0 {
        return Err(CoreError::InvalidInput("area_total must be positive".into()));
    }

    let bbox = BoundingBox::around_km(req.latitude, req.longitude, req.max_distance_km);
    let area_low = req.area_total * 0.8;
    let area_high = req.area_total * 1.2;
    let effective_max_age_days = max_age_days.min(req.max_age_days);

    let mut candidates = store
        .find_deal_candidates(&bbox, req.rooms, effective_max_age_days)
        .await?;
    candidates.retain(|c| match c.area_total {
        Some(a) => a >= area_low && a <= area_high,
        None => false,
    });

    if candidates.is_empty() {
        return Err(CoreError::InsufficientData(
            "no recorded-deal comparables in range".into(),
        ));
    }

    let filtered = filter_by_year(candidates, req);
    let scored = score_comparables(&filtered, req);
    let top = super::top_k(scored, req.k());
    let weighted = super::assign_weights(top);
    calculate_estimate(&weighted)
}

/// Year-only building-class filter; if fewer than `MIN_COMPARABLES` pass,
/// backs off and keeps the closest `BACKFILL_TARGET` by distance instead
/// of failing outright.
fn filter_by_year(deals: Vec<RecordedDeal>, req: &ValuationRequest) -> Vec<RecordedDeal> {
    let strict: Vec<RecordedDeal> = deals
        .iter()
        .filter(|d| passes_year_rule(req.year_built, d.year_built))
        .cloned()
        .collect();

    if strict.len() >= MIN_COMPARABLES {
        return strict;
    }

    let mut backfill = deals;
    backfill.sort_by(|a, b| {
        let da = haversine_km(req.latitude, req.longitude, a.latitude, a.longitude);
        let db = haversine_km(req.latitude, req.longitude, b.latitude, b.longitude);
        da.partial_cmp(&db).unwrap()
    });
    backfill.truncate(BACKFILL_TARGET);
    backfill
}

fn score_comparables(deals: &[RecordedDeal], req: &ValuationRequest) -> Vec<Comparable> {
    use rust_decimal::prelude::ToPrimitive;

    deals
        .iter()
        .filter_map(|deal| {
            let area = deal.area_total?;
            let price = deal.deal_price.to_f64()?;
            let distance_km = haversine_km(req.latitude, req.longitude, deal.latitude, deal.longitude);

            let area_ratio = if area > 0.0 {
                area.min(req.area_total) / area.max(req.area_total)
            } else {
                0.0
            };
            let area_score = 30.0 * area_ratio;

            let year_score = match (req.year_built, deal.year_built) {
                (Some(a), Some(b)) => (25.0 - (a - b).abs() as f64).max(0.0),
                _ => 12.0,
            };

            let floor_score = match (req.floor, deal.floor) {
                (Some(a), Some(b)) => (15.0 - 2.0 * (a - b).abs() as f64).max(0.0),
                _ => 7.0,
            };

            let distance_score = if distance_km <= 1.0 {
                30.0
            } else if distance_km <= 3.0 {
                22.0
            } else if distance_km <= 5.0 {
                15.0
            } else {
                (15.0 - 2.0 * (distance_km - 5.0)).max(0.0)
            };

            let total_score = area_score + year_score + floor_score + distance_score;

            Some(Comparable {
                id: deal.id,
                price,
                price_per_sqm: price / area,
                distance_km,
                similarity_score: total_score,
                weight: 0.0,
            })
        })
        .collect()
}

fn calculate_estimate(comparables: &[Comparable]) -> CoreResult<KnnEstimate> {
    if comparables.is_empty() {
        return Err(CoreError::InsufficientData("no comparables to estimate from".into()));
    }

    let weighted_mean_price: f64 = comparables.iter().map(|c| c.price * c.weight).sum();
    let weighted_mean_price_per_sqm: f64 = comparables.iter().map(|c| c.price_per_sqm * c.weight).sum();

    let mut prices: Vec<f64> = comparables.iter().map(|c| c.price).collect();
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut psms: Vec<f64> = comparables.iter().map(|c| c.price_per_sqm).collect();
    psms.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let n = comparables.len() as f64;
    let avg_similarity: f64 = comparables.iter().map(|c| c.similarity_score).sum::<f64>() / n;
    let avg_distance: f64 = comparables.iter().map(|c| c.distance_km).sum::<f64>() / n;

    let confidence = ((n / 10.0) * 20.0 + (avg_similarity / 100.0) * 50.0 + (1.0 / (1.0 + avg_distance)) * 30.0)
        .min(100.0);

    Ok(KnnEstimate {
        weighted_mean_price,
        median_price: median(&prices),
        weighted_mean_price_per_sqm,
        median_price_per_sqm: median(&psms),
        confidence,
        comparables: comparables.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;
    use crate::models::BuildingType;

    fn mock_deal(area: f64, year: i32, lat: f64, lon: f64, price: f64) -> RecordedDeal {
        RecordedDeal {
            id: Uuid::new_v4(),
            address: "addr".into(),
            normalized_address: None,
            latitude: lat,
            longitude: lon,
            region_id: None,
            building_type: BuildingType::Panel,
            rooms: Some(2),
            area_total: Some(area),
            floor: Some(5),
            year_built: Some(year),
            deal_price: Decimal::try_from(price).unwrap(),
            deal_date: Utc::now(),
        }
    }

    fn req() -> ValuationRequest {
        ValuationRequest {
            latitude: 55.75,
            longitude: 37.61,
            building_type: Some(BuildingType::Panel),
            rooms: Some(2),
            area_total: 54.0,
            floor: Some(5),
            total_floors: Some(10),
            year_built: Some(2010),
            k: 10,
            max_distance_km: 5.0,
            max_age_days: 365,
            exclude_listing_id: None,
        }
    }

    #[test]
    fn never_applies_a_bargain_discount() {
        let deal = mock_deal(54.0, 2010, 55.75, 37.61, 10_000_000.0);
        let scored = score_comparables(&[deal], &req());
        assert!((scored[0].price - 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn filter_by_year_falls_back_when_too_few_survive() {
        let deals = vec![mock_deal(54.0, 1950, 55.75, 37.61, 9_000_000.0)];
        let filtered = filter_by_year(deals.clone(), &req());
        assert_eq!(filtered.len(), 1, "falls back to closest-by-distance below 3 survivors");
    }

    #[test]
    fn filter_by_year_excludes_pre_1990_for_a_modern_target() {
        let old = mock_deal(54.0, 1985, 55.75, 37.61, 9_000_000.0);
        let recent_a = mock_deal(54.0, 2012, 55.76, 37.62, 10_000_000.0);
        let recent_b = mock_deal(54.0, 2015, 55.77, 37.63, 10_500_000.0);
        let recent_c = mock_deal(54.0, 2018, 55.78, 37.64, 11_000_000.0);
        let filtered = filter_by_year(vec![old, recent_a, recent_b, recent_c], &req());
        assert!(filtered.iter().all(|d| d.year_built != Some(1985)));
    }
}
