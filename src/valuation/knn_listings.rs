//! K-nearest-neighbor comparable search over active listings (§4.3).
//! Ported from `original_source/etl/valuation/knn_searcher.py`: the SQL
//! candidate fetch stays a thin `db` query, the filter/score/aggregate
//! pipeline here is pure, synchronous, in-memory work.

use crate::db::PgSpatialStore;
use crate::error::{CoreError, CoreResult};
use crate::geo_utils::{haversine_km, BoundingBox};
use crate::models::{Comparable, KnnEstimate, Listing, ValuationRequest};

use super::{median, passes_year_rule, BACKFILL_TARGET, MIN_COMPARABLES};

const AREA_ADJUSTMENT_COEF: f64 = 0.001;

/// Runs the full candidate fetch -> filter -> score -> estimate pipeline
/// for a single valuation request.
pub async fn find_and_estimate(
    store: &PgSpatialStore,
    req: &ValuationRequest,
    max_age_days: i64,
) -> CoreResult<KnnEstimate> {
    if req.area_total <= 0.0 {
        return Err(CoreError::InvalidInput("area_total must be positive".into()));
    }

    let bbox = BoundingBox::around_km(req.latitude, req.longitude, req.max_distance_km);
    let effective_max_age_days = max_age_days.min(req.max_age_days);

    let mut candidates = store
        .find_listing_candidates(&bbox, req.rooms, 1, effective_max_age_days)
        .await?;
    if let Some(exclude_id) = req.exclude_listing_id {
        candidates.retain(|c| c.id != exclude_id);
    }
    retain_room_and_area_match(&mut candidates, req);

    let mut priced = Vec::with_capacity(candidates.len());
    for listing in candidates {
        if let Some(price) = store.latest_price(listing.id).await? {
            priced.push((listing, price));
        }
    }

    let filtered = filter_by_building_class(priced, req);
    if filtered.is_empty() {
        return Err(CoreError::InsufficientData(
            "no comparables survived the building-class filter".into(),
        ));
    }

    let scored = score_comparables(&filtered, req);
    let top = super::top_k(scored, req.k());
    let weighted = super::assign_weights(top);
    calculate_estimate(&weighted)
}

/// A candidate matches on an exact room count with no area constraint, or
/// on a one-room difference provided the areas are within 10 m² of each
/// other. A candidate with no room count on file, against a request that
/// names one, never matches.
fn retain_room_and_area_match(candidates: &mut Vec<Listing>, req: &ValuationRequest) {
    candidates.retain(|c| match (req.rooms, c.rooms) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(target), Some(candidate)) => {
            let rooms_diff = (target - candidate).abs();
            if rooms_diff == 0 {
                true
            } else if rooms_diff == 1 {
                matches!(c.area_total, Some(area) if (req.area_total - area).abs() <= 10.0)
            } else {
                false
            }
        }
    });
}

/// Height rule: a target of 9+ floors excludes anything at or below 5; a
/// target of 5 or fewer excludes anything at or above 9; a target of 6-8
/// excludes both ends (<=5 or >=17). Missing data on either side passes.
fn passes_height_rule(target_total_floors: Option<i32>, candidate_total_floors: Option<i32>) -> bool {
    let (Some(target), Some(candidate)) = (target_total_floors, candidate_total_floors) else {
        return true;
    };
    if target >= 9 {
        candidate > 5
    } else if target <= 5 {
        candidate < 9
    } else {
        candidate > 5 && candidate < 17
    }
}

/// Keeps candidates whose total-floor count and build year both pass the
/// building-class rules; if fewer than `MIN_COMPARABLES` survive, backs
/// off to the height rule alone and keeps the closest `BACKFILL_TARGET` by
/// distance instead of failing outright.
fn filter_by_building_class(
    priced: Vec<(Listing, rust_decimal::Decimal)>,
    req: &ValuationRequest,
) -> Vec<(Listing, f64)> {
    use rust_decimal::prelude::ToPrimitive;

    let as_f64: Vec<(Listing, f64)> = priced
        .into_iter()
        .filter_map(|(l, p)| p.to_f64().map(|price| (l, price)))
        .collect();

    let strict: Vec<(Listing, f64)> = as_f64
        .iter()
        .filter(|(l, _)| {
            passes_height_rule(req.total_floors, l.total_floors) && passes_year_rule(req.year_built, l.year_built)
        })
        .cloned()
        .collect();

    if strict.len() >= MIN_COMPARABLES {
        return strict;
    }

    let mut by_height: Vec<(Listing, f64)> = as_f64
        .into_iter()
        .filter(|(l, _)| passes_height_rule(req.total_floors, l.total_floors))
        .collect();

    by_height.sort_by(|(a, _), (b, _)| {
        let da = haversine_km(req.latitude, req.longitude, a.latitude, a.longitude);
        let db = haversine_km(req.latitude, req.longitude, b.latitude, b.longitude);
        da.partial_cmp(&db).unwrap()
    });
    by_height.truncate(BACKFILL_TARGET);
    by_height
}

fn score_comparables(filtered: &[(Listing, f64)], req: &ValuationRequest) -> Vec<Comparable> {
    filtered
        .iter()
        .filter_map(|(listing, price)| {
            let area = listing.area_total?;
            let distance_km = haversine_km(req.latitude, req.longitude, listing.latitude, listing.longitude);

            let building_type_score = match req.building_type {
                Some(t) if t == listing.building_type
                    && t != crate::models::BuildingType::Unknown => 20.0,
                Some(crate::models::BuildingType::Unknown) | None => 10.0,
                _ if listing.building_type == crate::models::BuildingType::Unknown => 10.0,
                _ => 5.0,
            };

            let rooms_score = match (req.rooms, listing.rooms) {
                (Some(a), Some(b)) => (20.0 - 10.0 * (a - b).abs() as f64).max(0.0),
                _ => 10.0,
            };

            let area_ratio = if area > 0.0 {
                area.min(req.area_total) / area.max(req.area_total)
            } else {
                0.0
            };
            let area_score = 25.0 * area_ratio;

            let floor_score = match (req.floor, listing.floor) {
                (Some(a), Some(b)) => (15.0 - 2.0 * (a - b).abs() as f64).max(0.0),
                _ => 7.0,
            };

            let distance_score = if distance_km <= 1.0 {
                20.0
            } else if distance_km <= 3.0 {
                15.0
            } else if distance_km <= 5.0 {
                10.0
            } else {
                (10.0 - 2.0 * (distance_km - 5.0)).max(0.0)
            };

            let total_score = building_type_score + rooms_score + area_score + floor_score + distance_score;

            let area_diff = req.area_total - area;
            let correction_factor = if area_diff.abs() > 0.5 {
                1.0 - AREA_ADJUSTMENT_COEF * area_diff
            } else {
                1.0
            };

            let age_days = (chrono::Utc::now() - listing.first_seen_at).num_days().max(0) as f64;
            let aging_discount = (age_days / 30.0 * 0.01).min(0.03);

            let raw_psm = price / area;
            let corrected_psm = raw_psm * correction_factor * (1.0 - aging_discount);

            Some(Comparable {
                id: listing.id,
                price: corrected_psm * area,
                price_per_sqm: corrected_psm,
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
    use uuid::Uuid;
    use crate::models::{BuildingHeight, BuildingType};

    fn mock_listing(rooms: i32, area: f64, floor: i32, lat: f64, lon: f64) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            external_id: "x".into(),
            raw_address: "addr".into(),
            normalized_address: None,
            latitude: lat,
            longitude: lon,
            region_id: None,
            building_type: BuildingType::Panel,
            building_height: BuildingHeight::Medium,
            rooms: Some(rooms),
            area_total: Some(area),
            floor: Some(floor),
            total_floors: Some(10),
            year_built: Some(2010),
            first_seen_at: Utc::now(),
            published_at: None,
            is_active: true,
            is_repost: false,
            original_listing_id: None,
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
            max_age_days: 90,
            exclude_listing_id: None,
        }
    }

    #[test]
    fn exact_match_scores_the_maximum() {
        let listing = mock_listing(2, 54.0, 5, 55.75, 37.61);
        let scored = score_comparables(&[(listing, 10_000_000.0)], &req());
        assert_eq!(scored.len(), 1);
        assert!((scored[0].similarity_score - 100.0).abs() < 1e-6);
    }

    #[test]
    fn weights_sum_to_one() {
        let comps = vec![
            Comparable { id: Uuid::new_v4(), price: 1.0, price_per_sqm: 1.0, distance_km: 0.0, similarity_score: 80.0, weight: 0.0 },
            Comparable { id: Uuid::new_v4(), price: 2.0, price_per_sqm: 2.0, distance_km: 1.0, similarity_score: 20.0, weight: 0.0 },
        ];
        let weighted = crate::valuation::assign_weights(comps);
        let sum: f64 = weighted.iter().map(|c| c.weight).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_weights_when_total_score_is_zero() {
        let comps = vec![
            Comparable { id: Uuid::new_v4(), price: 1.0, price_per_sqm: 1.0, distance_km: 0.0, similarity_score: 0.0, weight: 0.0 },
            Comparable { id: Uuid::new_v4(), price: 2.0, price_per_sqm: 2.0, distance_km: 1.0, similarity_score: 0.0, weight: 0.0 },
        ];
        let weighted = crate::valuation::assign_weights(comps);
        assert!((weighted[0].weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn larger_target_area_lowers_corrected_price_per_sqm() {
        let comp_small_target = mock_listing(2, 50.0, 5, 55.75, 37.61);
        let req_large = ValuationRequest { area_total: 70.0, ..req() };
        let scored = score_comparables(&[(comp_small_target, 5_000_000.0)], &req_large);
        let raw_psm = 5_000_000.0 / 50.0;
        assert!(scored[0].price_per_sqm < raw_psm);
    }

    #[test]
    fn exact_room_match_bypasses_the_area_window() {
        let mut candidates = vec![mock_listing(2, 100.0, 5, 55.75, 37.61)];
        retain_room_and_area_match(&mut candidates, &req());
        assert_eq!(candidates.len(), 1, "exact room match keeps it despite a 46m2 area gap");
    }

    #[test]
    fn off_by_one_room_still_needs_the_area_window() {
        let mut candidates = vec![mock_listing(3, 100.0, 5, 55.75, 37.61)];
        retain_room_and_area_match(&mut candidates, &req());
        assert!(candidates.is_empty(), "1-room-off match with a 46m2 gap must be dropped");

        let mut close_area = vec![mock_listing(3, 60.0, 5, 55.75, 37.61)];
        retain_room_and_area_match(&mut close_area, &req());
        assert_eq!(close_area.len(), 1, "1-room-off match within 10m2 survives");
    }

    #[test]
    fn two_rooms_off_is_always_dropped() {
        let mut candidates = vec![mock_listing(4, 54.0, 5, 55.75, 37.61)];
        retain_room_and_area_match(&mut candidates, &req());
        assert!(candidates.is_empty());
    }

    #[test]
    fn height_rule_excludes_low_rise_for_a_high_rise_target() {
        assert!(!passes_height_rule(Some(9), Some(5)));
        assert!(passes_height_rule(Some(9), Some(6)));
        assert!(!passes_height_rule(Some(5), Some(9)));
        assert!(passes_height_rule(Some(5), Some(8)));
        assert!(!passes_height_rule(Some(7), Some(5)));
        assert!(!passes_height_rule(Some(7), Some(17)));
        assert!(passes_height_rule(Some(7), Some(10)));
    }

    #[test]
    fn top_k_keeps_only_the_highest_scored() {
        let comps = vec![
            Comparable { id: Uuid::new_v4(), price: 1.0, price_per_sqm: 1.0, distance_km: 0.0, similarity_score: 10.0, weight: 0.0 },
            Comparable { id: Uuid::new_v4(), price: 2.0, price_per_sqm: 2.0, distance_km: 0.0, similarity_score: 90.0, weight: 0.0 },
            Comparable { id: Uuid::new_v4(), price: 3.0, price_per_sqm: 3.0, distance_km: 0.0, similarity_score: 50.0, weight: 0.0 },
        ];
        let kept = crate::valuation::top_k(comps, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].similarity_score, 90.0);
        assert_eq!(kept[1].similarity_score, 50.0);
    }
}
