//! Duplicate / repost detection (§4.8). Ported from
//! `original_source/etl/duplicate_detector.py`: exact/similar matching,
//! repost determination, persisted duplicate edges, and the recursive
//! price-history/exposure-stats walk (capped at depth 10, enforced in the
//! `db` layer's recursive CTE).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::PgSpatialStore;
use crate::error::CoreResult;
use crate::models::{ExposureStats, Listing};

const AREA_TOLERANCE_SQM: f64 = 2.0;

/// A duplicate candidate with its similarity score, pre-persistence.
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub listing_id: Uuid,
    pub similarity: f64,
}

/// Finds every other active listing that looks like the same unit as
/// `listing`: exact match (same normalized address, rooms, area) scores
/// 1.0; a near match (same address and rooms, area within ±2 m²) scores
/// `1.0 - area_diff/10.0`.
pub fn find_duplicates(listing: &Listing, candidates: &[Listing]) -> Vec<DuplicateMatch> {
    candidates
        .iter()
        .filter(|c| c.id != listing.id)
        .filter_map(|c| {
            if c.normalized_address != listing.normalized_address || c.rooms != listing.rooms {
                return None;
            }
            match (listing.area_total, c.area_total) {
                (Some(a), Some(b)) if (a - b).abs() < f64::EPSILON => {
                    Some(DuplicateMatch { listing_id: c.id, similarity: 1.0 })
                }
                (Some(a), Some(b)) if (a - b).abs() <= AREA_TOLERANCE_SQM => {
                    let area_diff = (a - b).abs();
                    Some(DuplicateMatch {
                        listing_id: c.id,
                        similarity: 1.0 - area_diff / 10.0,
                    })
                }
                _ => None,
            }
        })
        .collect()
}

/// Given a listing and its oldest known duplicate, decides which one is
/// the "original" by `first_seen_at` (falling back to `published_at`).
/// Returns the id of the original when `listing` is the newer of the two.
pub fn detect_repost(listing: &Listing, oldest_duplicate: &Listing) -> Option<Uuid> {
    let listing_seen = listing.first_seen_at;
    let duplicate_seen = oldest_duplicate.first_seen_at;

    if listing_seen > duplicate_seen {
        Some(oldest_duplicate.id)
    } else {
        None
    }
}

/// Persists the duplicate edge and flags `listing` as a repost of
/// `original_id`.
pub async fn link_duplicates(
    store: &PgSpatialStore,
    original_id: Uuid,
    duplicate_id: Uuid,
    similarity: f64,
) -> CoreResult<()> {
    store.link_duplicate(original_id, duplicate_id, similarity).await
}

/// Computes the days-on-market / price-change summary for a listing,
/// unwinding through its repost chain when it is itself a repost
/// (§4.8 supplement, folded back in from `calculate_exposure_stats`).
pub async fn calculate_exposure_stats(store: &PgSpatialStore, listing: &Listing) -> CoreResult<ExposureStats> {
    let history = store.price_history_via_duplicates(listing.id).await?;

    let (initial_price, current_price) = match (history.first(), history.last()) {
        (Some((_, first, _)), Some((_, last, _))) => (*first, *last),
        _ => {
            let fallback = store.latest_price(listing.id).await?.unwrap_or(Decimal::ZERO);
            (fallback, fallback)
        }
    };

    let price_change_count = history.len().saturating_sub(1) as i32;
    let price_change_pct = pct_change(initial_price, current_price);

    let anchor_time = listing.published_at.unwrap_or(listing.first_seen_at);
    let days_on_market = days_between(anchor_time, Utc::now());

    Ok(ExposureStats {
        listing_id: listing.id,
        days_on_market,
        initial_price,
        current_price,
        price_change_pct,
        price_change_count,
        is_repost: listing.is_repost,
    })
}

fn pct_change(from: Decimal, to: Decimal) -> f64 {
    let from = from.to_f64().unwrap_or(0.0);
    let to = to.to_f64().unwrap_or(0.0);
    if from.abs() < f64::EPSILON {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildingHeight, BuildingType};

    fn mock_listing(id: Uuid, address: &str, rooms: i32, area: f64, seen: DateTime<Utc>) -> Listing {
        Listing {
            id,
            external_id: id.to_string(),
            raw_address: address.to_string(),
            normalized_address: Some(address.to_string()),
            latitude: 55.0,
            longitude: 37.0,
            region_id: None,
            building_type: BuildingType::Panel,
            building_height: BuildingHeight::Medium,
            rooms: Some(rooms),
            area_total: Some(area),
            floor: Some(3),
            total_floors: Some(9),
            year_built: Some(2005),
            first_seen_at: seen,
            published_at: None,
            is_active: true,
            is_repost: false,
            original_listing_id: None,
        }
    }

    #[test]
    fn exact_match_scores_1_0() {
        let now = Utc::now();
        let a = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, now);
        let b = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, now);
        let matches = find_duplicates(&a, &[b.clone()]);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn near_match_within_tolerance_scores_below_1() {
        let now = Utc::now();
        let a = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, now);
        let b = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 55.5, now);
        let matches = find_duplicates(&a, &[b]);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].similarity < 1.0 && matches[0].similarity > 0.0);
    }

    #[test]
    fn area_outside_tolerance_is_not_a_duplicate() {
        let now = Utc::now();
        let a = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, now);
        let b = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 60.0, now);
        assert!(find_duplicates(&a, &[b]).is_empty());
    }

    #[test]
    fn newer_listing_is_flagged_as_the_repost() {
        let older = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, Utc::now() - chrono::Duration::days(10));
        let newer = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, Utc::now());
        let original = detect_repost(&newer, &older);
        assert_eq!(original, Some(older.id));
    }

    #[test]
    fn older_listing_is_not_flagged_as_a_repost_of_a_newer_one() {
        let older = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, Utc::now() - chrono::Duration::days(10));
        let newer = mock_listing(Uuid::new_v4(), "tverskaya 1", 2, 54.0, Utc::now());
        assert_eq!(detect_repost(&older, &newer), None);
    }
}
