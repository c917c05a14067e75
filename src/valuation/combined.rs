//! Combined engine (§4.7): concurrently searches listings and recorded
//! deals, applies the listings-side bargain discount, and blends the two
//! with a deal-weighted average. Ported from
//! `original_source/etl/valuation/combined_engine.py::CombinedEngine`.

use tokio::time::{timeout, Duration};

use crate::db::PgSpatialStore;
use crate::error::{CoreError, CoreResult};
use crate::models::{KnnEstimate, MethodTag, ValuationRequest, ValuationResponse};

use super::{knn_listings, knn_transactions};

const DEAL_WEIGHT_MULTIPLIER: f64 = 1.5;
const LISTING_WEIGHT_MULTIPLIER: f64 = 1.0;
const SEARCH_TIMEOUT_SECS: u64 = 5;

pub async fn estimate(
    store: &PgSpatialStore,
    req: &ValuationRequest,
    listing_max_age_days: i64,
    deal_max_age_days: i64,
    listing_bargain_discount: f64,
) -> CoreResult<ValuationResponse> {
    let budget = Duration::from_secs(SEARCH_TIMEOUT_SECS);

    let (listings_result, deals_result) = tokio::join!(
        timeout(budget, knn_listings::find_and_estimate(store, req, listing_max_age_days)),
        timeout(budget, knn_transactions::find_and_estimate(store, req, deal_max_age_days)),
    );

    // A timeout degrades that side to "missing", it never fails the whole
    // request (§7: Timeout is not escalated past a single source).
    let listings = match listings_result {
        Ok(Ok(est)) => Some(est),
        Ok(Err(_)) | Err(_) => None,
    };
    let deals = match deals_result {
        Ok(Ok(est)) => Some(est),
        Ok(Err(_)) | Err(_) => None,
    };

    combine(listings, deals, req.area_total, listing_bargain_discount)
}

fn combine(
    listings: Option<KnnEstimate>,
    deals: Option<KnnEstimate>,
    area_total: f64,
    listing_bargain_discount: f64,
) -> CoreResult<ValuationResponse> {
    let listing_n = listings.as_ref().map(|l| l.comparables.len()).unwrap_or(0);
    let deal_n = deals.as_ref().map(|d| d.comparables.len()).unwrap_or(0);

    let listing_psm = listings
        .as_ref()
        .map(|l| l.median_price_per_sqm * (1.0 - listing_bargain_discount));
    let deal_psm = deals.as_ref().map(|d| d.median_price_per_sqm);

    let (price_per_sqm, method_used) = match (listing_psm, deal_psm) {
        (Some(l), Some(d)) => {
            let deal_weight = deal_n as f64 * DEAL_WEIGHT_MULTIPLIER;
            let listing_weight = listing_n as f64 * LISTING_WEIGHT_MULTIPLIER;
            let total_weight = deal_weight + listing_weight;
            let blended = if total_weight > 0.0 {
                (d * deal_weight + l * listing_weight) / total_weight
            } else {
                (d + l) / 2.0
            };
            (blended, MethodTag::CombinedWeighted)
        }
        (Some(l), None) => (l, MethodTag::ListingsOnly),
        (None, Some(d)) => (d, MethodTag::TransactionsOnly),
        (None, None) => {
            return Err(CoreError::InsufficientData(
                "neither listings nor recorded deals produced comparables".into(),
            ))
        }
    };

    let total_comps = listing_n + deal_n;
    let mut confidence = if total_comps >= 10 {
        80.0
    } else if total_comps >= 5 {
        65.0
    } else if total_comps >= 3 {
        50.0
    } else {
        30.0
    };
    if listing_n >= 3 && deal_n >= 3 {
        confidence = (confidence + 10.0).min(90.0);
    }

    let estimated_price = price_per_sqm * area_total;
    let comparables = listings.map(|l| l.comparables).unwrap_or_default();
    let rosreestr_deals = deals.map(|d| d.comparables);
    let rosreestr_count = rosreestr_deals.as_ref().map(|d| d.len() as i32);

    Ok(ValuationResponse {
        estimated_price,
        price_per_sqm,
        confidence,
        range_low: estimated_price * 0.95,
        range_high: estimated_price * 1.05,
        method_used,
        sample_count: total_comps as i32,
        grid_weight: 0.0,
        knn_weight: 1.0,
        comparables_count: comparables.len() as i32,
        comparables,
        rosreestr_deals,
        rosreestr_count,
        interest_price: None,
        interest_price_per_sqm: None,
        expected_profit: None,
        profit_rate: None,
        monthly_profit_rate: None,
        investment_breakdown: None,
        timestamp: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comparable;
    use uuid::Uuid;

    fn estimate_with(psm: f64, n: usize) -> KnnEstimate {
        let comparables: Vec<Comparable> = (0..n)
            .map(|_| Comparable {
                id: Uuid::new_v4(),
                price: psm * 50.0,
                price_per_sqm: psm,
                distance_km: 1.0,
                similarity_score: 80.0,
                weight: 1.0 / n.max(1) as f64,
            })
            .collect();
        KnnEstimate {
            weighted_mean_price: psm * 50.0,
            median_price: psm * 50.0,
            weighted_mean_price_per_sqm: psm,
            median_price_per_sqm: psm,
            confidence: 70.0,
            comparables,
        }
    }

    #[test]
    fn weighted_combination_matches_the_deal_heavy_formula() {
        // deals: psm 300_000 x4, listings: psm 350_000 (pre-discount) x2
        let deals = estimate_with(300_000.0, 4);
        let listings = estimate_with(350_000.0, 2);
        let resp = combine(Some(listings), Some(deals), 45.0, 0.07).unwrap();

        let discounted_listing_psm = 350_000.0 * (1.0 - 0.07);
        let deal_weight = 4.0 * 1.5;
        let listing_weight = 2.0 * 1.0;
        let expected_psm = (300_000.0 * deal_weight + discounted_listing_psm * listing_weight)
            / (deal_weight + listing_weight);

        assert!((resp.price_per_sqm - expected_psm).abs() < 1.0);
        assert_eq!(resp.method_used, MethodTag::CombinedWeighted);
    }

    #[test]
    fn confidence_boost_requires_three_on_each_side() {
        let deals = estimate_with(300_000.0, 3);
        let listings = estimate_with(310_000.0, 3);
        let resp = combine(Some(listings), Some(deals), 45.0, 0.07).unwrap();
        // total_comps=6 -> base 65, +10 boost (both sides >=3) -> 75
        assert_eq!(resp.confidence, 75.0);
    }

    #[test]
    fn listings_only_tags_listings_only() {
        let listings = estimate_with(300_000.0, 4);
        let resp = combine(Some(listings), None, 45.0, 0.07).unwrap();
        assert_eq!(resp.method_used, MethodTag::ListingsOnly);
        assert!(resp.rosreestr_deals.is_none());
    }
}
