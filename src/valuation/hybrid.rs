//! Hybrid engine (§4.5): blends a KNN listings estimate with a grid
//! aggregate fallback using a bottom-K, IQR-trimmed bargain estimate.
//! Ported from `original_source/etl/valuation/hybrid_engine.py`.

use crate::error::{CoreError, CoreResult};
use crate::models::{GridEstimate, KnnEstimate, MethodTag, ValuationResponse};

const BARGAIN_DISCOUNT: f64 = 0.93;

/// Removes IQR outliers from a price-per-sqm series, only when there are
/// enough points for quartiles to be meaningful (len >= 4), and only keeps
/// the filtered result if at least 3 points survived.
fn remove_iqr_outliers(mut values: Vec<f64>) -> Vec<f64> {
    if values.len() < 4 {
        return values;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let q1 = values[values.len() / 4];
    let q3 = values[values.len() * 3 / 4];
    let iqr = q3 - q1;
    let low = q1 - 1.5 * iqr;
    let high = q3 + 1.5 * iqr;

    let filtered: Vec<f64> = values.iter().copied().filter(|v| *v >= low && *v <= high).collect();
    if filtered.len() >= 3 {
        filtered
    } else {
        values
    }
}

fn bottom_k_estimate(price_per_sqm: Vec<f64>, area_total: f64) -> (f64, f64) {
    let cleaned = remove_iqr_outliers(price_per_sqm);
    let n = cleaned.len();
    let k = n.min(3);

    let mut sorted = cleaned;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let bottom: &[f64] = &sorted[..k];
    let avg_psm = bottom.iter().sum::<f64>() / k as f64;
    let discounted_psm = avg_psm * BARGAIN_DISCOUNT;

    let confidence = if n >= 5 {
        75.0
    } else if n >= 3 {
        65.0
    } else {
        50.0
    };

    (discounted_psm * area_total, confidence)
}

fn range_pct_for_confidence(confidence: f64) -> f64 {
    if confidence >= 70.0 {
        0.05
    } else if confidence >= 50.0 {
        0.10
    } else {
        0.15
    }
}

pub fn estimate(
    knn: Option<&KnnEstimate>,
    grid: Option<&GridEstimate>,
    area_total: f64,
) -> CoreResult<ValuationResponse> {
    let (estimated_price, price_per_sqm, confidence, sample_count, method_used, comparables, knn_weight, grid_weight) =
        match (knn, grid) {
            (Some(k), _) if !k.comparables.is_empty() => {
                let psm_series: Vec<f64> = k.comparables.iter().map(|c| c.price_per_sqm).collect();
                let (price, confidence) = bottom_k_estimate(psm_series, area_total);
                let n = k.comparables.len();
                (
                    price,
                    price / area_total,
                    confidence,
                    n as i32,
                    MethodTag::bottom_k(n),
                    k.comparables.clone(),
                    1.0,
                    0.0,
                )
            }
            (_, Some(g)) => (
                g.price_per_sqm * area_total,
                g.price_per_sqm,
                g.confidence,
                g.sample_count,
                MethodTag::GridOnly,
                Vec::new(),
                0.0,
                1.0,
            ),
            _ => {
                return Err(CoreError::InsufficientData(
                    "neither KNN comparables nor a grid aggregate were available".into(),
                ))
            }
        };

    let range_pct = range_pct_for_confidence(confidence);

    Ok(ValuationResponse {
        estimated_price,
        price_per_sqm,
        confidence,
        range_low: estimated_price * (1.0 - range_pct),
        range_high: estimated_price * (1.0 + range_pct),
        method_used,
        sample_count,
        grid_weight,
        knn_weight,
        comparables_count: comparables.len() as i32,
        comparables,
        rosreestr_deals: None,
        rosreestr_count: None,
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

    fn comp(psm: f64) -> Comparable {
        Comparable {
            id: Uuid::new_v4(),
            price: psm * 54.0,
            price_per_sqm: psm,
            distance_km: 1.0,
            similarity_score: 80.0,
            weight: 0.2,
        }
    }

    #[test]
    fn bottom_k_applies_the_bargain_discount() {
        let psms = vec![300_000.0, 310_000.0, 320_000.0, 330_000.0, 340_000.0];
        let (price, confidence) = bottom_k_estimate(psms, 45.0);
        // bottom 3 of [300k,310k,320k,330k,340k] = [300k,310k,320k], avg=310k
        let expected = 310_000.0 * BARGAIN_DISCOUNT * 45.0;
        assert!((price - expected).abs() < 1.0, "got {price}, expected {expected}");
        assert_eq!(confidence, 75.0);
    }

    #[test]
    fn iqr_filter_is_skipped_below_four_points() {
        let values = vec![1.0, 2.0, 100.0];
        let filtered = remove_iqr_outliers(values.clone());
        assert_eq!(filtered, values);
    }

    #[test]
    fn grid_only_path_when_no_comparables() {
        let knn = KnnEstimate {
            weighted_mean_price: 0.0,
            median_price: 0.0,
            weighted_mean_price_per_sqm: 0.0,
            median_price_per_sqm: 0.0,
            confidence: 0.0,
            comparables: vec![],
        };
        let grid = GridEstimate {
            price_per_sqm: 250_000.0,
            confidence: 40.0,
            sample_count: 12,
            fallback_level: crate::models::FallbackLevel::RegionLevel,
        };
        let resp = estimate(Some(&knn), Some(&grid), 50.0).unwrap();
        assert_eq!(resp.method_used, MethodTag::GridOnly);
        assert!((resp.estimated_price - 250_000.0 * 50.0).abs() < 1e-6);
    }

    #[test]
    fn errors_when_nothing_is_available() {
        let err = estimate(None, None, 50.0);
        assert!(err.is_err());
    }

    #[test]
    fn knn_path_wins_over_grid_and_tags_bottom_k() {
        let knn = KnnEstimate {
            weighted_mean_price: 0.0,
            median_price: 0.0,
            weighted_mean_price_per_sqm: 0.0,
            median_price_per_sqm: 0.0,
            confidence: 55.0,
            comparables: vec![comp(300_000.0), comp(310_000.0), comp(320_000.0)],
        };
        let grid = GridEstimate {
            price_per_sqm: 280_000.0,
            confidence: 45.0,
            sample_count: 8,
            fallback_level: crate::models::FallbackLevel::RelaxedType,
        };
        let resp = estimate(Some(&knn), Some(&grid), 54.0).unwrap();
        assert_eq!(resp.method_used, MethodTag::Bottom3WithBargain);
        assert!((resp.knn_weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bottom_k_tag_tracks_sample_count_below_three() {
        let knn = KnnEstimate {
            weighted_mean_price: 0.0,
            median_price: 0.0,
            weighted_mean_price_per_sqm: 0.0,
            median_price_per_sqm: 0.0,
            confidence: 50.0,
            comparables: vec![comp(300_000.0), comp(310_000.0)],
        };
        let resp = estimate(Some(&knn), None, 54.0).unwrap();
        assert_eq!(resp.method_used, MethodTag::Bottom2WithBargain);
    }
}
