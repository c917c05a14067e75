//! Grid aggregator (§4.6): a five-level cascading fallback chain, each
//! level requiring at least 3 samples (the global average is exempt).
//! Ported from `original_source/etl/valuation/grid_estimator.py`.

use crate::db::PgSpatialStore;
use crate::error::{CoreError, CoreResult};
use crate::models::{BuildingHeight, BuildingType, FallbackLevel, GridEstimate};

const MIN_SAMPLES: i32 = 3;
const GLOBAL_WINDOW_DAYS: i64 = 90;
const GLOBAL_CONFIDENCE: f64 = 10.0;

pub async fn estimate(
    store: &PgSpatialStore,
    region_id: Option<uuid::Uuid>,
    building_type: BuildingType,
    building_height: BuildingHeight,
    rooms: i32,
) -> CoreResult<GridEstimate> {
    let Some(region_id) = region_id else {
        return global_average(store).await;
    };

    if let Some(row) = store
        .exact_segment_match(region_id, building_type, building_height, rooms.min(5))
        .await?
    {
        if row.sample_count >= MIN_SAMPLES {
            return Ok(GridEstimate {
                price_per_sqm: row.median_price_per_sqm,
                confidence: row.confidence_score,
                sample_count: row.sample_count,
                fallback_level: FallbackLevel::Exact,
            });
        }
    }

    if let Some((_, median, n)) = store.relaxed_height_match(region_id, building_type, rooms).await? {
        if n >= MIN_SAMPLES {
            return Ok(GridEstimate {
                price_per_sqm: median,
                confidence: (30.0 + (n / 5) as f64 * 10.0).min(100.0),
                sample_count: n,
                fallback_level: FallbackLevel::RelaxedHeight,
            });
        }
    }

    if let Some((_, median, n)) = store.relaxed_type_match(region_id, rooms).await? {
        if n >= MIN_SAMPLES {
            return Ok(GridEstimate {
                price_per_sqm: median,
                confidence: (20.0 + (n / 10) as f64 * 10.0).min(100.0),
                sample_count: n,
                fallback_level: FallbackLevel::RelaxedType,
            });
        }
    }

    if let Some((_, median, n)) = store.region_level_match(region_id).await? {
        if n >= MIN_SAMPLES {
            return Ok(GridEstimate {
                price_per_sqm: median,
                confidence: (10.0 + (n / 20) as f64 * 10.0).min(100.0),
                sample_count: n,
                fallback_level: FallbackLevel::RegionLevel,
            });
        }
    }

    global_average(store).await
}

async fn global_average(store: &PgSpatialStore) -> CoreResult<GridEstimate> {
    let avg = store.global_average(GLOBAL_WINDOW_DAYS).await?;
    if avg <= 0.0 {
        return Err(CoreError::InsufficientData(
            "no listings available even for the global average".into(),
        ));
    }
    Ok(GridEstimate {
        price_per_sqm: avg,
        confidence: GLOBAL_CONFIDENCE,
        sample_count: 0,
        fallback_level: FallbackLevel::Global,
    })
}

/// Recomputes and upserts the top-level aggregate row for every known
/// segment. Invoked by the `grid-refresh` batch binary, not the request
/// path (§5).
pub async fn recompute_all_segments(
    store: &PgSpatialStore,
    segments: &[crate::models::PropertySegment],
) -> CoreResult<usize> {
    let mut updated = 0;
    for segment in segments {
        if let Some((avg, median, n)) = store
            .relaxed_height_match(segment.region_id, segment.building_type, segment.rooms)
            .await?
        {
            let confidence = (20.0 + (n as f64 / 5.0).floor() * 10.0).min(100.0);
            store
                .upsert_grid_aggregate(segment.id, avg, median, n, confidence)
                .await?;
            updated += 1;
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxed_height_confidence_matches_original_formula() {
        let n = 17;
        let confidence: f64 = (30.0 + (n / 5) as f64 * 10.0).min(100.0);
        assert_eq!(confidence, 60.0);
    }

    #[test]
    fn relaxed_type_confidence_matches_original_formula() {
        let n = 45;
        let confidence: f64 = (20.0 + (n / 10) as f64 * 10.0).min(100.0);
        assert_eq!(confidence, 60.0);
    }

    #[test]
    fn region_level_confidence_matches_original_formula() {
        let n = 61;
        let confidence: f64 = (10.0 + (n / 20) as f64 * 10.0).min(100.0);
        assert_eq!(confidence, 40.0);
    }
}
