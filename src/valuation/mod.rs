//! KNN comparable search, hybrid engine, and combined dual-source engine
//! (§4.3–4.5, §4.7).

pub mod combined;
pub mod hybrid;
pub mod knn_listings;
pub mod knn_transactions;

use crate::models::Comparable;

/// How many strict-filter survivors the building-class/year filters require
/// before they'll stop backfilling from the wider candidate pool.
pub(crate) const MIN_COMPARABLES: usize = 3;
/// How many candidates a backfill pass keeps, closest-distance first.
pub(crate) const BACKFILL_TARGET: usize = 5;

/// The year-only building-class rule shared by both KNN searchers: a
/// target built in or after 2000 excludes anything older than 1990; a
/// target older than 1990 excludes anything from 2000 on. Years in between
/// (1990-1999) impose no exclusion.
pub(crate) fn passes_year_rule(target_year: Option<i32>, candidate_year: Option<i32>) -> bool {
    let (Some(target), Some(candidate)) = (target_year, candidate_year) else {
        return true;
    };
    if target >= 2000 {
        candidate >= 1990
    } else if target < 1990 {
        candidate < 2000
    } else {
        true
    }
}

/// Keeps the `k` highest-scored comparables, dropping the rest before
/// weighting.
pub(crate) fn top_k(mut comparables: Vec<Comparable>, k: usize) -> Vec<Comparable> {
    comparables.sort_by(|a, b| b.similarity_score.partial_cmp(&a.similarity_score).unwrap());
    comparables.truncate(k);
    comparables
}

/// Shared by both KNN searchers: weight = score / total, uniform when the
/// total similarity score is zero.
pub(crate) fn assign_weights(mut comparables: Vec<Comparable>) -> Vec<Comparable> {
    let total: f64 = comparables.iter().map(|c| c.similarity_score).sum();
    if total <= 0.0 {
        let n = comparables.len() as f64;
        for c in comparables.iter_mut() {
            c.weight = if n > 0.0 { 1.0 / n } else { 0.0 };
        }
    } else {
        for c in comparables.iter_mut() {
            c.weight = c.similarity_score / total;
        }
    }
    comparables
}

pub(crate) fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
