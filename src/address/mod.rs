//! Address normalizer (§4.1): a deterministic regex pipeline, with an
//! optional external suggestion service consulted first — its output is
//! always re-passed through the same regex pipeline so the result
//! converges regardless of whether the suggestion service ran.
//!
//! Grounded on `original_source/api/v1/geocode_helper.py::geocode_from_local_db`
//! (the strip chain) and `parse_property_text` (free-text token extraction).

mod normalize;
mod parse_text;

pub use normalize::normalize_address;
pub use parse_text::{extract_property_text, PartialPropertyQuery};

use async_trait::async_trait;

use crate::error::CoreError;

/// Narrow, optional external collaborator. The default implementation
/// never calls out; a concrete HTTP-backed implementation lives outside
/// this crate, consistent with the "HTTP surface is an external
/// collaborator" scope boundary.
#[async_trait]
pub trait AddressSuggestionService: Send + Sync {
    async fn suggest(&self, raw_address: &str) -> Option<String>;
}

pub struct NullSuggestionService;

#[async_trait]
impl AddressSuggestionService for NullSuggestionService {
    async fn suggest(&self, _raw_address: &str) -> Option<String> {
        None
    }
}

/// Normalizes a raw address, consulting `service` first if given. A
/// suggestion-service failure or empty-result never escalates: the
/// function always falls back to normalizing the raw address directly,
/// per `CoreError::NormalizationFailed` never being treated as fatal by
/// callers.
pub async fn normalize_with_suggestions(
    raw_address: &str,
    service: &dyn AddressSuggestionService,
) -> Result<String, CoreError> {
    if raw_address.trim().is_empty() {
        return Err(CoreError::NormalizationFailed(
            "empty address".to_string(),
        ));
    }

    let candidate = service
        .suggest(raw_address)
        .await
        .unwrap_or_else(|| raw_address.to_string());

    Ok(normalize_address(&candidate))
}
