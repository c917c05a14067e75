//! Address-text district extraction, grounded on
//! `district_matcher.py::extract_district_from_address`
//! (`р-н\s+(...)` / `район\s+(...)`, trailing-suffix stripping).

use once_cell::sync::Lazy;
use regex::Regex;

static DISTRICT_SHORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)р-н\s+([а-яё\-\s]+)").unwrap());
static DISTRICT_LONG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)район\s+([а-яё\-\s]+)").unwrap());
static TRAILING_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(ий|ое|ая|ый)\s*$").unwrap());
static WORD_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,.;].*$").unwrap());

/// Extracts the district name token from a free-form address, stripping
/// the trailing adjective suffix the original flags as noise
/// ("Пресненский" район -> "Пресненск").
pub fn extract_district_token(address: &str) -> Option<String> {
    let lower = address.to_lowercase();
    let captured = DISTRICT_SHORT
        .captures(&lower)
        .or_else(|| DISTRICT_LONG.captures(&lower))?
        .get(1)?
        .as_str();

    let trimmed = WORD_BOUNDARY.replace(captured, "").trim().to_string();
    let stripped = TRAILING_SUFFIX.replace(&trimmed, "").trim().to_string();

    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_short_form_district() {
        let t = extract_district_token("Москва, Тверской р-н, ул. Тверская 1");
        assert_eq!(t.as_deref(), Some("тверск"));
    }

    #[test]
    fn extracts_long_form_district() {
        let t = extract_district_token("район Хамовники, Москва");
        assert_eq!(t.as_deref(), Some("хамовники"));
    }

    #[test]
    fn returns_none_without_a_district_marker() {
        assert_eq!(extract_district_token("ул. Арбат, 10"), None);
    }
}
