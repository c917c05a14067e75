//! The normalization regex pipeline itself. Grounded on
//! `geocode_helper.py::geocode_from_local_db`'s strip chain: city/region
//! prefix, street-type words, house/apartment prefixes, corpus/building
//! suffix normalization, then whitespace/punctuation cleanup.

use once_cell::sync::Lazy;
use regex::Regex;

struct Patterns {
    city_region_prefix: Regex,
    street_type_words: Regex,
    house_prefix: Regex,
    apartment_prefix: Regex,
    corpus_suffix: Regex,
    building_suffix: Regex,
    whitespace: Regex,
    trailing_punct: Regex,
}

static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    city_region_prefix: Regex::new(r"(?i)^\s*(г\.?\s*москва,?\s*|москва,?\s*|московская\s+область,?\s*|мо,?\s*)")
        .unwrap(),
    street_type_words: Regex::new(
        r"(?i)\b(ул\.?|улица|пр-т|проспект|пер\.?|переулок|ш\.?|шоссе|б-р|бульвар|наб\.?|набережная|пл\.?|площадь)\s*",
    )
    .unwrap(),
    house_prefix: Regex::new(r"(?i)\b(д\.?|дом)\s*(?=\d)").unwrap(),
    apartment_prefix: Regex::new(r"(?i)\s*,?\s*\b(кв\.?|квартира|офис|оф\.?)\s*\d+\b").unwrap(),
    corpus_suffix: Regex::new(r"(?i)\b(корпус|корп\.?|к\.?)\s*(\d+)").unwrap(),
    building_suffix: Regex::new(r"(?i)\b(строение|стр\.?)\s*(\d+)").unwrap(),
    whitespace: Regex::new(r"\s+").unwrap(),
    trailing_punct: Regex::new(r"[,.\s]+$").unwrap(),
});

/// Normalizes a raw Russian address string into a canonical form used as
/// a join key across listings, deals, and duplicate detection.
///
/// Deterministic and total: every input produces an output, even if it's
/// just the trimmed, lowercased original with no recognizable tokens.
pub fn normalize_address(raw: &str) -> String {
    let p = &*PATTERNS;

    let mut s = raw.trim().to_lowercase();
    s = p.city_region_prefix.replace(&s, "").to_string();
    s = p.street_type_words.replace_all(&s, "").to_string();
    s = p.house_prefix.replace_all(&s, "").to_string();
    s = p.apartment_prefix.replace_all(&s, "").to_string();
    s = p.corpus_suffix.replace_all(&s, "к$2").to_string();
    s = p.building_suffix.replace_all(&s, "с$2").to_string();
    s = p.whitespace.replace_all(&s, " ").to_string();
    s = p.trailing_punct.replace_all(&s, "").to_string();
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_city_and_street_type() {
        let n = normalize_address("г. Москва, ул. Тверская, д. 12");
        assert_eq!(n, "тверская, 12");
    }

    #[test]
    fn strips_apartment_and_collapses_corpus() {
        let n = normalize_address("Москва, пр-т Мира, д.5, корпус 2, кв. 34");
        assert_eq!(n, "мира, 5, к2");
    }

    #[test]
    fn is_total_for_garbage_input() {
        let n = normalize_address("   ");
        assert_eq!(n, "");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_address("г. Москва, ул. Ленина, д. 3, кв. 5");
        let twice = normalize_address(&once);
        assert_eq!(once, twice);
    }
}
