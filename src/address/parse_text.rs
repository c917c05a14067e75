//! Free-text property description parsing, folded back in from
//! `geocode_helper.py::parse_property_text` (§4.1 supplement). Extracts
//! rooms/area/floor/total_floors tokens from a Russian description such as
//! "2-комнатная квартира, 53.6 м2, 15 этаж, 17 этажей".

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialPropertyQuery {
    pub rooms: Option<i32>,
    pub area_total: Option<f64>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
}

static DIGIT_ROOMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*-?\s*комнатн").unwrap());
static STUDIO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)студи").unwrap());
static WORD_ROOMS: Lazy<[(Regex, i32); 5]> = Lazy::new(|| {
    [
        (Regex::new(r"(?i)однокомнатн").unwrap(), 1),
        (Regex::new(r"(?i)двухкомнатн").unwrap(), 2),
        (Regex::new(r"(?i)трехкомнатн|трёхкомнатн").unwrap(), 3),
        (Regex::new(r"(?i)четырехкомнатн|четырёхкомнатн").unwrap(), 4),
        (Regex::new(r"(?i)пятикомнатн").unwrap(), 5),
    ]
});
static AREA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*м²?2?\b").unwrap());
static FLOOR_OF_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:-?й)?\s*этаж(?:е|а)?\s*(?:из|/)\s*(\d+)").unwrap());
static FLOOR_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*(?:-?й)?\s*этаж\b").unwrap());

/// Best-effort: never errors, only returns what it could confidently
/// extract. Rooms resolution order mirrors the original's regex list —
/// digit form, then word form, then the studio special case (0 rooms).
pub fn extract_property_text(text: &str) -> PartialPropertyQuery {
    let lower = text.to_lowercase();

    let rooms = if let Some(caps) = DIGIT_ROOMS.captures(&lower) {
        caps.get(1).and_then(|m| m.as_str().parse().ok())
    } else if STUDIO.is_match(&lower) {
        Some(0)
    } else {
        WORD_ROOMS.iter().find_map(|(re, n)| re.is_match(&lower).then_some(*n))
    };

    let area_total = AREA
        .captures(&lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse().ok());

    let (floor, total_floors) = if let Some(caps) = FLOOR_OF_TOTAL.captures(&lower) {
        (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        )
    } else if let Some(caps) = FLOOR_ONLY.captures(&lower) {
        (caps.get(1).and_then(|m| m.as_str().parse().ok()), None)
    } else {
        (None, None)
    };

    PartialPropertyQuery {
        rooms,
        area_total,
        floor,
        total_floors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_digit_rooms_area_and_floor_of_total() {
        let q = extract_property_text("2-комнатная квартира, 53.6 м2, 15 этаж из 17");
        assert_eq!(q.rooms, Some(2));
        assert_eq!(q.area_total, Some(53.6));
        assert_eq!(q.floor, Some(15));
        assert_eq!(q.total_floors, Some(17));
    }

    #[test]
    fn extracts_studio_as_zero_rooms() {
        let q = extract_property_text("Продается студия, 24 м2");
        assert_eq!(q.rooms, Some(0));
        assert_eq!(q.area_total, Some(24.0));
    }

    #[test]
    fn extracts_word_form_rooms() {
        let q = extract_property_text("Трехкомнатная квартира 70 м2");
        assert_eq!(q.rooms, Some(3));
    }

    #[test]
    fn missing_tokens_stay_none() {
        let q = extract_property_text("квартира в хорошем состоянии");
        assert_eq!(q, PartialPropertyQuery::default());
    }
}
