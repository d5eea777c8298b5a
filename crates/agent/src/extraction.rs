use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use freightdesk_core::domain::shipment::{ServiceLevel, ShipmentData};

pub const INDIA_CITIES: &[&str] = &[
    "Mumbai",
    "New Delhi",
    "Delhi",
    "Bangalore",
    "Bengaluru",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Pune",
    "Ahmedabad",
    "Jaipur",
    "Surat",
    "Lucknow",
    "Kanpur",
    "Nagpur",
    "Indore",
    "Bhopal",
    "Visakhapatnam",
    "Kochi",
    "Coimbatore",
    "Chandigarh",
    "Gurgaon",
    "Gurugram",
    "Noida",
    "Ludhiana",
    "Vadodara",
];

pub const INTERNATIONAL_PLACES: &[&str] = &[
    "Dubai",
    "Abu Dhabi",
    "Singapore",
    "London",
    "New York",
    "Hong Kong",
    "Shanghai",
    "Tokyo",
    "Sydney",
    "Frankfurt",
    "Hamburg",
    "Rotterdam",
    "Paris",
    "Los Angeles",
    "Toronto",
    "Colombo",
    "Dhaka",
    "Bangkok",
    "Kuala Lumpur",
    "Doha",
    "Riyadh",
    "United States",
    "United Kingdom",
    "United Arab Emirates",
    "USA",
    "UAE",
    "China",
    "Japan",
    "Germany",
    "France",
    "Australia",
    "Canada",
    "Netherlands",
    "Sri Lanka",
    "Bangladesh",
    "Saudi Arabia",
];

pub const CARGO_KEYWORDS: &[&str] = &[
    "electronics",
    "textile",
    "machinery",
    "furniture",
    "documents",
    "samples",
    "garments",
    "spare parts",
    "raw materials",
    "finished goods",
    "equipment",
    "tools",
    "boxes",
    "packages",
    "parcels",
    "goods",
    "shipment",
    "cargo",
    "product",
    "items",
    "materials",
];

const FILLER_WORDS: &[&str] = &["yes", "no", "ok", "sure", "thanks", "hello"];

const SERVICE_LEVEL_KEYWORDS: &[(ServiceLevel, &[&str])] = &[
    (ServiceLevel::Express, &["express", "fast", "urgent", "quick"]),
    (ServiceLevel::Economy, &["economy", "cheap", "budget", "slow"]),
    (ServiceLevel::Standard, &["standard", "normal", "regular"]),
];

const CARGO_CONTEXT_RADIUS: usize = 30;
const MAX_CARGO_CHARS: usize = 100;
const MIN_FREE_TEXT_CHARS: usize = 10;
const MAX_FREE_TEXT_CHARS: usize = 200;

const NUMBER: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

/// Source of known place names for location extraction.
pub trait Gazetteer: Send + Sync {
    /// Canonical name of the first known place mentioned in `text`.
    fn lookup(&self, text: &str) -> Option<String>;
}

/// Ordered tiers of place names, matched as case-insensitive substrings.
/// Earlier tiers win; inside a tier the first listed name found wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticGazetteer {
    tiers: Vec<Vec<String>>,
}

impl StaticGazetteer {
    pub fn new(tiers: Vec<Vec<String>>) -> Self {
        Self { tiers }
    }

    /// Appends `extra` as a lowest-priority tier.
    pub fn with_extra_locations(mut self, extra: Vec<String>) -> Self {
        let extra = extra
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        if !extra.is_empty() {
            self.tiers.push(extra);
        }
        self
    }

    pub fn place_count(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }
}

impl Default for StaticGazetteer {
    fn default() -> Self {
        Self::new(vec![owned(INDIA_CITIES), owned(INTERNATIONAL_PLACES)])
    }
}

impl Gazetteer for StaticGazetteer {
    fn lookup(&self, text: &str) -> Option<String> {
        let haystack = text.to_lowercase();
        self.tiers
            .iter()
            .flat_map(|tier| tier.iter())
            .find(|place| !place.is_empty() && haystack.contains(&place.to_lowercase()))
            .cloned()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SlotExtractor<G = StaticGazetteer> {
    gazetteer: G,
}

impl<G> SlotExtractor<G>
where
    G: Gazetteer,
{
    pub fn new(gazetteer: G) -> Self {
        Self { gazetteer }
    }

    /// Gazetteer first, then `from <Place>` and `to <Place>` phrasing.
    pub fn extract_location(&self, text: &str) -> Option<String> {
        self.gazetteer.lookup(text).or_else(|| extract_location_phrase(text))
    }

    /// Extracts only the slots `current` is still missing.
    ///
    /// Destination is looked for only when the origin was already known
    /// before this call, and a place equal to that origin is dropped. The
    /// result never contains a slot that is already set in `current`.
    pub fn smart_extract(&self, text: &str, current: &ShipmentData) -> ShipmentData {
        let mut found = ShipmentData::default();

        match &current.origin {
            None => found.origin = self.extract_location(text),
            Some(origin) if current.destination.is_none() => {
                found.destination = self
                    .extract_location(text)
                    .filter(|place| !place.eq_ignore_ascii_case(origin));
            }
            Some(_) => {}
        }

        if current.cargo.is_none() {
            found.cargo = extract_cargo(text);
        }

        if current.weight.is_none() {
            found.weight = extract_weight(text);
        }

        if current.service_level.is_none() {
            found.service_level = extract_service_level(text);
        }

        found
    }
}

pub fn extract_location_phrase(text: &str) -> Option<String> {
    first_capture(from_place_pattern(), text).or_else(|| first_capture(to_place_pattern(), text))
}

/// Normalized weight in kilograms, e.g. `"45 kg"`.
pub fn extract_weight(text: &str) -> Option<String> {
    extract_weight_with_unit(text).or_else(|| extract_bare_weight(text))
}

pub fn extract_weight_with_unit(text: &str) -> Option<String> {
    if let Some(kilograms) = first_capture(kilogram_pattern(), text) {
        return Some(format!("{} kg", kilograms.replace(',', "")));
    }

    if let Some(pounds) = first_capture(pound_pattern(), text).and_then(|raw| parse_number(&raw)) {
        return pounds.checked_mul(Decimal::new(453_592, 6)).map(format_whole_kg);
    }

    if let Some(tons) = first_capture(ton_pattern(), text).and_then(|raw| parse_number(&raw)) {
        return tons.checked_mul(Decimal::from(1_000)).map(format_whole_kg);
    }

    None
}

/// A unit-less number is read as kilograms when it falls in `1..=10000`.
pub fn extract_bare_weight(text: &str) -> Option<String> {
    let raw = first_capture(bare_number_pattern(), text)?.replace(',', "");
    let value = raw.parse::<Decimal>().ok()?;
    (value >= Decimal::ONE && value <= Decimal::from(10_000)).then(|| format!("{raw} kg"))
}

pub fn extract_cargo(text: &str) -> Option<String> {
    extract_cargo_keyword(text).or_else(|| extract_cargo_free_text(text))
}

/// Context around the first cargo keyword (in keyword-list order).
pub fn extract_cargo_keyword(text: &str) -> Option<String> {
    let lowered = text.to_ascii_lowercase();
    CARGO_KEYWORDS.iter().find_map(|keyword| {
        let start = lowered.find(keyword)?;
        let window = context_window(text, start, start + keyword.len(), CARGO_CONTEXT_RADIUS);
        Some(truncate_chars(window.trim(), MAX_CARGO_CHARS))
    })
}

pub fn extract_cargo_free_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let length = trimmed.chars().count();
    if !(MIN_FREE_TEXT_CHARS..=MAX_FREE_TEXT_CHARS).contains(&length) {
        return None;
    }
    if FILLER_WORDS.iter().any(|filler| trimmed.eq_ignore_ascii_case(filler)) {
        return None;
    }
    Some(truncate_chars(trimmed, MAX_CARGO_CHARS))
}

/// Express keywords beat economy keywords, which beat standard ones.
pub fn extract_service_level(text: &str) -> Option<ServiceLevel> {
    let lowered = text.to_lowercase();
    SERVICE_LEVEL_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(level, _)| *level)
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let mut from = start.saturating_sub(radius);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = end.saturating_add(radius).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from..to]
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

fn parse_number(raw: &str) -> Option<Decimal> {
    raw.replace(',', "").parse::<Decimal>().ok()
}

fn format_whole_kg(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{} kg", rounded.normalize())
}

fn first_capture(pattern: Option<&Regex>, text: &str) -> Option<String> {
    pattern?.captures(text)?.get(1).map(|matched| matched.as_str().to_string())
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: impl FnOnce() -> String) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(&pattern()).ok()).as_ref()
}

fn from_place_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || r"\b(?i:from)\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)?)".to_string())
}

fn to_place_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || r"\b(?i:to)\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)?)".to_string())
}

fn kilogram_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || format!(r"(?i)\b{NUMBER}\s*(?:kilograms?|kilos?|kgs?)\b"))
}

fn pound_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || format!(r"(?i)\b{NUMBER}\s*(?:pounds?|lbs?)\b"))
}

fn ton_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || format!(r"(?i)\b{NUMBER}\s*(?:tonnes?|tons?)\b"))
}

fn bare_number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&PATTERN, || format!(r"\b{NUMBER}\b"))
}

#[cfg(test)]
mod tests {
    use freightdesk_core::domain::shipment::{ServiceLevel, ShipmentData};

    use super::{
        extract_cargo, extract_cargo_keyword, extract_location_phrase, extract_service_level,
        extract_weight, Gazetteer, SlotExtractor, StaticGazetteer,
    };

    fn known_origin(origin: &str) -> ShipmentData {
        ShipmentData { origin: Some(origin.to_string()), ..ShipmentData::default() }
    }

    #[test]
    fn weight_conversions() {
        assert_eq!(extract_weight("100 lbs").as_deref(), Some("45 kg"));
        assert_eq!(extract_weight("2 tons").as_deref(), Some("2000 kg"));
        assert_eq!(extract_weight("75kg").as_deref(), Some("75 kg"));
        assert_eq!(extract_weight("50").as_deref(), Some("50 kg"));
        assert_eq!(extract_weight("50000"), None);
    }

    #[test]
    fn weight_units_and_rounding() {
        assert_eq!(extract_weight("around 100 kg").as_deref(), Some("100 kg"));
        assert_eq!(extract_weight("12.5 Kilograms total").as_deref(), Some("12.5 kg"));
        assert_eq!(extract_weight("about 1,200 kgs").as_deref(), Some("1200 kg"));
        assert_eq!(extract_weight("1 pound").as_deref(), Some("0 kg"));
        assert_eq!(extract_weight("11 lb").as_deref(), Some("5 kg"));
        assert_eq!(extract_weight("1.5 tonnes").as_deref(), Some("1500 kg"));
        assert_eq!(extract_weight("0.5"), None);
        assert_eq!(extract_weight("10000").as_deref(), Some("10000 kg"));
        assert_eq!(extract_weight("no numbers here"), None);
    }

    #[test]
    fn unit_rule_wins_over_bare_number() {
        assert_eq!(extract_weight("3 pallets weighing 200 lbs").as_deref(), Some("91 kg"));
    }

    #[test]
    fn gazetteer_prefers_india_tier_then_international() {
        let extractor = <SlotExtractor>::default();
        assert_eq!(extractor.extract_location("From Mumbai to Dubai").as_deref(), Some("Mumbai"));
        assert_eq!(extractor.extract_location("ship it to dubai").as_deref(), Some("Dubai"));
        assert_eq!(extractor.extract_location("pickup in new delhi").as_deref(), Some("New Delhi"));
    }

    #[test]
    fn gazetteer_matches_substrings() {
        let gazetteer = StaticGazetteer::default();
        assert_eq!(gazetteer.lookup("ship to NewDelhi").as_deref(), Some("Delhi"));
        assert_eq!(gazetteer.lookup("MUMBAIPORT dock 4").as_deref(), Some("Mumbai"));
        assert_eq!(gazetteer.lookup("nothing known here"), None);
    }

    #[test]
    fn phrase_fallback_prefers_from() {
        assert_eq!(
            extract_location_phrase("to Springfield from Little Rock").as_deref(),
            Some("Little Rock")
        );
        assert_eq!(extract_location_phrase("deliver to Nairobi").as_deref(), Some("Nairobi"));
        assert_eq!(extract_location_phrase("from somewhere"), None);
    }

    #[test]
    fn extra_locations_extend_the_gazetteer() {
        let gazetteer =
            StaticGazetteer::default().with_extra_locations(vec![" Kampala ".to_string()]);
        let extractor = SlotExtractor::new(gazetteer);
        assert_eq!(extractor.extract_location("kampala please").as_deref(), Some("Kampala"));
    }

    #[test]
    fn injected_gazetteer_is_used() {
        struct Fixed;
        impl Gazetteer for Fixed {
            fn lookup(&self, _text: &str) -> Option<String> {
                Some("Atlantis".to_string())
            }
        }

        let extractor = SlotExtractor::new(Fixed);
        assert_eq!(extractor.extract_location("anything").as_deref(), Some("Atlantis"));
    }

    #[test]
    fn cargo_keyword_returns_surrounding_context() {
        assert_eq!(
            extract_cargo("We are sending electronics to a retailer").as_deref(),
            Some("We are sending electronics to a retailer")
        );

        let long = "Hello team, this week we will be shipping forty cartons of textile rolls \
                    for our retail partner in the north region";
        let cargo = extract_cargo_keyword(long).expect("textile keyword");
        assert!(cargo.contains("textile"));
        assert!(cargo.chars().count() <= 30 + "textile".len() + 30);
        assert_eq!(cargo, cargo.trim());
    }

    #[test]
    fn cargo_free_text_respects_length_and_fillers() {
        assert_eq!(
            extract_cargo("Handmade ceramic vases").as_deref(),
            Some("Handmade ceramic vases")
        );
        assert_eq!(extract_cargo("ok"), None);
        assert_eq!(extract_cargo("short"), None);

        let rambling = "a".repeat(150);
        assert_eq!(extract_cargo(&rambling).map(|cargo| cargo.chars().count()), Some(100));
        assert_eq!(extract_cargo(&"b".repeat(201)), None);
    }

    #[test]
    fn service_level_bucket_order() {
        assert_eq!(extract_service_level("urgent please"), Some(ServiceLevel::Express));
        assert_eq!(extract_service_level("cheap but fast"), Some(ServiceLevel::Express));
        assert_eq!(extract_service_level("the budget option"), Some(ServiceLevel::Economy));
        assert_eq!(extract_service_level("Regular is fine"), Some(ServiceLevel::Standard));
        assert_eq!(extract_service_level("whatever is fine"), None);
    }

    #[test]
    fn destination_needs_previously_known_origin() {
        let extractor = <SlotExtractor>::default();

        let first = extractor.smart_extract("From Mumbai to Dubai", &ShipmentData::default());
        assert_eq!(first.origin.as_deref(), Some("Mumbai"));
        assert_eq!(first.destination, None);
        assert_eq!(first.cargo.as_deref(), Some("From Mumbai to Dubai"));

        let second = extractor.smart_extract("to Dubai", &known_origin("Mumbai"));
        assert_eq!(second.destination.as_deref(), Some("Dubai"));
        assert_eq!(second.origin, None);
    }

    #[test]
    fn destination_equal_to_origin_is_discarded() {
        let extractor = <SlotExtractor>::default();
        let found = extractor.smart_extract("mumbai again", &known_origin("Mumbai"));
        assert_eq!(found.destination, None);
    }

    #[test]
    fn origin_is_never_overwritten() {
        let extractor = <SlotExtractor>::default();
        let found = extractor.smart_extract("actually from Chennai", &known_origin("Mumbai"));
        assert_eq!(found.origin, None);
        assert_eq!(found.destination.as_deref(), Some("Chennai"));
    }

    #[test]
    fn only_missing_slots_are_returned() {
        let extractor = <SlotExtractor>::default();
        let current = ShipmentData {
            origin: Some("Pune".to_string()),
            destination: Some("London".to_string()),
            cargo: Some("machinery".to_string()),
            weight: Some("300 kg".to_string()),
            service_level: Some(ServiceLevel::Economy),
        };

        let found = extractor.smart_extract("urgent 500 kg of furniture to Paris", &current);
        assert_eq!(found, ShipmentData::default());
    }

    #[test]
    fn smart_extract_is_idempotent() {
        let extractor = <SlotExtractor>::default();
        let text = "From Mumbai to Dubai, 3 boxes of electronics by express";

        let mut data = ShipmentData::default();
        let first = extractor.smart_extract(text, &data);
        assert_eq!(first.origin.as_deref(), Some("Mumbai"));
        assert_eq!(first.weight.as_deref(), Some("3 kg"));
        assert_eq!(first.service_level, Some(ServiceLevel::Express));
        assert!(first.cargo.as_deref().is_some_and(|cargo| cargo.contains("electronics")));

        data.merge_missing(first);
        let second = extractor.smart_extract(text, &data);
        assert_eq!(second, ShipmentData::default());
    }

    #[test]
    fn free_text_cargo_is_kept_alongside_other_slots() {
        let extractor = <SlotExtractor>::default();
        let route = ShipmentData {
            origin: Some("Mumbai".to_string()),
            destination: Some("Dubai".to_string()),
            ..ShipmentData::default()
        };

        let found = extractor.smart_extract("Medical supplies, about 40 kg", &route);
        assert_eq!(found.cargo.as_deref(), Some("Medical supplies, about 40 kg"));
        assert_eq!(found.weight.as_deref(), Some("40 kg"));

        let found = extractor.smart_extract("Breakfast cereal cartons", &route);
        assert_eq!(found.cargo.as_deref(), Some("Breakfast cereal cartons"));
        assert_eq!(found.service_level, Some(ServiceLevel::Express));

        let found = extractor.smart_extract("Fragile glassware, express please", &route);
        assert_eq!(found.cargo.as_deref(), Some("Fragile glassware, express please"));
    }
}
