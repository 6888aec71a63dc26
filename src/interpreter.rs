//! Free-text query interpretation
//!
//! Pulls a place name and an [`Intent`] out of queries such as
//! "I'm going to go to Bangalore, let's plan my trip".

use crate::models::Intent;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Place name and intent derived from one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub place: String,
    pub intent: Intent,
}

// Tried in order; the first one yielding a non-empty place wins.
static PLACE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        regex(r"(?i)(?:i'm going to|i am going to|going to|visit|travel to|trip to|go to)\s+([^,.!?]+)"),
        regex(r"(?i)\b(?:in|at|to)\s+([^,.!?]+)"),
        regex(r"^([^,.!?]+)$"),
    ]
});

static LEADING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)^(?:the|a|an|go to|going to|travel to|visit|do in|do at|in|at|to)\s+")
});

static TRAILING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:^|\s+)(?:let's|lets|plan|my|trip|what|where|can|please)\b.*$")
});

static TRAILING_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)\s+(?:weather|forecast|temperature|attractions?|places|sights)\b.*$")
});

static WEATHER_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\b(?:weather|temperature|rain|forecast|hot|cold)\b"));

static PLACES_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)\b(?:places?|visit|see|attractions?|tourist|things to do)\b"));

static CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)\band\b|&|\+"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+"));

// Applied one after another, so "go to visit X" loses both verbs.
static CLEANUP_RULES: LazyLock<[Regex; 7]> = LazyLock::new(|| {
    [
        regex(r"(?i)^go to\s+"),
        regex(r"(?i)^visit\s+"),
        regex(r"(?i)^travel to\s+"),
        regex(r"(?i)\s+let's.*$"),
        regex(r"(?i)\s+please.*$"),
        regex(r"(?i)\s+what\b.*$"),
        regex(r"(?i)\s+where\b.*$"),
    ]
});

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern is valid")
}

/// Extract place and intent in one pass
#[must_use]
pub fn interpret(input: &str) -> Interpretation {
    Interpretation {
        place: extract_place(input),
        intent: detect_intent(input),
    }
}

/// Extract the place name from a travel query.
/// Falls back to the trimmed input when no pattern yields a name.
#[must_use]
pub fn extract_place(input: &str) -> String {
    let clean_input = input.trim();

    for pattern in PLACE_PATTERNS.iter() {
        let Some(captured) = pattern.captures(clean_input).and_then(|c| c.get(1)) else {
            continue;
        };

        let place = strip_fillers(captured.as_str());
        if !place.is_empty() {
            debug!(place = %place, input = %clean_input, "Extracted place");
            return place;
        }
    }

    debug!(input = %clean_input, "No pattern matched, using full input");
    clean_input.to_string()
}

fn strip_fillers(captured: &str) -> String {
    let mut place = captured.trim().to_string();

    loop {
        let stripped = LEADING_FILLER.replace(&place, "").trim_start().to_string();
        if stripped == place {
            break;
        }
        place = stripped;
    }

    let place = TRAILING_FILLER.replace(&place, "");
    let place = TRAILING_KEYWORDS.replace(&place, "");
    place.trim().to_string()
}

/// Detect whether the query asks for weather, places, or both.
/// Ambiguous queries default to [`Intent::Both`].
#[must_use]
pub fn detect_intent(input: &str) -> Intent {
    let weather = WEATHER_KEYWORDS.is_match(input);
    let places = PLACES_KEYWORDS.is_match(input);

    let intent = if CONJUNCTION.is_match(input) || (weather && places) {
        Intent::Both
    } else if weather {
        Intent::Weather
    } else if places {
        Intent::Places
    } else {
        Intent::Both
    };

    debug!(%intent, "Detected intent");
    intent
}

/// Normalize a place name right before it is sent to the geocoder
#[must_use]
pub fn clean_place_name(name: &str) -> String {
    let mut cleaned = WHITESPACE.replace_all(name, " ").trim().to_string();
    for rule in CLEANUP_RULES.iter() {
        cleaned = rule.replace(&cleaned, "").into_owned();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("I'm going to go to Bangalore, let's plan my trip", "Bangalore")]
    #[case("What's the weather in Paris?", "Paris")]
    #[case("Show me places to visit in Tokyo", "Tokyo")]
    #[case("London weather and attractions", "London")]
    #[case("Trip to the Grand Canyon please", "Grand Canyon")]
    #[case("I am going to Lisbon. Where should I eat?", "Lisbon")]
    #[case("visit an Old Town", "Old Town")]
    #[case("  Kyoto  ", "Kyoto")]
    #[case("Things to do in Rome", "Rome")]
    #[case("What to do at Lake Bled?", "Lake Bled")]
    #[case("visit Do Son", "Do Son")]
    fn test_extract_place(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extract_place(input), expected);
    }

    #[test]
    fn test_extract_place_falls_back_to_trimmed_input() {
        assert_eq!(extract_place("  ?!  "), "?!");
    }

    #[test]
    fn test_extract_place_skips_patterns_that_strip_to_nothing() {
        // the trigger phrase captures only filler, the preposition finds the city
        assert_eq!(extract_place("visit my, in Oslo"), "Oslo");
    }

    #[test]
    fn test_trailing_filler_needs_whole_word() {
        assert_eq!(extract_place("visit Old Mysore"), "Old Mysore");
    }

    #[rstest]
    #[case("What's the weather in Paris?", Intent::Weather)]
    #[case("Is it going to rain in Oslo", Intent::Weather)]
    #[case("Show me places to visit in Tokyo", Intent::Places)]
    #[case("tourist attractions near Rome", Intent::Places)]
    #[case("London weather and attractions", Intent::Both)]
    #[case("Paris & Lyon", Intent::Both)]
    #[case("Hot places in Madrid", Intent::Both)]
    #[case("Bangalore", Intent::Both)]
    fn test_detect_intent(#[case] input: &str, #[case] expected: Intent) {
        assert_eq!(detect_intent(input), expected);
    }

    #[rstest]
    #[case("go to   Paris", "Paris")]
    #[case("visit Rome please", "Rome")]
    #[case("travel to Oslo let's go", "Oslo")]
    #[case("Berlin what to do", "Berlin")]
    #[case("Madrid where to eat", "Madrid")]
    #[case("go to visit Vienna", "Vienna")]
    #[case("Whatley", "Whatley")]
    fn test_clean_place_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_place_name(input), expected);
    }

    #[test]
    fn test_interpret_bundles_place_and_intent() {
        let interpretation = interpret("What's the weather in Paris?");
        assert_eq!(interpretation.place, "Paris");
        assert_eq!(interpretation.intent, Intent::Weather);
    }

    proptest! {
        #[test]
        fn weather_and_places_keywords_always_mean_both(
            prefix in "[a-z ]{0,12}",
            middle in "[a-z ]{0,12}",
            weather in prop::sample::select(vec!["weather", "temperature", "rain", "forecast", "hot", "cold"]),
            places in prop::sample::select(vec!["place", "places", "visit", "see", "attraction", "attractions", "tourist", "things to do"]),
            swap in any::<bool>(),
        ) {
            let (first, second) = if swap { (places, weather) } else { (weather, places) };
            let input = format!("{prefix} {first} {middle} {second}");
            prop_assert_eq!(detect_intent(&input), Intent::Both);
        }
    }
}
