//! Fuzzy term and hotel-name matching.
//!
//! False positives are tolerated here; the location resolver ranks and
//! short-circuits, and the LLM layer asks a follow-up when a binding is off.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::normalize::{contains_phrase, normalize, tokens};

/// Canonical term → known misspellings and variants (all normalized).
const TERM_VARIANTS: &[(&str, &[&str])] = &[
    ("keflavik", &["kef", "keflvik", "keflavic", "keflavick"]),
    ("reykjavik", &["reyk", "rvk", "reykjavic", "reykavik"]),
    (
        "flybus plus",
        &["flybus+", "flybus +", "fly bus plus", "fly bus+", "flybusplus"],
    ),
    ("flybus", &["fly bus", "fly-bus", "airport bus"]),
    ("terminal", &["termial", "terminl"]),
    ("schedule", &["timetable", "time table", "times", "schedual", "shedule"]),
    ("luggage", &["baggage", "bags", "suitcase", "lugage", "luggege"]),
    ("bus stop", &["busstop", "bus-stop"]),
];

/// Does `text` mention `canonical_term` or one of its known variants, as whole words?
pub fn fuzzy_match_term(text: &str, canonical_term: &str) -> bool {
    let text = normalize(text);
    let canonical = normalize(canonical_term);
    if contains_phrase(&text, &canonical) {
        return true;
    }
    TERM_VARIANTS
        .iter()
        .filter(|(term, _)| *term == canonical)
        .flat_map(|(_, variants)| variants.iter())
        .any(|variant| contains_phrase(&text, variant))
}

static CHAIN_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bfoss\s*hotel\b|\bfosshotal\b", "fosshotel"),
        (r"\bcent(?:er|re|ral)\s*hotel\b", "centerhotel"),
        (r"\bguest\s+house\b|\bguesth\b\.?|\bghouse\b", "guesthouse"),
        (r"\bapts?\b\.?|\bapartment\b", "apartments"),
    ]
    .into_iter()
    .map(|(pattern, canonical)| {
        (
            Regex::new(pattern).expect("hotel chain regex is valid"),
            canonical,
        )
    })
    .collect()
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Words that never identify a particular property on their own.
const GENERIC_WORDS: &[&str] = &[
    "hotel", "hotels", "hostel", "guesthouse", "apartments", "suites", "studios", "rooms",
    "reykjavik", "iceland", "city", "centre", "center", "central", "downtown", "harbor",
    "harbour", "airport", "centerhotel", "fosshotel", "the", "and", "with", "for", "stay",
    "staying", "near", "from",
];

/// Normalize and rewrite chain abbreviations ("guest house" → "guesthouse").
pub fn canonical_hotel_text(text: &str) -> String {
    let mut canonical = normalize(text);
    for (pattern, replacement) in CHAIN_PATTERNS.iter() {
        canonical = pattern.replace_all(&canonical, *replacement).into_owned();
    }
    WHITESPACE_RE.replace_all(canonical.trim(), " ").into_owned()
}

fn is_generic(token: &str) -> bool {
    GENERIC_WORDS.contains(&token)
}

fn is_numeric(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
}

fn is_distinctive(token: &str) -> bool {
    token.len() >= 3 && !is_numeric(token) && !is_generic(token)
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum HotelMatch {
    /// A fraction (>= 0.5) of the name's distinctive words were found.
    Partial(f32),
    /// The full name, a specific fragment of it, or every distinctive word was found.
    Full,
}

/// Grade how well a free-text search mentions `hotel_name`.
pub fn match_hotel_name(search: &str, hotel_name: &str) -> Option<HotelMatch> {
    let search = canonical_hotel_text(search);
    if search.is_empty() {
        return None;
    }
    let hotel = canonical_hotel_text(hotel_name);
    if contains_phrase(&search, &hotel) {
        return Some(HotelMatch::Full);
    }
    let search_tokens: HashSet<&str> = tokens(&search).collect();

    // A fragment of the name counts only if it carries a word of the name part,
    // so a bare street ("laugavegur") does not pick one of many addresses.
    if contains_phrase(&hotel, &search) {
        let name_part = hotel_name.split(['-', '/', '|']).next().unwrap_or(hotel_name);
        let name_part = canonical_hotel_text(name_part);
        if tokens(&name_part)
            .filter(|t| is_distinctive(t))
            .any(|t| search_tokens.contains(t))
        {
            return Some(HotelMatch::Full);
        }
    }

    let mut best: Option<HotelMatch> = None;
    for (index, segment) in hotel_name.split(['-', '/', '|']).enumerate() {
        let segment = canonical_hotel_text(segment);
        let words: Vec<&str> = tokens(&segment).filter(|t| is_distinctive(t)).collect();
        if words.is_empty() {
            continue;
        }
        // Address segments ("Laugavegur 74") must match their house numbers too.
        if index > 0 {
            let numbers_ok = tokens(&segment)
                .filter(|t| is_numeric(t))
                .all(|n| search_tokens.contains(n));
            if !numbers_ok {
                continue;
            }
        }
        let found: Vec<&&str> = words.iter().filter(|w| search_tokens.contains(**w)).collect();
        if found.len() == words.len() {
            return Some(HotelMatch::Full);
        }
        let coverage = found.len() as f32 / words.len() as f32;
        if coverage >= 0.5 && found.iter().any(|w| w.len() >= 4) {
            let candidate = HotelMatch::Partial(coverage);
            if best.map_or(true, |b| candidate > b) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Containment plus chain-abbreviation tolerance.
pub fn fuzzy_match_hotel_name(search_term: &str, hotel_name: &str) -> bool {
    match_hotel_name(search_term, hotel_name).is_some()
}

/// Misspellings of the generic accommodation nouns → the noun they stand for.
const NOUN_MISSPELLINGS: &[(&str, &[&str])] = &[
    ("hotel", &["hotl", "htl", "hotell"]),
    ("guesthouse", &["ghouse", "gesthus", "gestahus", "guestouse"]),
    ("hostel", &["hostl", "hstel", "farfuglaheimili"]),
    ("apartment", &["apt", "apts", "ibud", "apartmnt"]),
];

/// Generic nouns the query misspells, for the suggestion pass.
pub fn misspelled_generic_nouns(query: &str) -> Vec<&'static str> {
    let normalized = normalize(query);
    let words: HashSet<&str> = tokens(&normalized).collect();
    NOUN_MISSPELLINGS
        .iter()
        .filter(|(_, variants)| variants.iter().any(|v| words.contains(v)))
        .map(|(noun, _)| *noun)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_match_term_variants() {
        assert!(fuzzy_match_term("Bus from KEF please", "keflavik"));
        assert!(fuzzy_match_term("is flybus+ worth it", "flybus plus"));
        assert!(fuzzy_match_term("Where is the termial", "terminal"));
        assert!(fuzzy_match_term("Keflavík airport", "keflavik"));
        assert!(!fuzzy_match_term("downtown", "keflavik"));
        assert!(!fuzzy_match_term("cabbages and kefir", "luggage"));
        assert!(!fuzzy_match_term("cabbages and kefir", "keflavik"));
    }

    #[test]
    fn test_chain_abbreviations() {
        assert!(fuzzy_match_hotel_name("Centre Hotel Plaza", "Centerhotel Plaza"));
        assert!(fuzzy_match_hotel_name("domus guest house", "Domus Guesthouse"));
        assert!(fuzzy_match_hotel_name("rey apts", "Rey Apartments"));
        assert!(fuzzy_match_hotel_name("foss hotel lind", "Fosshótel Lind"));
    }

    #[test]
    fn test_full_name_inside_longer_query() {
        assert_eq!(
            match_hotel_name("I'm staying at Hotel Borg tonight", "Hotel Borg"),
            Some(HotelMatch::Full)
        );
        assert_eq!(
            match_hotel_name("we are at kex", "KEX Hostel"),
            Some(HotelMatch::Full)
        );
    }

    #[test]
    fn test_generic_words_do_not_match() {
        assert!(!fuzzy_match_hotel_name("hotel", "Hotel Borg"));
        assert!(!fuzzy_match_hotel_name("downtown", "Downtown Guesthouse"));
        assert!(!fuzzy_match_hotel_name("ok", "OK Hotel"));
    }

    #[test]
    fn test_names_do_not_match_inside_words() {
        assert_eq!(match_hotel_name("Can I book hotel pickup?", "OK Hotel"), None);
        assert_eq!(match_hotel_name("a thousand hotel rooms", "Sand Hotel"), None);
        assert_eq!(
            match_hotel_name("is the ok hotel close to a stop", "OK Hotel"),
            Some(HotelMatch::Full)
        );
    }

    #[test]
    fn test_address_segment_needs_house_number() {
        assert!(!fuzzy_match_hotel_name("laugavegur", "Apartment K - Laugavegur 74"));
        assert!(fuzzy_match_hotel_name("laugavegur 74", "Apartment K - Laugavegur 74"));
    }

    #[test]
    fn test_partial_match_ranks_below_full() {
        let partial = match_hotel_name("staying at the hilton", "Hilton Reykjavík Nordica");
        assert!(matches!(partial, Some(HotelMatch::Partial(_))));
        assert!(match_hotel_name("black tower", "Black Pearl") < match_hotel_name("black tower", "Black Tower"));
    }

    #[test]
    fn test_misspelled_nouns() {
        assert_eq!(misspelled_generic_nouns("cheap hotl near harpa"), vec!["hotel"]);
        assert_eq!(misspelled_generic_nouns("a ghouse"), vec!["guesthouse"]);
        assert!(misspelled_generic_nouns("hotel borg").is_empty());
    }
}
