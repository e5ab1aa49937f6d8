//! Icelandic / English detection for reply language selection.

use crate::types::Language;

const ICELANDIC_TERMS: &[&str] = &[
    "gullni hringurinn", "nordurljos", "blaa lonid", "sudurstrondin", "saekja", "saeki",
    "skutla", "brottfor", "leidsogumadur", "ruta", "bidstod", "aaetlun", "skodunarferd",
    "ferdalag", "bokun", "afboka", "breyta", "flugvoll", "farangur", "midi", "verd",
];

const ICELANDIC_STARTERS: &[&str] = &[
    "hvenaer", "hvar", "hver", "hvad", "hvernig", "af hverju", "getid", "ma eg", "er haegt",
    "vildi", "vaeri", "takk", "thakka", "hae", "hallo", "sael",
];

/// Letters specific to Icelandic. Accented vowels are left out: English speakers
/// type them in place names ("Keflavík").
const ICELANDIC_LETTERS: &[char] = &['þ', 'æ', 'ð'];

pub fn detect_language(message: &str) -> Language {
    let lower = message.to_lowercase();
    if lower.chars().any(|c| ICELANDIC_LETTERS.contains(&c)) {
        return Language::Icelandic;
    }
    let normalized = super::normalize(&lower);
    if ICELANDIC_TERMS
        .iter()
        .any(|term| super::contains_phrase(&normalized, term))
    {
        return Language::Icelandic;
    }
    let trimmed = normalized.trim_start();
    if ICELANDIC_STARTERS.iter().any(|starter| {
        trimmed.starts_with(starter)
            && trimmed[starter.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    }) {
        return Language::Icelandic;
    }
    Language::English
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icelandic_letters() {
        assert_eq!(detect_language("Hvenær fer rútan?"), Language::Icelandic);
    }

    #[test]
    fn test_icelandic_without_accents() {
        assert_eq!(detect_language("hvar er bidstod 3"), Language::Icelandic);
        assert_eq!(detect_language("takk fyrir"), Language::Icelandic);
    }

    #[test]
    fn test_english() {
        assert_eq!(detect_language("When does the bus leave?"), Language::English);
        assert_eq!(detect_language("whatever works"), Language::English);
        assert_eq!(detect_language("Hello"), Language::English);
        assert_eq!(detect_language("Bus from Keflavík to Reykjavík?"), Language::English);
    }
}
