/// Lower-case and transliterate diacritics for matching. Never used for display.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_lowercase) {
        match ch {
            'á' | 'à' | 'â' | 'ä' | 'å' | 'ã' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' | 'ø' | 'õ' => out.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ñ' => out.push('n'),
            'ç' => out.push('c'),
            'þ' => out.push_str("th"),
            'æ' => out.push_str("ae"),
            'ð' => out.push('d'),
            'ß' => out.push_str("ss"),
            _ => out.push(ch),
        }
    }
    out
}

/// Alphanumeric words of an already-normalized string.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Whole-word (or whole-phrase) containment on normalized text.
pub fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let bytes = normalized.as_bytes();
    let mut start = 0;
    while let Some(pos) = normalized[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();
        let left_ok = begin == 0 || !is_word_byte(bytes[begin - 1]);
        let right_ok = end == normalized.len() || !is_word_byte(bytes[end]);
        if left_ok && right_ok {
            return true;
        }
        start = begin + 1;
        while !normalized.is_char_boundary(start) {
            start += 1;
        }
    }
    false
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_diacritics() {
        assert_eq!(normalize("Reykjavík"), normalize("REYKJAVIK"));
        assert_eq!(normalize("Þingholt"), "thingholt");
        assert_eq!(normalize("Lækjargata"), "laekjargata");
        assert_eq!(normalize("Hótel Örkin"), "hotel orkin");
        assert_eq!(normalize("Miðbakki"), "midbakki");
    }

    #[test]
    fn test_tokens() {
        let t: Vec<&str> = tokens("heida's home, 101").collect();
        assert_eq!(t, vec!["heida", "s", "home", "101"]);
    }

    #[test]
    fn test_contains_phrase_respects_word_boundaries() {
        assert!(contains_phrase("flights to the us please", "us"));
        assert!(!contains_phrase("which bus should i take", "us"));
        assert!(contains_phrase("near the pond", "the pond"));
        assert!(!contains_phrase("keflavik", "kef"));
    }
}
