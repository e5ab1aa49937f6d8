//! Text normalization, fuzzy matching and language detection.

pub mod fuzzy;
pub mod language;
pub mod normalize;

pub use fuzzy::{
    canonical_hotel_text, fuzzy_match_hotel_name, fuzzy_match_term, match_hotel_name,
    misspelled_generic_nouns, HotelMatch,
};
pub use language::detect_language;
pub use normalize::{contains_phrase, normalize, tokens};
