//! Location resolver: free text → doorstep hotel, bus stop, or area.
//!
//! Passes run in priority order and the first confident hit short-circuits:
//! doorstep hotel, stop number, landmark / stop name, hotel at a stop, best
//! partial hotel match, area, then misspelling suggestions.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::facts::{
    AreaFact, BusStopFact, DirectPickupFact, FactEntry, HotelLocationFact, LocationFact,
    StopMatchSource,
};
use crate::knowledge::locations::walking_minutes;
use crate::knowledge::{BusStop, Gazetteer};
use crate::text::{contains_phrase, match_hotel_name, misspelled_generic_nouns, normalize, HotelMatch};

static STOP_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:bus\s*)?stop\s*(?:no\.?|number|nr\.?|#)?\s*(\d{1,2})\b")
        .expect("stop number regex is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationMatch {
    DirectPickup(DirectPickupFact),
    BusStop(BusStopFact),
    Hotel(HotelLocationFact),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationResolution {
    pub exact_matches: Vec<LocationMatch>,
    pub area_matches: Vec<AreaFact>,
    pub suggestions: Vec<String>,
}

impl LocationResolution {
    pub fn is_empty(&self) -> bool {
        self.exact_matches.is_empty() && self.area_matches.is_empty() && self.suggestions.is_empty()
    }

    /// Fact entries for this resolution: one per exact match, plus one
    /// `location` entry carrying areas and suggestions when there are any.
    pub fn into_facts(self, gazetteer: &Gazetteer) -> Vec<FactEntry> {
        let mut facts: Vec<FactEntry> = self
            .exact_matches
            .into_iter()
            .map(|m| match m {
                LocationMatch::DirectPickup(f) => FactEntry::DirectPickup(f),
                LocationMatch::BusStop(f) => FactEntry::BusStop(f),
                LocationMatch::Hotel(f) => FactEntry::HotelLocation(f),
            })
            .collect();
        if !self.area_matches.is_empty() || !self.suggestions.is_empty() {
            facts.push(FactEntry::Location(LocationFact {
                areas: self.area_matches,
                suggestions: self.suggestions,
                pickup_window: gazetteer.guidance.pickup_window.clone(),
                all_stops_map: gazetteer.guidance.all_stops_map.clone(),
                contact: gazetteer.guidance.contact.clone(),
            }));
        }
        facts
    }

    fn exact(m: LocationMatch) -> Self {
        Self {
            exact_matches: vec![m],
            ..Self::default()
        }
    }
}

fn score(m: HotelMatch) -> f32 {
    match m {
        HotelMatch::Full => 1.0,
        HotelMatch::Partial(coverage) => coverage,
    }
}

pub fn stop_fact(gazetteer: &Gazetteer, stop: &BusStop, via: StopMatchSource) -> BusStopFact {
    let distance = gazetteer.distance_to_centre_km(stop);
    BusStopFact {
        number: stop.number,
        name: stop.name.clone(),
        coordinates: stop.coordinates,
        map_link: stop.map_link(),
        area: stop.area.clone(),
        serviced_hotels: stop.serviced_hotels.clone(),
        notes: stop.notes.clone(),
        distance_from_centre_km: (distance * 100.0).round() / 100.0,
        walking_minutes_from_centre: walking_minutes(distance),
        matched_via: via,
    }
}

fn direct_fact(hotel: &str, area: &str, m: HotelMatch) -> LocationMatch {
    LocationMatch::DirectPickup(DirectPickupFact {
        hotel: hotel.to_string(),
        area: area.to_string(),
        pickup_type: "direct_doorstep".into(),
        skip_map_link: true,
        match_score: score(m),
        pickup_instructions: format!(
            "Please be ready outside {} 30 minutes before your scheduled departure time.",
            hotel
        ),
    })
}

fn hotel_fact(gazetteer: &Gazetteer, hotel: &str, stop: &BusStop, m: HotelMatch) -> LocationMatch {
    LocationMatch::Hotel(HotelLocationFact {
        hotel: hotel.to_string(),
        bus_stop: stop_fact(gazetteer, stop, StopMatchSource::Hotel),
        match_score: score(m),
        pickup_instructions: format!(
            "Please be ready at bus stop {} ({}) 30 minutes before your scheduled departure time.",
            stop.number, stop.name
        ),
    })
}

/// Resolve a free-text location reference against the gazetteer.
pub fn resolve_location(
    raw_query: &str,
    gazetteer: &Gazetteer,
    max_suggestions: usize,
) -> LocationResolution {
    let normalized = normalize(raw_query);

    // 1. Doorstep hotels.
    for hotel in &gazetteer.direct_pickup {
        if match_hotel_name(raw_query, &hotel.name) == Some(HotelMatch::Full) {
            tracing::debug!(hotel = %hotel.name, "[LocationResolver] Doorstep hotel");
            return LocationResolution::exact(direct_fact(&hotel.name, &hotel.area, HotelMatch::Full));
        }
    }

    // 2. Explicit stop number.
    if let Some(stop) = STOP_NUMBER_RE
        .captures(&normalized)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .and_then(|n| gazetteer.stop(n))
    {
        tracing::debug!(stop = stop.number, "[LocationResolver] Stop number");
        return LocationResolution::exact(LocationMatch::BusStop(stop_fact(
            gazetteer,
            stop,
            StopMatchSource::StopNumber,
        )));
    }

    // 3. Landmarks, then stop names.
    if let Some(stop) = gazetteer
        .landmarks
        .iter()
        .find(|l| contains_phrase(&normalized, &l.alias))
        .and_then(|l| gazetteer.stop(l.stop))
    {
        return LocationResolution::exact(LocationMatch::BusStop(stop_fact(
            gazetteer,
            stop,
            StopMatchSource::Landmark,
        )));
    }
    if let Some(stop) = gazetteer.stops.iter().find(|stop| {
        stop.name_segments()
            .iter()
            .any(|segment| contains_phrase(&normalized, segment))
    }) {
        return LocationResolution::exact(LocationMatch::BusStop(stop_fact(
            gazetteer,
            stop,
            StopMatchSource::StopName,
        )));
    }

    // 4. Hotels served from a stop; first stop in gazetteer order wins.
    let mut best_partial: Option<(f32, LocationMatch)> = None;
    for stop in &gazetteer.stops {
        for hotel in &stop.serviced_hotels {
            match match_hotel_name(raw_query, hotel) {
                Some(HotelMatch::Full) => {
                    tracing::debug!(hotel = %hotel, stop = stop.number, "[LocationResolver] Hotel at stop");
                    return LocationResolution::exact(hotel_fact(gazetteer, hotel, stop, HotelMatch::Full));
                }
                Some(m @ HotelMatch::Partial(coverage)) => {
                    if best_partial.as_ref().map_or(true, |(best, _)| coverage > *best) {
                        best_partial = Some((coverage, hotel_fact(gazetteer, hotel, stop, m)));
                    }
                }
                None => {}
            }
        }
    }

    // 5. Best partial match across doorstep and stop hotels.
    for hotel in &gazetteer.direct_pickup {
        if let Some(m @ HotelMatch::Partial(coverage)) = match_hotel_name(raw_query, &hotel.name) {
            if best_partial.as_ref().map_or(true, |(best, _)| coverage > *best) {
                best_partial = Some((coverage, direct_fact(&hotel.name, &hotel.area, m)));
            }
        }
    }
    if let Some((coverage, m)) = best_partial {
        tracing::debug!(coverage, "[LocationResolver] Partial hotel match");
        return LocationResolution::exact(m);
    }

    // 6. Areas.
    let area_matches: Vec<AreaFact> = gazetteer
        .areas
        .iter()
        .filter(|area| {
            contains_phrase(&normalized, &normalize(&area.name))
                || area.aliases.iter().any(|alias| contains_phrase(&normalized, alias))
        })
        .map(|area| AreaFact {
            area: area.clone(),
            stops: gazetteer
                .stops_in_area(&area.id)
                .map(|stop| stop_fact(gazetteer, stop, StopMatchSource::Area))
                .collect(),
        })
        .collect();
    if !area_matches.is_empty() {
        return LocationResolution {
            area_matches,
            ..LocationResolution::default()
        };
    }

    // 7. Suggestions for misspelled generic nouns ("hotl", "ghouse").
    let mut suggestions: Vec<String> = Vec::new();
    for noun in misspelled_generic_nouns(raw_query) {
        let hotels = gazetteer
            .stops
            .iter()
            .flat_map(|stop| stop.serviced_hotels.iter())
            .chain(gazetteer.direct_pickup.iter().map(|h| &h.name));
        for hotel in hotels {
            if suggestions.len() >= max_suggestions {
                break;
            }
            if normalize(hotel).contains(noun) && !suggestions.contains(hotel) {
                suggestions.push(hotel.clone());
            }
        }
    }
    LocationResolution {
        suggestions,
        ..LocationResolution::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::FactStore;

    fn resolve(query: &str) -> LocationResolution {
        let store = FactStore::load().unwrap();
        resolve_location(query, &store.locations, 8)
    }

    fn only_match(resolution: &LocationResolution) -> &LocationMatch {
        assert_eq!(resolution.exact_matches.len(), 1, "{:?}", resolution);
        &resolution.exact_matches[0]
    }

    #[test]
    fn test_hotel_borg_is_at_stop_3() {
        let resolution = resolve("I'm staying at Hotel Borg");
        match only_match(&resolution) {
            LocationMatch::Hotel(fact) => {
                assert_eq!(fact.bus_stop.number, 3);
                assert_eq!(fact.bus_stop.name, "Lækjargata");
                assert!(fact.bus_stop.map_link.starts_with("https://www.google.com/maps/@64.14678"));
                assert!(fact.bus_stop.map_link.ends_with(",18z"));
                assert_eq!(fact.match_score, 1.0);
            }
            other => panic!("expected hotel at stop, got {:?}", other),
        }
    }

    #[test]
    fn test_kex_is_doorstep_without_stop() {
        let resolution = resolve("KEX Hostel");
        match only_match(&resolution) {
            LocationMatch::DirectPickup(fact) => {
                assert!(fact.skip_map_link);
                assert_eq!(fact.pickup_type, "direct_doorstep");
            }
            other => panic!("expected doorstep pickup, got {:?}", other),
        }
        let json = serde_json::to_value(&resolution).unwrap();
        let matched = &json["exact_matches"][0];
        assert_eq!(matched["type"], "direct_pickup");
        assert!(matched.get("map_link").is_none());
        assert!(matched.get("number").is_none());
        assert!(matched.get("bus_stop").is_none());
    }

    #[test]
    fn test_stop_number() {
        let resolution = resolve("where is bus stop 8?");
        match only_match(&resolution) {
            LocationMatch::BusStop(fact) => {
                assert_eq!(fact.number, 8);
                assert_eq!(fact.matched_via, StopMatchSource::StopNumber);
            }
            other => panic!("expected bus stop, got {:?}", other),
        }
        // Unknown stop numbers fall through.
        assert!(resolve("stop 7").is_empty());
    }

    #[test]
    fn test_landmark_and_stop_name() {
        match only_match(&resolve("near Hallgrímskirkja")) {
            LocationMatch::BusStop(fact) => {
                assert_eq!(fact.number, 8);
                assert_eq!(fact.matched_via, StopMatchSource::Landmark);
            }
            other => panic!("expected landmark stop, got {:?}", other),
        }
        match only_match(&resolve("Is there a stop at Snorrabraut")) {
            LocationMatch::BusStop(fact) => {
                assert_eq!(fact.number, 9);
                assert_eq!(fact.matched_via, StopMatchSource::StopName);
            }
            other => panic!("expected named stop, got {:?}", other),
        }
    }

    #[test]
    fn test_hotel_names_need_word_boundaries() {
        for (query, hotel) in [("Can I book hotel pickup?", "OK Hotel"), ("a thousand hotel rooms", "Sand Hotel")] {
            let resolution = resolve(query);
            assert!(
                !resolution
                    .exact_matches
                    .iter()
                    .any(|m| matches!(m, LocationMatch::Hotel(f) if f.hotel == hotel)),
                "{query} bound to {hotel}"
            );
        }
    }

    #[test]
    fn test_duplicate_hotel_resolves_to_first_stop() {
        match only_match(&resolve("Ocean Comfort Apartments")) {
            LocationMatch::Hotel(fact) => assert_eq!(fact.bus_stop.number, 3),
            other => panic!("expected hotel at stop, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_doorstep_match() {
        match only_match(&resolve("we booked the hilton")) {
            LocationMatch::DirectPickup(fact) => {
                assert_eq!(fact.hotel, "Hilton Reykjavík Nordica");
                assert!(fact.match_score < 1.0);
            }
            other => panic!("expected doorstep pickup, got {:?}", other),
        }
    }

    #[test]
    fn test_area_lists_its_stops() {
        let resolution = resolve("somewhere in Hafnarfjörður");
        assert!(resolution.exact_matches.is_empty());
        assert_eq!(resolution.area_matches.len(), 1);
        assert_eq!(resolution.area_matches[0].area.id, "hafnarfjordur");
    }

    #[test]
    fn test_misspelling_suggestions() {
        let resolution = resolve("a cheap ghouse");
        assert!(resolution.exact_matches.is_empty());
        assert!(!resolution.suggestions.is_empty());
        assert!(resolution.suggestions.len() <= 8);
        assert!(resolution
            .suggestions
            .iter()
            .all(|s| normalize(s).contains("guesthouse")));
    }

    #[test]
    fn test_nothing_found() {
        assert!(resolve("lorem ipsum").is_empty());
    }
}
