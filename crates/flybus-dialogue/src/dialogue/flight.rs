//! Flight-timing resolver: flight time + destination → the bus to take.
//!
//! The check-in deadline is the flight time minus the destination buffer
//! (2.5h Europe, 3h US/Canada). The recommended bus is the latest departure
//! that still reaches the airport `arrival_slack_minutes` before that deadline.
//! When no bus of the flight day is early enough, the previous evening's
//! timetable is searched.

use regex::Regex;
use std::sync::LazyLock;

use super::facts::{
    FactEntry, FlightInquiryFact, FlightScheduleFact, MissingFlightInfo, NoDepartureFact,
};
use crate::config::FlightConfig;
use crate::knowledge::Schedules;
use crate::session::SessionContext;
use crate::types::{ClockTime, Destination};

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\bat\s+)?\b(\d{1,2})(?:[:.](\d{2}))?\s*(am\b|pm\b|a\.m\.|p\.m\.)?")
        .expect("time regex is valid")
});

/// One table for both buckets. US is matched only in travel phrasing so
/// "can you help us" is not a destination.
static US_CANADA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(to|for|the|from|in|fly|flying) us\b|\busa\b|\bu\.s\.(a\.)?|\b(america|american|united states|states|canada|canadian|north america|new york|nyc|jfk|newark|boston|chicago|washington|seattle|denver|minneapolis|detroit|orlando|baltimore|philadelphia|los angeles|san francisco|toronto|montreal|vancouver|halifax|calgary|edmonton)\b",
    )
    .expect("us/canada regex is valid")
});

static EUROPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(europe|european|schengen|uk|united kingdom|england|scotland|britain|london|manchester|edinburgh|glasgow|paris|france|germany|berlin|frankfurt|munich|copenhagen|denmark|oslo|norway|stockholm|sweden|helsinki|finland|amsterdam|netherlands|brussels|belgium|dublin|ireland|madrid|barcelona|spain|rome|italy|milan|zurich|switzerland|vienna|austria|prague|warsaw|poland|lisbon|portugal|budapest|tenerife|alicante)\b",
    )
    .expect("europe regex is valid")
});

/// Extract a clock time: `14:30`, `2pm`, `2:30 p.m.`, `at 9`.
///
/// A bare number only counts when introduced by "at", so "2 adults" or
/// "stop 8" never read as times.
pub fn extract_time(normalized: &str) -> Option<ClockTime> {
    for caps in TIME_RE.captures_iter(normalized) {
        let has_at = caps.get(1).is_some();
        let Some(hours) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let minutes = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
        let meridiem = caps.get(4).map(|m| m.as_str().starts_with('p'));

        if minutes.is_none() && meridiem.is_none() && !has_at {
            continue;
        }
        let hours = match meridiem {
            Some(_) if hours == 0 || hours > 12 => continue,
            Some(true) if hours != 12 => hours + 12,
            Some(false) if hours == 12 => 0,
            _ => hours,
        };
        if let Some(time) = ClockTime::from_hm(hours, minutes.unwrap_or(0)) {
            return Some(time);
        }
    }
    None
}

/// Destination bucket; when both are named, the one mentioned first wins.
pub fn extract_destination(normalized: &str) -> Option<Destination> {
    let us = US_CANADA_RE.find(normalized).map(|m| m.start());
    let europe = EUROPE_RE.find(normalized).map(|m| m.start());
    match (europe, us) {
        (Some(e), Some(u)) if u < e => Some(Destination::UsCanada),
        (Some(_), _) => Some(Destination::Europe),
        (None, Some(_)) => Some(Destination::UsCanada),
        (None, None) => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlightResolution {
    Schedule(FlightScheduleFact),
    NoSuitableDeparture(NoDepartureFact),
    Inquiry(FlightInquiryFact),
}

impl FlightResolution {
    pub fn flight_time(&self) -> Option<ClockTime> {
        match self {
            FlightResolution::Schedule(f) => Some(f.flight_time),
            FlightResolution::NoSuitableDeparture(f) => Some(f.flight_time),
            FlightResolution::Inquiry(f) => f.flight_time,
        }
    }

    pub fn destination(&self) -> Option<Destination> {
        match self {
            FlightResolution::Schedule(f) => Some(f.destination),
            FlightResolution::NoSuitableDeparture(f) => Some(f.destination),
            FlightResolution::Inquiry(f) => f.destination,
        }
    }

    pub fn needs_destination(&self) -> bool {
        matches!(self, FlightResolution::Inquiry(f) if f.missing.contains(&MissingFlightInfo::Destination))
    }

    pub fn into_fact(self) -> FactEntry {
        match self {
            FlightResolution::Schedule(f) => FactEntry::FlightSchedule(f),
            FlightResolution::NoSuitableDeparture(f) => FactEntry::FlightNoDeparture(f),
            FlightResolution::Inquiry(f) => FactEntry::FlightInquiry(f),
        }
    }
}

/// Resolve the departure for a flight, completing missing pieces from context.
pub fn resolve_flight_timing(
    normalized: &str,
    ctx: Option<&SessionContext>,
    schedules: &Schedules,
    config: &FlightConfig,
) -> FlightResolution {
    let flight_time = extract_time(normalized).or_else(|| ctx.and_then(|c| c.flight_time));
    let destination =
        extract_destination(normalized).or_else(|| ctx.and_then(|c| c.flight_destination));

    let (flight_time, destination) = match (flight_time, destination) {
        (Some(t), Some(d)) => (t, d),
        (time, dest) => {
            let mut missing = Vec::new();
            if time.is_none() {
                missing.push(MissingFlightInfo::FlightTime);
            }
            if dest.is_none() {
                missing.push(MissingFlightInfo::Destination);
            }
            tracing::debug!(?missing, "[FlightResolver] Flight details incomplete");
            return FlightResolution::Inquiry(FlightInquiryFact {
                flight_time: time,
                destination: dest,
                missing,
            });
        }
    };

    let buffer = config.buffer_minutes(destination);
    let deadline = i64::from(flight_time.minutes()) - i64::from(buffer);
    let target = deadline - i64::from(config.arrival_slack_minutes);
    let latest_airport_arrival = ClockTime::from_minutes(deadline);

    // Previous-evening buses sit one day earlier on the same axis as `target`.
    let day = i64::from(ClockTime::MINUTES_PER_DAY);
    let departures = schedules.departures();
    let recommended = departures
        .iter()
        .rev()
        .find(|dep| i64::from(dep.arrival.minutes()) <= target)
        .map(|dep| (dep, false))
        .or_else(|| {
            departures
                .iter()
                .rev()
                .find(|dep| i64::from(dep.arrival.minutes()) - day <= target)
                .map(|dep| (dep, true))
        });

    match recommended {
        Some((dep, previous_day)) => {
            tracing::debug!(
                flight = %flight_time,
                destination = %destination,
                bsi = %dep.bsi,
                previous_day,
                "[FlightResolver] Departure selected"
            );
            FlightResolution::Schedule(FlightScheduleFact {
                flight_time,
                destination,
                buffer_minutes: buffer,
                latest_airport_arrival,
                recommended: *dep,
                previous_day,
                base_location: schedules.city_to_airport.base_location.clone(),
            })
        }
        None => {
            tracing::debug!(
                flight = %flight_time,
                destination = %destination,
                "[FlightResolver] No departure reaches the airport in time"
            );
            FlightResolution::NoSuitableDeparture(NoDepartureFact {
                flight_time,
                destination,
                latest_airport_arrival,
                first_departure: departures.first().copied(),
                previous_evening: departures.last().copied(),
            })
        }
    }
}
