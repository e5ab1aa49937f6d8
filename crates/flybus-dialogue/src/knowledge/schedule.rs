//! Timetables: airport→city meets every arrival, city→airport runs a fixed daily list.

use serde::{Deserialize, Serialize};

use super::pricing::strings;
use crate::error::KnowledgeError;
use crate::types::ClockTime;

/// One scheduled city→airport run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Hotel / bus stop pickup starts.
    pub pickup: ClockTime,
    /// Departure from BSÍ Bus Terminal.
    pub bsi: ClockTime,
    /// Arrival at Keflavík Airport.
    pub arrival: ClockTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportToCity {
    pub description: String,
    pub timing: String,
    pub location: String,
    pub flexibility: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingGuidelines {
    pub europe_flights: String,
    pub us_canada_flights: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityToAirport {
    pub base_location: String,
    /// Sorted ascending by `bsi`.
    pub departures: Vec<Departure>,
    pub timing_guidelines: TimingGuidelines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedules {
    pub airport_to_city: AirportToCity,
    pub city_to_airport: CityToAirport,
}

const TIMETABLE: &[(&str, &str, &str)] = &[
    ("03:00", "03:30", "04:15"),
    ("04:00", "04:30", "05:15"),
    ("05:00", "05:30", "06:15"),
    ("06:00", "06:30", "07:15"),
    ("07:00", "07:30", "08:15"),
    ("08:00", "08:30", "09:15"),
    ("09:00", "09:30", "10:15"),
    ("10:30", "11:00", "11:45"),
    ("11:30", "12:00", "12:45"),
    ("12:30", "13:00", "13:45"),
    ("13:30", "14:00", "14:45"),
    ("15:00", "15:30", "16:15"),
    ("16:00", "16:30", "17:15"),
    ("17:30", "18:00", "18:45"),
    ("19:30", "20:00", "20:45"),
    ("21:00", "21:30", "22:15"),
    ("22:00", "22:30", "23:15"),
];

fn clock(field: &'static str, value: &str) -> Result<ClockTime, KnowledgeError> {
    ClockTime::parse(value).ok_or_else(|| KnowledgeError::InvalidClockTime {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn parse_timetable(
    rows: &[(&str, &str, &str)],
) -> Result<Vec<Departure>, KnowledgeError> {
    let mut departures: Vec<Departure> = Vec::with_capacity(rows.len());
    for (index, (pickup, bsi, arrival)) in rows.iter().enumerate() {
        let departure = Departure {
            pickup: clock("pickup", pickup)?,
            bsi: clock("bsi", bsi)?,
            arrival: clock("arrival", arrival)?,
        };
        if departure.arrival <= departure.bsi || departure.bsi < departure.pickup {
            return Err(KnowledgeError::InconsistentDeparture { index });
        }
        if let Some(prev) = departures.last() {
            if prev.bsi >= departure.bsi {
                return Err(KnowledgeError::UnsortedTimetable { index });
            }
        }
        departures.push(departure);
    }
    Ok(departures)
}

impl Schedules {
    pub(crate) fn builtin() -> Result<Self, KnowledgeError> {
        Ok(Self {
            airport_to_city: AirportToCity {
                description:
                    "Flybus operates in connection with all arriving flights at Keflavik Airport"
                        .into(),
                timing: "Bus departs 35-45 minutes after each flight arrival".into(),
                location: "Right outside the terminal area".into(),
                flexibility: "Tickets are flexible on date, take any available bus".into(),
            },
            city_to_airport: CityToAirport {
                base_location: "BSÍ Bus Terminal".into(),
                departures: parse_timetable(TIMETABLE)?,
                timing_guidelines: TimingGuidelines {
                    europe_flights: "Arrive 2.5 hours before departure".into(),
                    us_canada_flights: "Arrive 3 hours before departure".into(),
                },
            },
        })
    }

    pub fn departures(&self) -> &[Departure] {
        &self.city_to_airport.departures
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub main_stops: Vec<String>,
    pub duration: String,
    pub distance_details: String,
    pub additional_info: String,
    pub gardabaer_stop: String,
    pub hafnarfjordur_stop: String,
}

impl RouteInfo {
    pub(crate) fn builtin() -> Self {
        Self {
            main_stops: strings(&[
                "Keflavík Airport",
                "Garðabær",
                "Hafnarfjörður",
                "BSÍ Terminal",
            ]),
            duration: "45-50 minutes".into(),
            distance_details: "The journey from Keflavík Airport to BSÍ Bus Terminal takes about 45 minutes under normal conditions".into(),
            additional_info: "For Flybus+ (hotel transfer service), add approximately 30 minutes for hotel drop-offs".into(),
            gardabaer_stop: "Optional stop at Garðabær (Aktu Taktu Gas station/Bus Stop Ásgarður C) - 5-10 minutes after BSÍ departure".into(),
            hafnarfjordur_stop: "Optional stop at Hafnarfjörður (Fjörukráin Hotel Viking) - 10-15 minutes after BSÍ departure".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_timetable_sorted() {
        let schedules = Schedules::builtin().unwrap();
        let deps = schedules.departures();
        assert_eq!(deps.len(), 17);
        assert!(deps.windows(2).all(|w| w[0].bsi < w[1].bsi));
        assert_eq!(deps[0].arrival.to_string(), "04:15");
    }

    #[test]
    fn test_unsorted_timetable_rejected() {
        let rows = [("05:00", "05:30", "06:15"), ("04:00", "04:30", "05:15")];
        assert_eq!(
            parse_timetable(&rows),
            Err(KnowledgeError::UnsortedTimetable { index: 1 })
        );
    }

    #[test]
    fn test_malformed_clock_rejected() {
        let rows = [("5", "05:30", "06:15")];
        assert!(matches!(
            parse_timetable(&rows),
            Err(KnowledgeError::InvalidClockTime { field: "pickup", .. })
        ));
    }
}
