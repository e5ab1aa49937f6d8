//! Pickup gazetteer: numbered bus stops, doorstep hotels, areas and landmark aliases.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::pricing::strings;
use crate::error::KnowledgeError;
use crate::text::normalize;

const EARTH_RADIUS_KM: f64 = 6371.0;
const WALKING_SPEED_KMH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Walking time in whole minutes at an average pace.
pub fn walking_minutes(distance_km: f64) -> u32 {
    (distance_km / WALKING_SPEED_KMH * 60.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    pub number: u32,
    pub name: String,
    pub coordinates: GeoPoint,
    pub area: String,
    pub serviced_hotels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BusStop {
    pub fn map_link(&self) -> String {
        format!(
            "https://www.google.com/maps/@{},{},18z",
            self.coordinates.lat, self.coordinates.lng
        )
    }

    /// "Ráðhúsið - City Hall" → ["radhusid", "city hall"].
    pub fn name_segments(&self) -> Vec<String> {
        self.name
            .split(" - ")
            .map(|s| normalize(s.trim()))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// A hotel served at its door rather than from a numbered stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectPickupHotel {
    pub name: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub description: String,
    pub landmarks: Vec<String>,
    pub walking_radius: String,
    /// Normalized phrases that name this area in free text.
    #[serde(skip)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkAlias {
    pub alias: String,
    pub stop: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupGuidance {
    pub description: String,
    pub booking_notice: String,
    pub contact: String,
    pub all_stops_map: String,
    pub pickup_window: String,
    pub arrival_instructions: String,
    pub waiting_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gazetteer {
    pub stops: Vec<BusStop>,
    pub direct_pickup: Vec<DirectPickupHotel>,
    pub areas: Vec<Area>,
    pub landmarks: Vec<LandmarkAlias>,
    pub guidance: PickupGuidance,
}

/// Stop the walking distances are measured from.
pub const CITY_CENTRE_STOP: u32 = 1;

impl Gazetteer {
    pub fn stop(&self, number: u32) -> Option<&BusStop> {
        self.stops.iter().find(|s| s.number == number)
    }

    pub fn area(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn stops_in_area<'a>(&'a self, area_id: &'a str) -> impl Iterator<Item = &'a BusStop> {
        self.stops.iter().filter(move |s| s.area == area_id)
    }

    /// Distance from a stop to City Hall, the reference point for walking times.
    pub fn distance_to_centre_km(&self, stop: &BusStop) -> f64 {
        self.stop(CITY_CENTRE_STOP)
            .map(|centre| stop.coordinates.distance_km(&centre.coordinates))
            .unwrap_or(0.0)
    }

    /// Hotel names listed at more than one stop, with every stop listing them.
    /// Resolution picks the first stop in gazetteer order for these.
    pub fn ambiguous_hotels(&self) -> Vec<(String, Vec<u32>)> {
        let mut seen: BTreeMap<String, (String, Vec<u32>)> = BTreeMap::new();
        for stop in &self.stops {
            for hotel in &stop.serviced_hotels {
                let entry = seen
                    .entry(normalize(hotel))
                    .or_insert_with(|| (hotel.clone(), Vec::new()));
                if !entry.1.contains(&stop.number) {
                    entry.1.push(stop.number);
                }
            }
        }
        seen.into_values()
            .filter(|(_, stops)| stops.len() > 1)
            .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), KnowledgeError> {
        let mut numbers = HashSet::new();
        for stop in &self.stops {
            if !numbers.insert(stop.number) {
                return Err(KnowledgeError::DuplicateStop(stop.number));
            }
            if self.area(&stop.area).is_none() {
                return Err(KnowledgeError::UnknownArea {
                    stop: stop.number,
                    area: stop.area.clone(),
                });
            }
        }
        for landmark in &self.landmarks {
            if self.stop(landmark.stop).is_none() {
                return Err(KnowledgeError::DanglingLandmark {
                    alias: landmark.alias.clone(),
                    stop: landmark.stop,
                });
            }
        }
        for (hotel, stops) in self.ambiguous_hotels() {
            tracing::warn!(hotel = %hotel, stops = ?stops, "[Gazetteer] Hotel listed at several stops, first stop wins");
        }
        Ok(())
    }

    pub(crate) fn builtin() -> Self {
        let stops = BUS_STOPS
            .iter()
            .map(|(number, name, lat, lng, area, hotels)| BusStop {
                number: *number,
                name: name.to_string(),
                coordinates: GeoPoint { lat: *lat, lng: *lng },
                area: area.to_string(),
                serviced_hotels: strings(hotels),
                notes: stop_notes(*number),
            })
            .collect();

        let direct_pickup = DIRECT_PICKUP
            .iter()
            .map(|(name, area)| DirectPickupHotel {
                name: name.to_string(),
                area: area.to_string(),
            })
            .collect();

        let areas = AREAS
            .iter()
            .map(|(id, name, description, landmarks, radius, aliases)| Area {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                landmarks: strings(landmarks),
                walking_radius: radius.to_string(),
                aliases: strings(aliases),
            })
            .collect();

        let landmarks = LANDMARKS
            .iter()
            .map(|(alias, stop)| LandmarkAlias {
                alias: alias.to_string(),
                stop: *stop,
            })
            .collect();

        Self {
            stops,
            direct_pickup,
            areas,
            landmarks,
            guidance: PickupGuidance {
                description: "Comprehensive pickup and dropoff service in Reykjavík area".into(),
                booking_notice: "Pickup must be booked at least 2 hours before departure".into(),
                contact: "+354 599 0000".into(),
                all_stops_map: "https://www.google.com/maps/d/u/0/embed?mid=16_CecpP8J8JNlIFoP6tdwKhPVPiUUG4".into(),
                pickup_window: "30 minutes before scheduled departure".into(),
                arrival_instructions: "Be ready and visible outside at pickup location".into(),
                waiting_time: "Bus could arrive anytime within the 30-minute window".into(),
            },
        }
    }
}

fn stop_notes(number: u32) -> Option<String> {
    match number {
        9 => Some("Located along Laugavegur shopping street, 15-20 minutes walk to city center".into()),
        12 => Some("Business district location near Höfðatorg Tower".into()),
        _ => None,
    }
}

type StopRow = (u32, &'static str, f64, f64, &'static str, &'static [&'static str]);

const BUS_STOPS: &[StopRow] = &[
    (1, "Ráðhúsið - City Hall", 64.146316, -21.941491, "downtown", &[
        "3 Sisters Guesthouse",
        "Centerhotel Plaza",
        "Chez Monique",
        "Embassy Luxury Apartments",
        "Gallery Central Guesthouse",
        "Guesthouse Álfhóll",
        "Guesthouse Butterfly",
        "Hotel Hilda",
        "Hotel Metropolitan",
        "Hotel Reykjavík Centrum",
        "House Of Spirits",
        "Kvosin Hotel",
        "Reykjavik Downtown Hostel",
        "Iceland Parliament Hotel",
    ]),
    (2, "Tjörnin - The Pond", 64.145763, -21.938547, "downtown", &[
        "Ambassade Apartments",
        "Castle House Luxury Apartments",
        "Central Guesthouse",
        "Hotel Reykjavik Saga",
        "Luna Hotel Apartments - Amtmannsstígur 5",
        "Luna Hotel Apartments - Spítalastígur 1",
    ]),
    (3, "Lækjargata", 64.14678, -21.937296, "downtown", &[
        "1912 Guesthouse",
        "Apotek Hotel",
        "Black Pearl",
        "Centerhotel Þingholt",
        "Central Apartments",
        "City Center Hotel",
        "Downtown Guesthouse",
        "Reykjavík Konsulate Hotel",
        "Hotel Borg",
        "Ocean Comfort Apartments",
        "Radisson Blu Hotel 1919",
        "Loft Hostel",
    ]),
    (4, "Miðbakki Harbour", 64.150278, -21.9405, "harbor", &[
        "Exeter Hotel",
        "Lighthouse Apartments",
        "Ocean Comfort Apartments",
        "Planet Apartments",
    ]),
    (5, "Harpa", 64.149766, -21.929865, "harbor", &[
        "Centerhotel Arnarhvoll",
        "The Reykjavik EDITION",
    ]),
    (6, "Safnahúsið - The Culture House", 64.147454, -21.932894, "downtown", &[
        "101 Hótel",
        "Apartment K - Hverfisgata 14",
        "Apartment K - Ingólfsstræti 1a",
        "Apartment K - Skólastræti 1",
        "Apartment K - Þingholtsstræti 2-4",
        "Canopy Reykjavík | City Centre",
        "Hótel Frón",
    ]),
    (8, "Hallgrímskirkja", 64.141548, -21.927973, "hallgrimskirkja_area", &[
        "Eric The Red Guesthouse",
        "Forsæla Apartments",
        "Freyja Guesthouse",
        "Gest Inn",
        "Guesthouse Aurora",
        "Hostel B47",
        "Hotel Leifur Eiríksson",
        "Hotel Óðinsvé",
        "Inga's New Guest Apartments",
        "Loki 101 Guesthouse",
        "Luna Hotel Apartments - Baldursgata 36",
        "Mengi Apartments",
        "Our House Guesthouse",
        "SUNNA Guesthouse",
        "Villa Guesthouse",
    ]),
    (9, "Snorrabraut", 64.143497, -21.916289, "laugavegur", &[
        "Centerhotel Laugavegur",
        "Skuggi Hotel",
        "4th Floor Hotel",
        "100 Iceland Hotel",
        "101 Guesthouse",
        "Alda Hotel Reykjavik",
        "Alfred's Apartments",
        "Apartment K - Laugavegur 74",
        "Apartment K - Laugavegur 85-86",
        "City Comfort Apartments",
        "Guesthouse Von",
        "Heida's Home",
        "Hlemmur Apartments",
        "Luna Hotel Apartments - Laugavegur 86",
        "OK Hotel",
        "Reykjavik4you Apartments - Laugavegi 85",
        "Stay Apartments - Laugavegur 139",
    ]),
    (11, "Austurbær", 64.142364, -21.917228, "east_central", &[
        "Grettisborg Apartments",
        "Guesthouse Snorri",
        "Reykjavik Hostel Village",
        "Stay Apartments Grettisgata",
    ]),
    (12, "Höfðatorg", 64.144389, -21.910327, "business_district", &[
        "Fosshótel Reykjavík",
        "Storm Hotel",
        "Tower Suites",
    ]),
    (13, "Rauðarárstígur", 64.142658, -21.913866, "east_central", &[
        "Centerhotel Miðgarður",
        "Downtown Reykjavik Apartments",
        "Fosshótel Rauðará",
        "Fosshótel Lind",
        "Guesthouse Pávi",
        "Hotel Phoenix",
        "Stay Apartments Einholt",
    ]),
    (14, "Skúlagata", 64.148165, -21.927858, "city_center", &[
        "101 Skuggi Guesthouse",
        "Alfred's Studios",
        "Apartment 37",
        "Apartment K - Bergstaðastræti 12",
        "Apartment K - Bergstaðastræti 3",
        "Apartment K - Hverfisgata 37",
        "Apartment K - Laugavegur 46",
        "Apartment K - Lindargata 60",
        "Apartments Aurora",
        "Black Tower",
        "Centerhotel Klöpp",
        "Centerhotel Skjaldbreið",
        "Domus Guesthouse",
        "Gray Tower",
        "Guesthouse Óðinn",
        "Guesthouse Turninn",
        "ION City Hotel",
        "Ísland Apartments",
        "Luna Hotel Apartments - Laugavegur 37",
        "Old Charm Reykjavik Apartments",
        "Rey Apartments",
        "Reykjavik Residence Hotel",
        "Reykjavik Residence Suites",
        "Reykjavik4you Apartments - Bergstaðastræti 12",
        "Room With A View",
        "Sand Hotel",
        "The Swan House Reykjavik Apartments",
    ]),
    (15, "Vesturbugt", 64.151764, -21.949277, "west_harbor", &[
        "Centerhotel Grandi",
        "Reykjavik Marina",
    ]),
];

const DIRECT_PICKUP: &[(&str, &str)] = &[
    ("201 Hotel", "outside_downtown"),
    ("22 Hill Hotel", "outside_downtown"),
    ("Arctic Comfort Hótel", "outside_downtown"),
    ("Cabin Hotel", "outside_downtown"),
    ("Dalur HI Hostel", "outside_downtown"),
    ("Eyja Guldsmeden Hotel", "outside_downtown"),
    ("Fjörukráin / Hotel Viking", "hafnarfjordur"),
    ("Fosshótel Barón", "city_center"),
    ("Grand Hótel Reykjavík", "outside_downtown"),
    ("Harbor - Skarfabakki", "harbor"),
    ("Hilton Reykjavík Nordica", "outside_downtown"),
    ("Hotel Ísland Comfort - Hlíðasmári 13", "kopavogur"),
    ("Hótel Ísland Spa&Wellness - Ármúli 9", "outside_downtown"),
    ("Hotel Múli", "outside_downtown"),
    ("Hótel Örkin", "outside_downtown"),
    ("KEX Hostel", "city_center"),
    ("Klettur Hótel", "city_center"),
    ("Lækur Hostel", "city_center"),
    ("Northern Comfort Apartments", "outside_downtown"),
    ("Oddsson Downtown Hotel - Háteigsvegur 1", "outside_downtown"),
    ("ODDSSON Hotel - Skeifan", "outside_downtown"),
    ("Reykjavik Campsite", "outside_downtown"),
    ("Reykjavík Domestic Airport", "outside_downtown"),
    ("Reykjavik Lights Hotel", "outside_downtown"),
    ("Reykjavík Natura", "outside_downtown"),
    ("Stay Apartments Bolholt", "outside_downtown"),
];

type AreaRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static str,
    &'static [&'static str],
);

const AREAS: &[AreaRow] = &[
    (
        "downtown",
        "Downtown Reykjavík",
        "Central city area, including main shopping streets",
        &["City Hall", "The Pond", "Lækjargata"],
        "5-10 minutes",
        &["downtown", "down town", "old town", "midbaer"],
    ),
    (
        "hallgrimskirkja_area",
        "Hallgrímskirkja Area",
        "Around Iceland's largest church",
        &["Hallgrímskirkja Church", "Skólavörðustígur"],
        "10-15 minutes to city center",
        &["hallgrimskirkja area", "skolavordustigur"],
    ),
    (
        "harbor",
        "Harbor Area",
        "Old harbor and Harpa Concert Hall area",
        &["Harpa", "Maritime Museum", "Harbor"],
        "5-10 minutes to city center",
        &["harbor", "harbour", "old harbor", "old harbour"],
    ),
    (
        "laugavegur",
        "Laugavegur",
        "Main shopping street and surrounding area",
        &["Hlemmur Food Hall", "Shopping Street"],
        "Within walking distance of attractions",
        &["laugavegur", "shopping street"],
    ),
    (
        "east_central",
        "East Central Reykjavík",
        "Residential streets east of the centre around Rauðarárstígur",
        &["Grettisgata", "Rauðarárstígur"],
        "15-20 minutes to city center",
        &["east central", "grettisgata", "austurbaer"],
    ),
    (
        "business_district",
        "Business District",
        "Höfðatorg and Borgartún office district",
        &["Höfðatorg Tower", "Grand Hotel vicinity"],
        "20 minutes to city center",
        &["business district", "borgartun"],
    ),
    (
        "city_center",
        "City Center",
        "Hverfisgata, Skúlagata and the streets above the old harbour",
        &["Hverfisgata", "Skúlagata"],
        "5 minutes to city center",
        &["city center", "city centre", "hverfisgata"],
    ),
    (
        "west_harbor",
        "Grandi / West Harbour",
        "Grandi harbour district west of the old harbour",
        &["Grandi", "Whales of Iceland"],
        "15 minutes to city center",
        &["grandi", "west harbour", "west harbor", "vesturbugt"],
    ),
    (
        "outside_downtown",
        "Outside Downtown",
        "Hotels outside the central zone served at the door",
        &[],
        "Served by direct pickup",
        &["outside downtown", "outside the city center", "outside the city centre"],
    ),
    (
        "hafnarfjordur",
        "Hafnarfjörður",
        "Harbour town south of Reykjavík",
        &["Fjörukráin Viking Village"],
        "Served by direct pickup",
        &["hafnarfjordur"],
    ),
    (
        "kopavogur",
        "Kópavogur",
        "Neighbouring town south of Reykjavík",
        &["Smáralind"],
        "Served by direct pickup",
        &["kopavogur"],
    ),
];

const LANDMARKS: &[(&str, u32)] = &[
    ("hallgrimskirkja", 8),
    ("hallgrims church", 8),
    ("the church", 8),
    ("city hall", 1),
    ("radhus", 1),
    ("parliament", 1),
    ("the pond", 2),
    ("tjornin", 2),
    ("harpa", 5),
    ("concert hall", 5),
    ("culture house", 6),
    ("maritime museum", 4),
    ("hlemmur", 9),
    ("hofdatorg tower", 12),
];
