//! Flat descriptive records: service overview, luggage, special services, fleet,
//! onboard policies and safety.

use serde::{Deserialize, Serialize};

use super::pricing::strings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOverview {
    pub name: String,
    pub description: String,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraItem {
    pub item: String,
    pub price: u32,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagDrop {
    pub available: bool,
    pub service_url: String,
    pub discount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuggagePolicy {
    pub main_luggage_pieces: u32,
    pub main_luggage_max_kg: u32,
    pub carry_on: String,
    pub extras: Vec<ExtraItem>,
    pub policies: Vec<String>,
    pub bag_drop: BagDrop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRule {
    pub age: String,
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialServices {
    pub child_seats_availability: String,
    pub child_seats_booking: String,
    pub child_seat_rules: Vec<SeatRule>,
    pub wheelchair_standard: String,
    pub wheelchair_electric: String,
    pub service_animals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetInfo {
    pub description: String,
    pub amenities: Vec<String>,
    pub environmental: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPolicies {
    pub smoking: String,
    pub pets: String,
    pub food_and_drink: String,
    pub cancellation: String,
    pub missed_bus: String,
    pub delayed_flights: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyInfo {
    pub seat_belts: String,
    pub drivers: String,
    pub winter_conditions: String,
    pub emergency_contact: String,
}

impl ServiceOverview {
    pub(crate) fn builtin() -> Self {
        let highlight = |title: &str, description: &str| Highlight {
            title: title.into(),
            description: description.into(),
        };
        Self {
            name: "Flybus Airport Transfer".into(),
            description: "Direct airport transfer service between Keflavík Airport and Reykjavík"
                .into(),
            highlights: vec![
                highlight(
                    "Carbon-neutral transfer",
                    "New, comfortable & carbon-neutral coaches for sustainable travel",
                ),
                highlight(
                    "Flight connection guarantee",
                    "In connection with all arrivals - if your flight is late, we wait!",
                ),
                highlight("Convenient booking", "Book online - skip the lines!"),
                highlight("Quick journey", "45 minutes to Reykjavík BSÍ Bus Terminal"),
                highlight("Onboard amenities", "Free Wi-Fi on all buses"),
            ],
        }
    }
}

impl LuggagePolicy {
    pub(crate) fn builtin() -> Self {
        Self {
            main_luggage_pieces: 2,
            main_luggage_max_kg: 23,
            carry_on: "1 small carry-on item".into(),
            extras: vec![
                ExtraItem {
                    item: "Bicycle".into(),
                    price: 2500,
                    conditions: strings(&[
                        "Subject to space availability",
                        "Preferably packaged in boxes",
                        "Unpackaged bikes must have pedals removed and chain covered",
                    ]),
                },
                ExtraItem {
                    item: "Extra bag (golf bags, skis, etc.)".into(),
                    price: 1000,
                    conditions: strings(&["Per additional item"]),
                },
            ],
            policies: strings(&[
                "No liability for fragile valuables or perishable articles",
                "All baggage must be claimed promptly upon arrival",
            ]),
            bag_drop: BagDrop {
                available: true,
                service_url: "https://www.bagdrop.is/?culture=EN".into(),
                discount: "10% with Flybus ticket".into(),
            },
        }
    }
}

impl SpecialServices {
    pub(crate) fn builtin() -> Self {
        let rule = |age: &str, rule: &str| SeatRule {
            age: age.into(),
            rule: rule.into(),
        };
        Self {
            child_seats_availability: "Available upon request".into(),
            child_seats_booking: "Contact Customer Service 24 hours in advance".into(),
            child_seat_rules: vec![
                rule("1-3 years", "Must use appropriate child car seats"),
                rule("3-4 years and older (over 18 kg)", "Can use normal seat belts"),
                rule("Under 1 year", "Cannot be accommodated due to safety requirements"),
            ],
            wheelchair_standard: "Accessible for passengers with foldable manual wheelchairs who can board with minimal assistance".into(),
            wheelchair_electric: "Electric wheelchair users referred to Prime Tours".into(),
            service_animals: "Registered service animals travel free of charge; other animals are not carried".into(),
        }
    }
}

impl FleetInfo {
    pub(crate) fn builtin() -> Self {
        Self {
            description: "Modern full-size coaches operated by professional drivers".into(),
            amenities: strings(&[
                "Free Wi-Fi on all buses",
                "Seat belts on every seat",
                "Large luggage compartment",
            ]),
            environmental: "New, comfortable & carbon-neutral coaches for sustainable travel"
                .into(),
        }
    }
}

impl TravelPolicies {
    pub(crate) fn builtin() -> Self {
        Self {
            smoking: "Smoking and e-cigarettes are not permitted on board".into(),
            pets: "Only registered service animals may travel on board".into(),
            food_and_drink: "Bottled drinks are fine; please avoid hot food on board".into(),
            cancellation: "Free Cancellation (according to cancellation policy)".into(),
            missed_bus: "Tickets are flexible on date, take any available bus".into(),
            delayed_flights: "In connection with all arrivals - if your flight is late, we wait!"
                .into(),
        }
    }
}

impl SafetyInfo {
    pub(crate) fn builtin() -> Self {
        Self {
            seat_belts: "Passengers must wear seat belts at all times while the coach is moving"
                .into(),
            drivers: "Professional drivers trained for Icelandic road and weather conditions"
                .into(),
            winter_conditions: "Coaches run on winter tyres and departures may be adjusted in severe weather".into(),
            emergency_contact: "+354 599 0000".into(),
        }
    }
}
