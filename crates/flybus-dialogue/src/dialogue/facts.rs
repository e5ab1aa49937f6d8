//! The fact bundle: a closed set of tagged entries the dispatcher switches on.

use serde::{Deserialize, Serialize};

use super::classifier::{QueryIntent, SmallTalk};
use super::group::GroupFare;
use crate::knowledge::{
    Area, Departure, FleetInfo, GeoPoint, LuggagePolicy, PassengerLimits, RouteInfo, SafetyInfo,
    ServiceOverview, SpecialServices, TierInfo, TravelPolicies,
};
use crate::knowledge::schedule::{AirportToCity, TimingGuidelines};
use crate::session::SessionContext;
use crate::types::{ClockTime, Destination, ServiceTier, TripType};

/// One retrieved fact, serialized as `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FactEntry {
    CasualChat(SmallTalk),
    Acknowledgment,
    Negation,
    Confirmation,
    GroupPricing(GroupFare),
    Comparison(ComparisonFact),
    PickupTiming(PickupTimingFact),
    FlightSchedule(FlightScheduleFact),
    FlightInquiry(FlightInquiryFact),
    FlightNoDeparture(NoDepartureFact),
    ServiceOverview(ServiceOverview),
    Recommendation(RecommendationFact),
    Booking(BookingFact),
    Fleet(FleetInfo),
    Policy(TravelPolicies),
    Safety(SafetyInfo),
    BusStop(BusStopFact),
    HotelLocation(HotelLocationFact),
    DirectPickup(DirectPickupFact),
    Location(LocationFact),
    Schedule(ScheduleFact),
    Pricing(PricingFact),
    Luggage(LuggagePolicy),
    SpecialServices(SpecialServices),
    Route(RouteInfo),
}

/// Discriminant of [`FactEntry`]; what the session remembers as `last_topic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    CasualChat,
    Acknowledgment,
    Negation,
    Confirmation,
    GroupPricing,
    Comparison,
    PickupTiming,
    FlightSchedule,
    FlightInquiry,
    FlightNoDeparture,
    ServiceOverview,
    Recommendation,
    Booking,
    Fleet,
    Policy,
    Safety,
    BusStop,
    HotelLocation,
    DirectPickup,
    Location,
    Schedule,
    Pricing,
    Luggage,
    SpecialServices,
    Route,
}

impl FactEntry {
    pub fn topic(&self) -> Topic {
        match self {
            FactEntry::CasualChat(_) => Topic::CasualChat,
            FactEntry::Acknowledgment => Topic::Acknowledgment,
            FactEntry::Negation => Topic::Negation,
            FactEntry::Confirmation => Topic::Confirmation,
            FactEntry::GroupPricing(_) => Topic::GroupPricing,
            FactEntry::Comparison(_) => Topic::Comparison,
            FactEntry::PickupTiming(_) => Topic::PickupTiming,
            FactEntry::FlightSchedule(_) => Topic::FlightSchedule,
            FactEntry::FlightInquiry(_) => Topic::FlightInquiry,
            FactEntry::FlightNoDeparture(_) => Topic::FlightNoDeparture,
            FactEntry::ServiceOverview(_) => Topic::ServiceOverview,
            FactEntry::Recommendation(_) => Topic::Recommendation,
            FactEntry::Booking(_) => Topic::Booking,
            FactEntry::Fleet(_) => Topic::Fleet,
            FactEntry::Policy(_) => Topic::Policy,
            FactEntry::Safety(_) => Topic::Safety,
            FactEntry::BusStop(_) => Topic::BusStop,
            FactEntry::HotelLocation(_) => Topic::HotelLocation,
            FactEntry::DirectPickup(_) => Topic::DirectPickup,
            FactEntry::Location(_) => Topic::Location,
            FactEntry::Schedule(_) => Topic::Schedule,
            FactEntry::Pricing(_) => Topic::Pricing,
            FactEntry::Luggage(_) => Topic::Luggage,
            FactEntry::SpecialServices(_) => Topic::SpecialServices,
            FactEntry::Route(_) => Topic::Route,
        }
    }

    /// Entries the dispatcher answers with a canned reply instead of the LLM.
    pub fn is_trivial(&self) -> bool {
        self.topic().is_trivial()
    }
}

impl Topic {
    pub fn is_trivial(&self) -> bool {
        matches!(
            self,
            Topic::CasualChat | Topic::Acknowledgment | Topic::Negation | Topic::Confirmation
        )
    }

    pub fn is_flight(&self) -> bool {
        matches!(
            self,
            Topic::FlightSchedule | Topic::FlightInquiry | Topic::FlightNoDeparture
        )
    }

    pub fn is_location(&self) -> bool {
        matches!(
            self,
            Topic::BusStop | Topic::HotelLocation | Topic::DirectPickup | Topic::Location
        )
    }
}

// ============================================================================
// Fact payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonFact {
    pub currency: String,
    pub standard: TierInfo,
    pub plus: TierInfo,
    pub differences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupTimingFact {
    pub pickup_window: String,
    pub waiting_time: String,
    pub arrival_instructions: String,
    pub booking_notice: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightScheduleFact {
    pub flight_time: ClockTime,
    pub destination: Destination,
    pub buffer_minutes: u32,
    /// Check-in deadline: flight time minus the destination buffer.
    pub latest_airport_arrival: ClockTime,
    pub recommended: Departure,
    /// The recommended bus runs the evening before the flight.
    pub previous_day: bool,
    pub base_location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFlightInfo {
    FlightTime,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightInquiryFact {
    pub flight_time: Option<ClockTime>,
    pub destination: Option<Destination>,
    pub missing: Vec<MissingFlightInfo>,
}

/// No bus reaches the airport in time; nothing is chosen on the passenger's behalf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoDepartureFact {
    pub flight_time: ClockTime,
    pub destination: Destination,
    pub latest_airport_arrival: ClockTime,
    pub first_departure: Option<Departure>,
    /// Last bus of the previous evening, for passengers willing to wait overnight.
    pub previous_evening: Option<Departure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationFact {
    pub recommended: ServiceTier,
    pub reasons: Vec<String>,
    pub standard: TierInfo,
    pub plus: TierInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingFact {
    pub booking_url: String,
    pub tier: Option<ServiceTier>,
    pub trip: TripType,
    pub notes: Vec<String>,
    pub cancellation: String,
}

/// How a bus stop was singled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMatchSource {
    StopNumber,
    Landmark,
    StopName,
    Hotel,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusStopFact {
    pub number: u32,
    pub name: String,
    pub coordinates: GeoPoint,
    pub map_link: String,
    pub area: String,
    pub serviced_hotels: Vec<String>,
    pub notes: Option<String>,
    pub distance_from_centre_km: f64,
    pub walking_minutes_from_centre: u32,
    pub matched_via: StopMatchSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelLocationFact {
    pub hotel: String,
    pub bus_stop: BusStopFact,
    /// 1.0 for a full name match, the word coverage for a partial one.
    pub match_score: f32,
    pub pickup_instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectPickupFact {
    pub hotel: String,
    pub area: String,
    pub pickup_type: String,
    /// Doorstep pickups have no bus stop; templates must not render a stop or map link.
    pub skip_map_link: bool,
    pub match_score: f32,
    pub pickup_instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaFact {
    pub area: Area,
    pub stops: Vec<BusStopFact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationFact {
    pub areas: Vec<AreaFact>,
    pub suggestions: Vec<String>,
    pub pickup_window: String,
    pub all_stops_map: String,
    pub contact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleDirection {
    AirportToCity,
    CityToAirport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleFact {
    pub direction: ScheduleDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airport_to_city: Option<AirportToCity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub departures: Vec<Departure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_guidelines: Option<TimingGuidelines>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingFact {
    pub currency: String,
    pub trip: TripType,
    /// Tier the message named, if any; both tiers are listed either way.
    pub focus: Option<ServiceTier>,
    pub tiers: Vec<TierInfo>,
    pub features: Vec<String>,
    pub youth_age_range: String,
    pub child_age_range: String,
    pub limits: PassengerLimits,
}

/// Output of one retrieval turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub relevant_info: Vec<FactEntry>,
    pub context: SessionContext,
    pub confidence: f32,
    pub intent: QueryIntent,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.relevant_info.is_empty()
    }

    /// True when every entry is a greeting, thanks or yes/no style reply.
    pub fn is_trivial(&self) -> bool {
        !self.relevant_info.is_empty() && self.relevant_info.iter().all(FactEntry::is_trivial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_serialize_with_type_tag() {
        let json = serde_json::to_value(FactEntry::Acknowledgment).unwrap();
        assert_eq!(json["type"], "acknowledgment");

        let inquiry = FactEntry::FlightInquiry(FlightInquiryFact {
            flight_time: ClockTime::from_hm(14, 30),
            destination: None,
            missing: vec![MissingFlightInfo::Destination],
        });
        let json = serde_json::to_value(&inquiry).unwrap();
        assert_eq!(json["type"], "flight_inquiry");
        assert_eq!(json["data"]["flight_time"], "14:30");
        assert_eq!(json["data"]["missing"][0], "destination");
    }

    #[test]
    fn test_topic_matches_tag() {
        let entry = FactEntry::CasualChat(SmallTalk::Greeting);
        assert_eq!(entry.topic(), Topic::CasualChat);
        assert!(entry.is_trivial());
        assert_eq!(
            serde_json::to_value(Topic::FlightNoDeparture).unwrap(),
            "flight_no_departure"
        );
        assert!(Topic::HotelLocation.is_location());
        assert!(!Topic::Pricing.is_trivial());
    }
}
