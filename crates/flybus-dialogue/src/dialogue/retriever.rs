//! Knowledge retriever: one message plus session context in, fact bundle out.
//!
//! Retrieval is a pure function of `(message, context)` over the static
//! [`FactStore`]. The only ambient input is the clock used to stamp the
//! returned context, and nothing in the bundle depends on it.
//!
//! Turn sequence:
//! 1. Small talk short-circuits with a single `casual_chat` entry.
//! 2. A stated party size short-circuits to group pricing.
//! 3. The primary intent contributes its entry (comparison, booking, ...).
//! 4. Flight timing runs whenever the message or pending context calls for it.
//! 5. Every matching topic bucket appends its facts, skipping topics already present.
//! 6. An empty bundle replays the previous topic against the new message.

use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use super::classifier::{IntentClassifier, QueryIntent, TopicBucket};
use super::facts::{
    BookingFact, ComparisonFact, FactEntry, LocationFact, PickupTimingFact, PricingFact,
    RecommendationFact, RetrievalResult, ScheduleDirection, ScheduleFact, Topic,
};
use super::flight::{resolve_flight_timing, FlightResolution};
use super::group::{calculate_group_fare, parse_group_composition};
use super::location::resolve_location;
use crate::config::DialogueConfig;
use crate::knowledge::FactStore;
use crate::session::{Clock, SessionContext, SystemClock};
use crate::text::{detect_language, normalize};
use crate::types::{GroupComposition, ServiceTier, TripType};

const BOOKING_URL: &str = "https://www.re.is/flybus";

static PLUS_NEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(hotels?|guest ?houses?|apartments?|door|pick ?-?up|luggage|bags?|suitcases?|kids?|children|family|tired|late|night|winter|snow)\b")
        .expect("recommendation regex is valid")
});

static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(cheap\w*|budget|save|saving|afford\w*|bsi|terminal|backpack\w*|walk\w*)\b")
        .expect("budget regex is valid")
});

/// Entries collected for one turn, with the confidence each one contributed.
#[derive(Default)]
struct Bundle {
    entries: Vec<FactEntry>,
    topics: HashSet<Topic>,
    confidence: f32,
}

impl Bundle {
    fn push(&mut self, entry: FactEntry, confidence: f32) {
        if self.topics.insert(entry.topic()) {
            self.entries.push(entry);
            self.confidence = self.confidence.max(confidence);
        }
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = FactEntry>, confidence: f32) {
        for entry in entries {
            self.push(entry, confidence);
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Context deltas produced by a turn. `None` leaves the stored value untouched.
#[derive(Default)]
struct Deltas {
    flight: Option<FlightResolution>,
    group: Option<GroupComposition>,
    tier: Option<ServiceTier>,
}

pub struct KnowledgeRetriever {
    store: Arc<FactStore>,
    classifier: IntentClassifier,
    config: DialogueConfig,
    clock: Arc<dyn Clock>,
}

impl KnowledgeRetriever {
    pub fn new(store: Arc<FactStore>, config: DialogueConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<FactStore>, config: DialogueConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            classifier: IntentClassifier::new(),
            config,
            clock,
        }
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Retrieve the facts for one message. Never fails: an unrecognized
    /// message yields an empty bundle with confidence 0.
    pub fn retrieve(&self, message: &str, context: Option<&SessionContext>) -> RetrievalResult {
        let normalized = normalize(message);
        let intent = self.classifier.classify(&normalized);
        let mut bundle = Bundle::default();
        let mut deltas = Deltas {
            tier: self.classifier.mentioned_tier(&normalized),
            ..Deltas::default()
        };

        match intent {
            QueryIntent::CasualChat => {
                if let Some(kind) = super::classifier::small_talk(&normalized) {
                    bundle.push(FactEntry::CasualChat(kind), self.classifier.confidence(intent));
                }
            }
            QueryIntent::GroupBooking => {
                if let Some(entry) = self.group_pricing(&normalized, context, &mut deltas) {
                    bundle.push(entry, self.classifier.confidence(intent));
                }
            }
            _ => self.collect(intent, message, &normalized, context, &mut bundle, &mut deltas),
        }

        if bundle.is_empty() {
            if let Some(topic) = context.and_then(|c| c.last_topic) {
                self.continue_topic(topic, message, &normalized, context, &mut bundle, &mut deltas);
            }
        }

        tracing::debug!(
            intent = ?intent,
            entries = bundle.entries.len(),
            confidence = bundle.confidence,
            "[KnowledgeRetriever] Retrieval complete"
        );

        let context = self.merge_context(message, context, &bundle, deltas);
        RetrievalResult {
            relevant_info: bundle.entries,
            context,
            confidence: bundle.confidence,
            intent,
        }
    }

    fn collect(
        &self,
        intent: QueryIntent,
        message: &str,
        normalized: &str,
        context: Option<&SessionContext>,
        bundle: &mut Bundle,
        deltas: &mut Deltas,
    ) {
        let intent_confidence = self.classifier.confidence(intent);
        if let Some(entry) = self.intent_entry(intent, normalized, context) {
            bundle.push(entry, intent_confidence);
        }

        // Flight facts rank ahead of the generic buckets ("flight" also hits the
        // schedule bucket), so the flight sub-dialogue stays the remembered topic.
        if intent == QueryIntent::FlightSchedule
            || self.classifier.indicates_flight(normalized, context)
        {
            let resolution = self.flight(normalized, context);
            bundle.push(resolution.clone().into_fact(), intent_confidence.max(0.9));
            deltas.flight = Some(resolution);
        }

        for matched in self.classifier.buckets(normalized) {
            let entries = self.bucket_entries(matched.bucket, message, normalized, context);
            bundle.extend(entries, matched.confidence);
        }
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    fn intent_entry(
        &self,
        intent: QueryIntent,
        normalized: &str,
        context: Option<&SessionContext>,
    ) -> Option<FactEntry> {
        match intent {
            QueryIntent::Comparison => Some(self.comparison()),
            QueryIntent::PickupTiming => Some(self.pickup_timing()),
            QueryIntent::ServiceInfo => Some(FactEntry::ServiceOverview(self.store.service.clone())),
            QueryIntent::Recommendation => Some(self.recommendation(normalized)),
            QueryIntent::Booking => Some(self.booking(normalized, context)),
            QueryIntent::Acknowledgment => Some(FactEntry::Acknowledgment),
            QueryIntent::Negation => Some(FactEntry::Negation),
            QueryIntent::Confirmation => Some(FactEntry::Confirmation),
            QueryIntent::CasualChat
            | QueryIntent::GroupBooking
            | QueryIntent::FlightSchedule
            | QueryIntent::FollowUp
            | QueryIntent::General => None,
        }
    }

    fn bucket_entries(
        &self,
        bucket: TopicBucket,
        message: &str,
        normalized: &str,
        context: Option<&SessionContext>,
    ) -> Vec<FactEntry> {
        let store = &self.store;
        match bucket {
            TopicBucket::ServiceOverview => vec![FactEntry::ServiceOverview(store.service.clone())],
            TopicBucket::Fleet => vec![FactEntry::Fleet(store.fleet.clone())],
            TopicBucket::Policy => vec![FactEntry::Policy(store.policies.clone())],
            TopicBucket::Safety => vec![FactEntry::Safety(store.safety.clone())],
            TopicBucket::Luggage => vec![FactEntry::Luggage(store.luggage.clone())],
            TopicBucket::SpecialServices => {
                vec![FactEntry::SpecialServices(store.special_services.clone())]
            }
            TopicBucket::Route => vec![FactEntry::Route(store.route.clone())],
            TopicBucket::Schedule => vec![self.schedule(normalized)],
            TopicBucket::Pricing => vec![self.pricing(normalized, context)],
            TopicBucket::Location => {
                let facts = self.locations(message);
                if facts.is_empty() {
                    vec![self.location_guidance()]
                } else {
                    facts
                }
            }
        }
    }

    fn flight(&self, normalized: &str, context: Option<&SessionContext>) -> FlightResolution {
        resolve_flight_timing(
            normalized,
            context,
            &self.store.schedules,
            &self.config.flight,
        )
    }

    fn group_pricing(
        &self,
        normalized: &str,
        context: Option<&SessionContext>,
        deltas: &mut Deltas,
    ) -> Option<FactEntry> {
        let stated = parse_group_composition(normalized)?;
        let group = match context.and_then(|c| c.group_details) {
            Some(earlier) => earlier.merged(&stated),
            None => stated,
        };
        let tier = self.tier(normalized, context);
        let trip = self.trip(normalized);
        tracing::debug!(?group, tier = %tier, ?trip, "[KnowledgeRetriever] Group pricing");
        deltas.group = Some(group);
        Some(FactEntry::GroupPricing(calculate_group_fare(
            &self.store.pricing,
            &group,
            tier,
            trip,
        )))
    }

    fn locations(&self, message: &str) -> Vec<FactEntry> {
        let gazetteer = &self.store.locations;
        resolve_location(message, gazetteer, self.config.retrieval.max_suggestions)
            .into_facts(gazetteer)
    }

    fn location_guidance(&self) -> FactEntry {
        let guidance = &self.store.locations.guidance;
        FactEntry::Location(LocationFact {
            areas: Vec::new(),
            suggestions: Vec::new(),
            pickup_window: guidance.pickup_window.clone(),
            all_stops_map: guidance.all_stops_map.clone(),
            contact: guidance.contact.clone(),
        })
    }

    fn schedule(&self, normalized: &str) -> FactEntry {
        let schedules = &self.store.schedules;
        let city = &schedules.city_to_airport;
        let fact = match self.classifier.airport_to_city(normalized) {
            Some(true) => ScheduleFact {
                direction: ScheduleDirection::AirportToCity,
                airport_to_city: Some(schedules.airport_to_city.clone()),
                departures: Vec::new(),
                timing_guidelines: None,
            },
            Some(false) => ScheduleFact {
                direction: ScheduleDirection::CityToAirport,
                airport_to_city: None,
                departures: city.departures.clone(),
                timing_guidelines: Some(city.timing_guidelines.clone()),
            },
            // Direction not stated: both halves, timetable first.
            None => ScheduleFact {
                direction: ScheduleDirection::CityToAirport,
                airport_to_city: Some(schedules.airport_to_city.clone()),
                departures: city.departures.clone(),
                timing_guidelines: Some(city.timing_guidelines.clone()),
            },
        };
        FactEntry::Schedule(fact)
    }

    fn pricing(&self, normalized: &str, context: Option<&SessionContext>) -> FactEntry {
        let pricing = &self.store.pricing;
        let focus = self
            .classifier
            .mentioned_tier(normalized)
            .or_else(|| context.and_then(|c| c.last_service_type));
        FactEntry::Pricing(PricingFact {
            currency: pricing.currency.clone(),
            trip: self.trip(normalized),
            focus,
            tiers: vec![pricing.standard.clone(), pricing.plus.clone()],
            features: pricing.features.clone(),
            youth_age_range: pricing.youth_age_range.clone(),
            child_age_range: pricing.child_age_range.clone(),
            limits: pricing.limits,
        })
    }

    fn comparison(&self) -> FactEntry {
        let pricing = &self.store.pricing;
        let standard = &pricing.standard;
        let plus = &pricing.plus;
        let differences = vec![
            format!("{}: {}", standard.name, standard.description),
            format!("{}: {}", plus.name, plus.description),
            format!(
                "{} costs {} {} more per adult one way ({} vs {})",
                plus.name,
                plus.one_way.adult.saturating_sub(standard.one_way.adult),
                pricing.currency,
                plus.one_way.adult,
                standard.one_way.adult
            ),
            format!(
                "Both tiers carry children ({}) free of charge",
                pricing.child_age_range
            ),
        ];
        FactEntry::Comparison(ComparisonFact {
            currency: pricing.currency.clone(),
            standard: standard.clone(),
            plus: plus.clone(),
            differences,
        })
    }

    fn pickup_timing(&self) -> FactEntry {
        let guidance = &self.store.locations.guidance;
        FactEntry::PickupTiming(PickupTimingFact {
            pickup_window: guidance.pickup_window.clone(),
            waiting_time: guidance.waiting_time.clone(),
            arrival_instructions: guidance.arrival_instructions.clone(),
            booking_notice: guidance.booking_notice.clone(),
            contact: guidance.contact.clone(),
        })
    }

    fn recommendation(&self, normalized: &str) -> FactEntry {
        let pricing = &self.store.pricing;
        let mut reasons = Vec::new();
        let recommended = if PLUS_NEED_RE.is_match(normalized) {
            reasons.push(pricing.plus.description.clone());
            reasons.push("Saves the transfer from BSÍ Bus Terminal with luggage".to_string());
            ServiceTier::Plus
        } else if BUDGET_RE.is_match(normalized) {
            reasons.push(format!(
                "Lowest fare: {} {} per adult one way",
                pricing.standard.one_way.adult, pricing.currency
            ));
            reasons.push(pricing.standard.description.clone());
            ServiceTier::Standard
        } else {
            reasons.push(pricing.plus.description.clone());
            reasons.push(format!(
                "{} is the cheaper option if you are happy to continue from BSÍ yourself",
                pricing.standard.name
            ));
            ServiceTier::Plus
        };
        FactEntry::Recommendation(RecommendationFact {
            recommended,
            reasons,
            standard: pricing.standard.clone(),
            plus: pricing.plus.clone(),
        })
    }

    fn booking(&self, normalized: &str, context: Option<&SessionContext>) -> FactEntry {
        let tier = self
            .classifier
            .mentioned_tier(normalized)
            .or_else(|| context.and_then(|c| c.last_service_type));
        let mut notes = vec![
            "Book online - skip the lines!".to_string(),
            "No booking fees".to_string(),
        ];
        if tier != Some(ServiceTier::Standard) {
            notes.push(self.store.locations.guidance.booking_notice.clone());
        }
        FactEntry::Booking(BookingFact {
            booking_url: BOOKING_URL.to_string(),
            tier,
            trip: self.trip(normalized),
            notes,
            cancellation: self.store.policies.cancellation.clone(),
        })
    }

    /// Re-run the previous topic's handler against a message that matched nothing.
    fn continue_topic(
        &self,
        topic: Topic,
        message: &str,
        normalized: &str,
        context: Option<&SessionContext>,
        bundle: &mut Bundle,
        deltas: &mut Deltas,
    ) {
        if topic.is_trivial() {
            return;
        }
        let confidence = self.config.retrieval.continuation_confidence;
        let entries: Vec<FactEntry> = match topic {
            t if t.is_flight() => {
                let resolution = self.flight(normalized, context);
                let entry = resolution.clone().into_fact();
                deltas.flight = Some(resolution);
                vec![entry]
            }
            t if t.is_location() => self.locations(message),
            Topic::GroupPricing => {
                let Some(group) = context.and_then(|c| c.group_details) else {
                    return;
                };
                // Re-price the known party under whatever tier or trip the follow-up names.
                let tier = self.tier(normalized, context);
                vec![FactEntry::GroupPricing(calculate_group_fare(
                    &self.store.pricing,
                    &group,
                    tier,
                    self.trip(normalized),
                ))]
            }
            Topic::Comparison => vec![self.comparison()],
            Topic::PickupTiming => vec![self.pickup_timing()],
            Topic::Recommendation => vec![self.recommendation(normalized)],
            Topic::Booking => vec![self.booking(normalized, context)],
            Topic::ServiceOverview => vec![FactEntry::ServiceOverview(self.store.service.clone())],
            Topic::Fleet => vec![FactEntry::Fleet(self.store.fleet.clone())],
            Topic::Policy => vec![FactEntry::Policy(self.store.policies.clone())],
            Topic::Safety => vec![FactEntry::Safety(self.store.safety.clone())],
            Topic::Schedule => vec![self.schedule(normalized)],
            Topic::Pricing => vec![self.pricing(normalized, context)],
            Topic::Luggage => vec![FactEntry::Luggage(self.store.luggage.clone())],
            Topic::SpecialServices => {
                vec![FactEntry::SpecialServices(self.store.special_services.clone())]
            }
            Topic::Route => vec![FactEntry::Route(self.store.route.clone())],
            _ => Vec::new(),
        };
        if !entries.is_empty() {
            tracing::debug!(topic = ?topic, "[KnowledgeRetriever] Continuing previous topic");
        }
        bundle.extend(entries, confidence);
    }

    fn tier(&self, normalized: &str, context: Option<&SessionContext>) -> ServiceTier {
        self.classifier
            .mentioned_tier(normalized)
            .or_else(|| context.and_then(|c| c.last_service_type))
            .unwrap_or_default()
    }

    fn trip(&self, normalized: &str) -> TripType {
        if self.classifier.mentions_return_trip(normalized) {
            TripType::Return
        } else {
            TripType::OneWay
        }
    }

    // ========================================================================
    // Context merge
    // ========================================================================

    fn merge_context(
        &self,
        message: &str,
        context: Option<&SessionContext>,
        bundle: &Bundle,
        deltas: Deltas,
    ) -> SessionContext {
        let mut ctx = context.cloned().unwrap_or_default();
        ctx.language = detect_language(message);
        ctx.timestamp = self.clock.now();

        // Small talk and yes/no replies keep the previous topic alive for follow-ups.
        if let Some(primary) = bundle.entries.first() {
            if !primary.is_trivial() {
                ctx.last_topic = Some(primary.topic());
                ctx.last_query = Some(message.to_string());
            }
        }

        if let Some(flight) = deltas.flight {
            if let Some(time) = flight.flight_time() {
                ctx.flight_time = Some(time);
            }
            if let Some(destination) = flight.destination() {
                ctx.flight_destination = Some(destination);
            }
            ctx.needs_destination = flight.needs_destination();
        }
        if let Some(group) = deltas.group {
            ctx.group_details = Some(group);
            ctx.is_group_booking = true;
        }
        if let Some(tier) = deltas.tier {
            ctx.last_service_type = Some(tier);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::classifier::SmallTalk;
    use crate::session::ManualClock;
    use crate::types::{AgeBand, ClockTime, Destination, Language};
    use chrono::{Duration, TimeZone, Utc};

    fn retriever() -> KnowledgeRetriever {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        KnowledgeRetriever::with_clock(
            Arc::new(FactStore::load().unwrap()),
            DialogueConfig::default(),
            Arc::new(clock),
        )
    }

    fn topics(result: &RetrievalResult) -> Vec<Topic> {
        result.relevant_info.iter().map(FactEntry::topic).collect()
    }

    #[test]
    fn test_greeting_short_circuits() {
        let result = retriever().retrieve("Hi!", None);
        assert_eq!(result.intent, QueryIntent::CasualChat);
        assert_eq!(
            result.relevant_info,
            vec![FactEntry::CasualChat(SmallTalk::Greeting)]
        );
        assert_eq!(result.confidence, 1.0);
        assert!(result.is_trivial());
        assert_eq!(result.context.last_topic, None);
    }

    #[test]
    fn test_retrieval_is_idempotent() {
        let retriever = retriever();
        let mut ctx = SessionContext::new("s1", Utc::now());
        ctx.flight_destination = Some(Destination::Europe);
        for message in [
            "How much is Flybus+ return?",
            "What about 14:30?",
            "Where is Hotel Borg?",
            "2 adults and 1 child",
            "lorem ipsum",
        ] {
            let first = retriever.retrieve(message, Some(&ctx));
            let second = retriever.retrieve(message, Some(&ctx));
            assert_eq!(first.relevant_info, second.relevant_info, "{message}");
            assert_eq!(first.confidence, second.confidence, "{message}");
        }
    }

    #[test]
    fn test_group_turn_with_context_is_deterministic() {
        let retriever = retriever();
        let mut ctx = SessionContext::new("s1", Utc::now());
        ctx.group_details = Some(GroupComposition::new(1, 0, 0));
        ctx.last_service_type = Some(ServiceTier::Plus);

        let first = retriever.retrieve("2 adults and 1 child, return", Some(&ctx));
        let second = retriever.retrieve("2 adults and 1 child, return", Some(&ctx));
        assert_eq!(first.relevant_info, second.relevant_info);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.context, second.context);
        assert_eq!(first.context.group_details, Some(GroupComposition::new(3, 0, 1)));
        // The stored context is untouched; merging happens on the returned copy.
        assert_eq!(ctx.group_details, Some(GroupComposition::new(1, 0, 0)));
    }

    #[test]
    fn test_several_buckets_contribute() {
        let result = retriever().retrieve("What is the price and how much luggage can I bring?", None);
        assert_eq!(result.intent, QueryIntent::General);
        assert_eq!(topics(&result), vec![Topic::Pricing, Topic::Luggage]);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.context.last_topic, Some(Topic::Pricing));
    }

    #[test]
    fn test_sparse_stored_context() {
        let retriever = retriever();

        let empty: SessionContext = serde_json::from_str("{}").unwrap();
        assert_eq!(
            retriever.retrieve("Where is Hotel Borg?", Some(&empty)).relevant_info,
            retriever.retrieve("Where is Hotel Borg?", None).relevant_info
        );

        let partial: SessionContext =
            serde_json::from_str(r#"{"lastTopic":"pricing","lastServiceType":"plus"}"#).unwrap();
        let result = retriever.retrieve("and for a return trip?", Some(&partial));
        assert_eq!(result.intent, QueryIntent::FollowUp);
        let FactEntry::Pricing(pricing) = &result.relevant_info[0] else {
            panic!("expected pricing, got {:?}", result.relevant_info);
        };
        assert_eq!(pricing.focus, Some(ServiceTier::Plus));
        assert_eq!(pricing.trip, TripType::Return);
        assert_eq!(result.context.last_service_type, Some(ServiceTier::Plus));
        assert_eq!(result.context.flight_time, None);

        let partial: SessionContext = serde_json::from_str(r#"{"lastTopic":"luggage"}"#).unwrap();
        let result = retriever.retrieve("and a surfboard?", Some(&partial));
        assert_eq!(topics(&result), vec![Topic::Luggage]);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_unrecognized_without_context_is_empty() {
        let result = retriever().retrieve("lorem ipsum dolor", None);
        assert!(result.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.context.last_topic, None);
    }

    #[test]
    fn test_flight_departures_for_both_destinations() {
        let retriever = retriever();
        let result = retriever.retrieve("My flight is at 10:00 to London", None);
        match &result.relevant_info[0] {
            FactEntry::FlightSchedule(fact) => {
                assert_eq!(fact.recommended.pickup, ClockTime::parse("05:00").unwrap());
                assert_eq!(fact.recommended.bsi, ClockTime::parse("05:30").unwrap());
                assert_eq!(fact.latest_airport_arrival, ClockTime::parse("07:30").unwrap());
            }
            other => panic!("expected flight schedule, got {other:?}"),
        }
        assert_eq!(result.context.last_topic, Some(Topic::FlightSchedule));
        assert_eq!(result.context.flight_destination, Some(Destination::Europe));

        let result = retriever.retrieve("Flight at 9:00 to the US", None);
        match &result.relevant_info[0] {
            FactEntry::FlightSchedule(fact) => {
                assert_eq!(fact.recommended.pickup, ClockTime::parse("04:00").unwrap());
                assert_eq!(fact.latest_airport_arrival, ClockTime::parse("06:00").unwrap());
            }
            other => panic!("expected flight schedule, got {other:?}"),
        }
    }

    #[test]
    fn test_flight_pair_completed_over_two_turns() {
        let retriever = retriever();
        let first = retriever.retrieve("My flight is at 14:30", None);
        assert_eq!(first.context.last_topic, Some(Topic::FlightInquiry));
        assert!(first.context.needs_destination);
        assert_eq!(first.context.flight_time, ClockTime::parse("14:30"));

        let second = retriever.retrieve("to Europe", Some(&first.context));
        match &second.relevant_info[0] {
            FactEntry::FlightSchedule(fact) => {
                assert_eq!(fact.recommended.bsi, ClockTime::parse("09:30").unwrap());
            }
            other => panic!("expected flight schedule, got {other:?}"),
        }
        assert!(!second.context.needs_destination);
        assert_eq!(second.context.flight_time, ClockTime::parse("14:30"));
    }

    #[test]
    fn test_group_details_are_summed_across_turns() {
        let retriever = retriever();
        let mut ctx = SessionContext::new("s1", Utc::now());
        ctx.group_details = Some(GroupComposition::new(1, 2, 0));

        let result = retriever.retrieve("2 adults and 1 child", Some(&ctx));
        assert_eq!(result.intent, QueryIntent::GroupBooking);
        let FactEntry::GroupPricing(fare) = &result.relevant_info[0] else {
            panic!("expected group pricing");
        };
        assert_eq!(fare.group, GroupComposition::new(3, 2, 1));
        assert_eq!(fare.subtotal(AgeBand::Child), 0);
        assert_eq!(fare.tier, ServiceTier::Standard);
        assert_eq!(result.context.group_details, Some(GroupComposition::new(3, 2, 1)));
        assert!(result.context.is_group_booking);
    }

    #[test]
    fn test_group_uses_context_tier() {
        let retriever = retriever();
        let mut ctx = SessionContext::new("s1", Utc::now());
        ctx.last_service_type = Some(ServiceTier::Plus);
        let result = retriever.retrieve("we are 2 adults, return please", Some(&ctx));
        let FactEntry::GroupPricing(fare) = &result.relevant_info[0] else {
            panic!("expected group pricing");
        };
        assert_eq!(fare.tier, ServiceTier::Plus);
        assert_eq!(fare.trip, TripType::Return);
        assert_eq!(fare.total, 2 * 9899);
    }

    #[test]
    fn test_hotel_lookup() {
        let result = retriever().retrieve("Where is the pickup for Hotel Borg?", None);
        let hotel = result.relevant_info.iter().find_map(|e| match e {
            FactEntry::HotelLocation(fact) => Some(fact),
            _ => None,
        });
        assert_eq!(hotel.map(|h| h.bus_stop.number), Some(3));
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn test_unresolved_location_gives_guidance() {
        let result = retriever().retrieve("where do I get picked up", None);
        assert!(topics(&result).contains(&Topic::Location));
    }

    #[test]
    fn test_pricing_focus_and_tier_memory() {
        let result = retriever().retrieve("How much is Flybus+ return?", None);
        let pricing = result.relevant_info.iter().find_map(|e| match e {
            FactEntry::Pricing(fact) => Some(fact),
            _ => None,
        });
        let pricing = pricing.expect("pricing entry");
        assert_eq!(pricing.focus, Some(ServiceTier::Plus));
        assert_eq!(pricing.trip, TripType::Return);
        assert_eq!(result.context.last_service_type, Some(ServiceTier::Plus));
    }

    #[test]
    fn test_topics_are_not_duplicated() {
        let result = retriever().retrieve("Tell me about the flybus service", None);
        assert_eq!(result.intent, QueryIntent::ServiceInfo);
        let count = topics(&result)
            .iter()
            .filter(|t| **t == Topic::ServiceOverview)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_continuation_replays_previous_topic() {
        let retriever = retriever();
        let mut ctx = SessionContext::new("s1", Utc::now());
        ctx.last_topic = Some(Topic::Luggage);
        let result = retriever.retrieve("and a surfboard?", Some(&ctx));
        assert_eq!(topics(&result), vec![Topic::Luggage]);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_trivial_reply_keeps_topic() {
        let retriever = retriever();
        let mut ctx = SessionContext::new("s1", Utc::now());
        ctx.last_topic = Some(Topic::Pricing);
        let result = retriever.retrieve("ok", Some(&ctx));
        assert_eq!(result.relevant_info, vec![FactEntry::Acknowledgment]);
        assert_eq!(result.context.last_topic, Some(Topic::Pricing));
    }

    #[test]
    fn test_language_and_timestamp_recorded() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        let retriever = KnowledgeRetriever::with_clock(
            Arc::new(FactStore::load().unwrap()),
            DialogueConfig::default(),
            Arc::new(clock.clone()),
        );
        clock.advance(Duration::minutes(5));
        let result = retriever.retrieve("Hvað kostar miðinn?", None);
        assert_eq!(result.context.language, Language::Icelandic);
        assert_eq!(result.context.timestamp, clock.now());
    }
}
