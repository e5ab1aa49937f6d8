//! Intent Classifier
//!
//! Two layers, both driven by explicit tables so their order is visible:
//!
//! 1. `INTENT_RULES`: an ordered rule list assigning one primary intent. The
//!    categories overlap ("compare the schedule" looks like both a comparison
//!    and a schedule query), so the first matching rule wins.
//! 2. `TOPIC_BUCKETS`: non-exclusive keyword buckets. A message mentioning both
//!    "price" and "luggage" lands in both, each with its own confidence.
//!
//! Every function here takes text already passed through [`normalize`].
//!
//! [`normalize`]: crate::text::normalize

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::facts::Topic;
use super::{flight, group};
use crate::session::SessionContext;
use crate::text::fuzzy_match_term;

// ============================================================================
// Core Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    // Answered without retrieval
    CasualChat,
    // Short-circuits to group pricing
    GroupBooking,

    Comparison,
    PickupTiming,
    FlightSchedule,
    ServiceInfo,
    Recommendation,
    Booking,
    FollowUp,

    // Full-message replies
    Acknowledgment,
    Negation,
    Confirmation,

    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmallTalk {
    Greeting,
    HowAreYou,
    Thanks,
    Farewell,
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicBucket {
    ServiceOverview,
    Fleet,
    Policy,
    Safety,
    Location,
    Schedule,
    Pricing,
    Luggage,
    SpecialServices,
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketMatch {
    pub bucket: TopicBucket,
    pub confidence: f32,
}

struct IntentRule {
    intent: QueryIntent,
    confidence: f32,
    matches: fn(&str) -> bool,
}

struct BucketRule {
    bucket: TopicBucket,
    confidence: f32,
    matches: fn(&str) -> bool,
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("intent regex is valid"));
    };
}

// ============================================================================
// Intent patterns
// ============================================================================

pattern!(GREETING_RE, r"^(hi|hello|hey|hae|hallo|sael|saell|saelir|greetings|good (morning|afternoon|evening|day)|godan (daginn|dag)|godt kvold)( there| all| everyone| flybus)?$");
pattern!(HOW_ARE_YOU_RE, r"^(hi |hello |hey )?(how are you( doing)?( today)?|how is it going|how'?s it going|hvernig hefur thu (thad|that)|hvad segir thu)$");
pattern!(THANKS_RE, r"^(ok |okay |great |perfect )?(thanks?( you)?( so much| very much| a lot| for (the|your) help)?|thx|ty|cheers|takk( fyrir( mig| hjalpina)?)?( kaerlega)?|thakka (ther|thjer)( fyrir)?)$");
pattern!(FAREWELL_RE, r"^(bye|goodbye|good bye|see you( later)?|bless|bae|have a (good|nice) (day|one))$");
pattern!(IDENTITY_RE, r"^(who are you|what are you|are you (a |an )?(bot|robot|human|ai|real person)|hver ert thu)$");

pattern!(COMPARISON_RE, r"\b(compare|comparison|comparing|difference|differences|differ|versus|vs)\b|which (one )?is (cheaper|better|faster|quicker)|(standard|flybus|regular) or (the )?(plus|flybus\+|flybus plus)|(plus|flybus\+) or (the )?(standard|regular|flybus\b)");
pattern!(PICKUP_TIMING_RE, r"when (will|do|does|should|must|can) .*(pick(ed)? ?-?up|pick (me|us|you|them) up|be ready|collect)|pick ?-?up time|what time .*pick ?-?up|\b(be|get) ready\b|when ready|waiting time|how long .*wait|wait(ing)? for (the )?(bus|coach|pick ?-?up)");
pattern!(FLIGHT_SCHEDULE_RE, r"arriving at|my flight|flight (is |leaves |departs |takes off )?(at|is at)|what time .*flight|flight time|catch (my|a|the) flight|departing flight|i (am |m )?flying|i fly\b|plane (leaves|departs)|take ?off");
pattern!(SERVICE_INFO_RE, r"what is (the )?fly ?bus|tell me (more )?about (the )?(fly ?bus|service)|what (do you|does flybus) offer|what services|how does (the )?(fly ?bus|service) work|about (the|your) service");
pattern!(RECOMMENDATION_RE, r"\b(recommend\w*|suggest\w*|advice|advise)\b|should i (take|choose|book|get|pick)|which (one|option|service|ticket|tier) (should|would|do you)|best option|is it worth|worth it");
pattern!(BOOKING_RE, r"\b(book|booking|reserve|reservation|purchase)\b|\bbuy (a |the )?tickets?|where (can|do) i (get|buy) (a |the )?tickets?|how (do|can) i (get|buy) (a |the )?tickets?");
pattern!(FOLLOW_UP_RE, r"^(and|what about|how about|also|what if|and what about|same for|and for)\b");
pattern!(ACKNOWLEDGMENT_RE, r"^(ok|okay|k|alright|all right|got it|i see|great|perfect|cool|nice|understood|sounds good|awesome|fine|good|allt i lagi|flott|frabaert|skil)$");
pattern!(NEGATION_RE, r"^(no|nope|nah|not really|no thanks?|no thank you|nothing else|that'?s all|nei|nei takk)$");
pattern!(CONFIRMATION_RE, r"^(yes|yeah|yep|yup|sure|correct|right|exactly|of course|that'?s right|ja|jaja|ja takk|yes please)$");

static INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: QueryIntent::CasualChat,
        confidence: 1.0,
        matches: |t| small_talk(t).is_some(),
    },
    IntentRule {
        intent: QueryIntent::GroupBooking,
        confidence: 0.95,
        matches: group::mentions_group_size,
    },
    IntentRule {
        intent: QueryIntent::Comparison,
        confidence: 0.9,
        matches: |t| COMPARISON_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::PickupTiming,
        confidence: 0.9,
        matches: |t| PICKUP_TIMING_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::FlightSchedule,
        confidence: 0.9,
        matches: |t| FLIGHT_SCHEDULE_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::ServiceInfo,
        confidence: 0.9,
        matches: |t| SERVICE_INFO_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::Recommendation,
        confidence: 0.85,
        matches: |t| RECOMMENDATION_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::Booking,
        confidence: 0.85,
        matches: |t| BOOKING_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::FollowUp,
        confidence: 0.0,
        matches: |t| FOLLOW_UP_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::Acknowledgment,
        confidence: 0.9,
        matches: |t| ACKNOWLEDGMENT_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::Negation,
        confidence: 0.9,
        matches: |t| NEGATION_RE.is_match(t),
    },
    IntentRule {
        intent: QueryIntent::Confirmation,
        confidence: 0.9,
        matches: |t| CONFIRMATION_RE.is_match(t),
    },
];

// ============================================================================
// Topic buckets
// ============================================================================

pattern!(SERVICE_OVERVIEW_RE, r"\b(airport transfer|airport shuttle|shuttle)\b");
pattern!(FLEET_RE, r"\b(fleet|coach|coaches|vehicles?|wifi|wi fi|usb|toilets?|restrooms?|amenit(y|ies)|emissions?|eco|environment\w*)\b");
pattern!(POLICY_RE, r"\b(smok\w*|vap\w*|pets?|dogs?|cats?|food|drinks?|eat\w*|cancel\w*|refund\w*|miss(ed)?|delay(ed|s)?|late|policy|policies|rules?)\b");
pattern!(SAFETY_RE, r"\b(safe|safety|seat ?belts?|drivers?|winter|snow\w*|storms?|weather|emergenc\w*|road conditions|icy)\b");
pattern!(LOCATION_RE, r"\b(hotels?|hostels?|guest ?houses?|apartments?|apts?|stay\w*|locat\w*|pick ?-?ups?|picked up|where|bus ?stops?|stop (no |number |nr )?\d+|drop ?-?off|drop\w*|downtown|terminal|bsi|address|area|near(est)?|hotl|htl|ghouse)\b");
pattern!(SCHEDULE_RE, r"\b(schedules?|timetables?|times?|when|depart\w*|arriv\w*|late|miss\w*|first bus|last bus|how often|frequen\w*|every day|daily|flight|aaetlun)\b");
pattern!(PRICING_RE, r"\b(prices?|pricing|costs?|fees?|fares?|tickets?|how much|isk|kr|krona|kronur|cheap\w*|expensive|discount\w*|pay|verd|return|round ?trip)\b");
pattern!(LUGGAGE_RE, r"\b(luggage|lugage|baggage|bags?|suitcases?|bicycles?|bikes?|weight|kg|carry ?-?on|carry|golf|ski|skis|skiing|bag ?drop|farangur)\b");
pattern!(SPECIAL_SERVICES_RE, r"\b(child|children|kids?|child seats?|car seats?|booster|babies|baby|infants?|wheelchairs?|disabled|disability|accessib\w*|special|service animals?|guide dogs?|animals?|strollers?|prams?)\b");
pattern!(ROUTE_RE, r"\b(route|journey|path|distance|how far|far|how long|minutes|duration|via|gardabaer|hafnarfjordur|stops along|way to)\b");

static TOPIC_BUCKETS: &[BucketRule] = &[
    BucketRule {
        bucket: TopicBucket::ServiceOverview,
        confidence: 0.9,
        matches: |t| {
            SERVICE_OVERVIEW_RE.is_match(t)
                || fuzzy_match_term(t, "flybus")
                || fuzzy_match_term(t, "keflavik")
        },
    },
    BucketRule {
        bucket: TopicBucket::Fleet,
        confidence: 0.85,
        matches: |t| FLEET_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Policy,
        confidence: 0.85,
        matches: |t| POLICY_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Safety,
        confidence: 0.85,
        matches: |t| SAFETY_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Location,
        confidence: 0.9,
        matches: |t| LOCATION_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Schedule,
        confidence: 0.9,
        matches: |t| SCHEDULE_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Pricing,
        confidence: 0.9,
        matches: |t| PRICING_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Luggage,
        confidence: 0.8,
        matches: |t| LUGGAGE_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::SpecialServices,
        confidence: 0.8,
        matches: |t| SPECIAL_SERVICES_RE.is_match(t),
    },
    BucketRule {
        bucket: TopicBucket::Route,
        confidence: 0.9,
        matches: |t| ROUTE_RE.is_match(t),
    },
];

pattern!(FLIGHT_CUE_RE, r"\b(flight|flights|flying|fly out|plane|check ?-?in|boarding|take ?off)\b");
pattern!(AIRPORT_TO_CITY_RE, r"\bfrom (the )?(airport|kef|keflavik)\b|\b(arriv\w*|land\w*)\b|\b(airport|kef|keflavik) to\b");
pattern!(CITY_TO_AIRPORT_RE, r"\bto (the )?(airport|kef|keflavik)\b");
pattern!(RETURN_TRIP_RE, r"\b(return|round ?-?trip|both ways|two ways|back and forth|there and back|fram og til baka)\b");
pattern!(PLUS_TIER_RE, r"\bplus\b|hotel pick ?-?up|hotel transfer|door to door|from (my|the) hotel");
pattern!(STANDARD_TIER_RE, r"\b(standard|regular|basic)\b|\bonly to (the )?(bsi|terminal)\b");

/// Trim punctuation so "Hi!" and "thanks." are full-message matches.
fn bare(normalized: &str) -> &str {
    normalized.trim_matches(|c: char| c.is_whitespace() || matches!(c, '!' | '?' | '.' | ',' | ':' | ')' | '('))
}

/// Greeting or small talk filling the whole message.
pub fn small_talk(normalized: &str) -> Option<SmallTalk> {
    let text = bare(normalized);
    if GREETING_RE.is_match(text) {
        Some(SmallTalk::Greeting)
    } else if HOW_ARE_YOU_RE.is_match(text) {
        Some(SmallTalk::HowAreYou)
    } else if THANKS_RE.is_match(text) {
        Some(SmallTalk::Thanks)
    } else if FAREWELL_RE.is_match(text) {
        Some(SmallTalk::Farewell)
    } else if IDENTITY_RE.is_match(text) {
        Some(SmallTalk::Identity)
    } else {
        None
    }
}

// ============================================================================
// Classifier
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Primary intent: first matching rule in `INTENT_RULES`.
    pub fn classify(&self, normalized: &str) -> QueryIntent {
        let text = bare(normalized);
        INTENT_RULES
            .iter()
            .find(|rule| (rule.matches)(text))
            .map(|rule| rule.intent)
            .unwrap_or(QueryIntent::General)
    }

    pub fn confidence(&self, intent: QueryIntent) -> f32 {
        INTENT_RULES
            .iter()
            .find(|rule| rule.intent == intent)
            .map(|rule| rule.confidence)
            .unwrap_or(0.0)
    }

    /// Rule order, exposed for inspection.
    pub fn rule_order(&self) -> Vec<QueryIntent> {
        INTENT_RULES.iter().map(|rule| rule.intent).collect()
    }

    /// Every keyword bucket the message falls into, in table order.
    pub fn buckets(&self, normalized: &str) -> Vec<BucketMatch> {
        TOPIC_BUCKETS
            .iter()
            .filter(|rule| (rule.matches)(normalized))
            .map(|rule| BucketMatch {
                bucket: rule.bucket,
                confidence: rule.confidence,
            })
            .collect()
    }

    /// Should the flight-timing resolver run for this turn?
    ///
    /// Explicit flight vocabulary, a time together with a destination, or a
    /// pending flight sub-dialogue that this message adds a piece to.
    pub fn indicates_flight(&self, normalized: &str, ctx: Option<&SessionContext>) -> bool {
        if FLIGHT_CUE_RE.is_match(normalized) || FLIGHT_SCHEDULE_RE.is_match(normalized) {
            return true;
        }
        let time = flight::extract_time(normalized);
        let destination = flight::extract_destination(normalized);
        if time.is_some() && destination.is_some() {
            return true;
        }
        let pending = ctx.is_some_and(|c| {
            c.needs_destination || c.last_topic == Some(Topic::FlightInquiry)
        });
        pending && (time.is_some() || destination.is_some())
    }

    pub fn mentions_return_trip(&self, normalized: &str) -> bool {
        RETURN_TRIP_RE.is_match(normalized)
    }

    /// Schedule direction cue; `None` when the message does not say.
    pub fn airport_to_city(&self, normalized: &str) -> Option<bool> {
        if CITY_TO_AIRPORT_RE.is_match(normalized) {
            Some(false)
        } else if AIRPORT_TO_CITY_RE.is_match(normalized) {
            Some(true)
        } else {
            None
        }
    }

    /// Service tier named in the message, if any.
    pub fn mentioned_tier(&self, normalized: &str) -> Option<crate::types::ServiceTier> {
        use crate::types::ServiceTier;
        if fuzzy_match_term(normalized, "flybus plus") || PLUS_TIER_RE.is_match(normalized) {
            Some(ServiceTier::Plus)
        } else if STANDARD_TIER_RE.is_match(normalized) {
            Some(ServiceTier::Standard)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;
    use crate::types::ServiceTier;

    fn classify(text: &str) -> QueryIntent {
        IntentClassifier::new().classify(&normalize(text))
    }

    fn buckets(text: &str) -> Vec<TopicBucket> {
        IntentClassifier::new()
            .buckets(&normalize(text))
            .into_iter()
            .map(|m| m.bucket)
            .collect()
    }

    #[test]
    fn test_casual_chat_needs_whole_message() {
        assert_eq!(classify("Hi!"), QueryIntent::CasualChat);
        assert_eq!(classify("Good morning"), QueryIntent::CasualChat);
        assert_eq!(classify("Hæ"), QueryIntent::CasualChat);
        assert_eq!(classify("Thank you so much"), QueryIntent::CasualChat);
        assert_eq!(classify("how are you?"), QueryIntent::CasualChat);
        assert_ne!(classify("Hi, how much is the bus?"), QueryIntent::CasualChat);
        assert_ne!(classify("history of the flybus"), QueryIntent::CasualChat);
    }

    #[test]
    fn test_small_talk_kinds() {
        assert_eq!(small_talk("hello"), Some(SmallTalk::Greeting));
        assert_eq!(small_talk("takk fyrir"), Some(SmallTalk::Thanks));
        assert_eq!(small_talk("bye!"), Some(SmallTalk::Farewell));
        assert_eq!(small_talk("are you a bot?"), Some(SmallTalk::Identity));
        assert_eq!(small_talk("where is bus stop 3"), None);
    }

    #[test]
    fn test_group_beats_every_other_cue() {
        assert_eq!(
            classify("Compare prices for 2 adults and 1 child"),
            QueryIntent::GroupBooking
        );
    }

    #[test]
    fn test_rule_order_is_first_match_wins() {
        // Comparison comes before booking.
        assert_eq!(
            classify("Should I book Flybus or Flybus+? what's the difference"),
            QueryIntent::Comparison
        );
        assert_eq!(classify("When will you pick me up?"), QueryIntent::PickupTiming);
        assert_eq!(classify("My flight is at 10:00"), QueryIntent::FlightSchedule);
        assert_eq!(classify("What is the Flybus?"), QueryIntent::ServiceInfo);
        assert_eq!(classify("Which ticket should I get?"), QueryIntent::Recommendation);
        assert_eq!(classify("I want to book a ticket"), QueryIntent::Booking);
        assert_eq!(classify("What about 14:30?"), QueryIntent::FollowUp);
        assert_eq!(classify("ok"), QueryIntent::Acknowledgment);
        assert_eq!(classify("No thanks"), QueryIntent::Negation);
        assert_eq!(classify("yes"), QueryIntent::Confirmation);
        assert_eq!(classify("luggage allowance"), QueryIntent::General);

        let order = IntentClassifier::new().rule_order();
        assert_eq!(order[0], QueryIntent::CasualChat);
        assert_eq!(order[1], QueryIntent::GroupBooking);
        assert_eq!(order[2], QueryIntent::Comparison);
    }

    #[test]
    fn test_buckets_are_not_exclusive() {
        let b = buckets("What is the price and how much luggage can I bring?");
        assert!(b.contains(&TopicBucket::Pricing));
        assert!(b.contains(&TopicBucket::Luggage));
        assert!(buckets("Where is bus stop 8?").contains(&TopicBucket::Location));
        assert!(buckets("Is smoking allowed?").contains(&TopicBucket::Policy));
        assert!(buckets("do you have wheelchair access").contains(&TopicBucket::SpecialServices));
        assert!(buckets("how long is the journey").contains(&TopicBucket::Route));
        assert!(buckets("lorem ipsum").is_empty());
        assert!(buckets("is there an airport bus").contains(&TopicBucket::ServiceOverview));
        assert!(buckets("bus from KEF").contains(&TopicBucket::ServiceOverview));
    }

    #[test]
    fn test_flight_indicator() {
        let c = IntentClassifier::new();
        assert!(c.indicates_flight(&normalize("I have a flight tomorrow"), None));
        assert!(c.indicates_flight(&normalize("10:00 to Europe"), None));
        assert!(!c.indicates_flight(&normalize("What about 14:30?"), None));

        let mut ctx = SessionContext::default();
        ctx.needs_destination = true;
        assert!(c.indicates_flight(&normalize("What about 14:30?"), Some(&ctx)));
        assert!(!c.indicates_flight(&normalize("how much is it"), Some(&ctx)));
    }

    #[test]
    fn test_trip_and_tier_cues() {
        let c = IntentClassifier::new();
        assert!(c.mentions_return_trip(&normalize("price for a round trip")));
        assert!(!c.mentions_return_trip(&normalize("price one way")));
        assert_eq!(c.mentioned_tier(&normalize("how much is flybus+")), Some(ServiceTier::Plus));
        assert_eq!(c.mentioned_tier(&normalize("the standard bus")), Some(ServiceTier::Standard));
        assert_eq!(c.mentioned_tier(&normalize("how much is flybus")), None);
        assert_eq!(c.mentioned_tier(&normalize("is fly bus+ faster")), Some(ServiceTier::Plus));
        assert_eq!(c.mentioned_tier(&normalize("flybusplus to my hotel")), Some(ServiceTier::Plus));
        assert_eq!(c.airport_to_city(&normalize("bus to the airport")), Some(false));
        assert_eq!(c.airport_to_city(&normalize("I am arriving at KEF")), Some(true));
        assert_eq!(c.airport_to_city(&normalize("timetable")), None);
    }
}
