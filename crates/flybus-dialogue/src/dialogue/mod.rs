//! Rule-based dialogue core: classify a message, resolve its entities and
//! assemble the fact bundle for the response layer.

pub mod classifier;
pub mod facts;
pub mod flight;
pub mod group;
pub mod location;
pub mod retriever;

pub use classifier::{BucketMatch, IntentClassifier, QueryIntent, SmallTalk, TopicBucket};
pub use facts::{FactEntry, RetrievalResult, Topic};
pub use flight::{extract_destination, extract_time, resolve_flight_timing, FlightResolution};
pub use group::{calculate_group_fare, parse_group_composition, GroupFare};
pub use location::{resolve_location, LocationMatch, LocationResolution};
pub use retriever::KnowledgeRetriever;
