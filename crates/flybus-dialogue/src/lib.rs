//! Rule-based dialogue front end for the Flybus airport transfer assistant.
//!
//! A message is normalized, classified, resolved against the compiled-in
//! knowledge base and turned into a typed fact bundle. The chat layer then
//! answers trivial turns directly and hands everything else to an LLM.

pub mod chat;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod knowledge;
pub mod session;
pub mod text;
pub mod types;

// Re-export primary types for convenience
pub use chat::{ChatReply, ChatService, ExchangeBroadcaster, LlmClient, ResponseDispatcher};
pub use config::DialogueConfig;
pub use dialogue::{FactEntry, KnowledgeRetriever, QueryIntent, RetrievalResult, Topic};
pub use error::{KnowledgeError, SessionError};
pub use knowledge::FactStore;
pub use session::{SessionContext, SessionStore};
pub use types::{ClockTime, Destination, GroupComposition, Language, ServiceTier, TripType};

// Re-export common types
pub use anyhow::{Error, Result};
