//! Per-session dialogue state carried between turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialogue::facts::Topic;
use crate::types::{ClockTime, Destination, GroupComposition, Language, ServiceTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Dialogue state for one session.
///
/// Every field has a default so partially stored or hand-built contexts are
/// accepted as-is; absent values simply mean "not known yet".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: String,
    pub language: Language,
    /// Last touch; drives expiry.
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<ContextMessage>,

    pub last_topic: Option<Topic>,
    pub last_query: Option<String>,

    // Flight sub-dialogue
    pub flight_time: Option<ClockTime>,
    pub flight_destination: Option<Destination>,
    pub needs_destination: bool,

    pub last_service_type: Option<ServiceTier>,
    pub is_group_booking: bool,
    pub group_details: Option<GroupComposition>,

    /// Bumped on every committed write; used for compare-and-swap.
    pub revision: u64,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: now,
            ..Self::default()
        }
    }

    /// Append a message, keeping at most `max_history` of the newest.
    pub fn push_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        now: DateTime<Utc>,
        max_history: usize,
    ) {
        self.messages.push(ContextMessage {
            role,
            content: content.into(),
            timestamp: now,
        });
        if self.messages.len() > max_history {
            let excess = self.messages.len() - max_history;
            self.messages.drain(..excess);
        }
    }

    pub fn recent_messages(&self, n: usize) -> &[ContextMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn format_history(&self, max_turns: usize) -> String {
        self.recent_messages(max_turns)
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped() {
        let now = Utc::now();
        let mut ctx = SessionContext::new("s1", now);
        for i in 0..5 {
            ctx.push_message(MessageRole::User, format!("m{}", i), now, 3);
        }
        assert_eq!(ctx.messages.len(), 3);
        assert_eq!(ctx.messages[0].content, "m2");
        assert_eq!(ctx.format_history(2), "user: m3\nuser: m4");
    }

    #[test]
    fn test_partial_context_deserializes_with_defaults() {
        let ctx: SessionContext =
            serde_json::from_str(r#"{"sessionId":"abc","flightDestination":"europe"}"#).unwrap();
        assert_eq!(ctx.session_id, "abc");
        assert_eq!(ctx.flight_destination, Some(Destination::Europe));
        assert!(ctx.flight_time.is_none());
        assert!(ctx.messages.is_empty());
    }
}
