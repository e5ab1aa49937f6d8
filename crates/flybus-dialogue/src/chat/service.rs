//! Chat service: one inbound message to one reply, with session bookkeeping.
//!
//! The LLM and the live-feed broadcaster are injected collaborators. Neither
//! can fail a turn: an LLM error degrades to the fallback apology and a
//! broadcast error is only logged.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::dispatcher::{fallback_reply, ReplyKind, ResponseDispatcher, ResponsePlan};
use super::prompt::CompletionRequest;
use crate::config::DialogueConfig;
use crate::dialogue::{KnowledgeRetriever, QueryIntent, RetrievalResult};
use crate::error::SessionError;
use crate::knowledge::FactStore;
use crate::session::{MessageRole, SessionContext, SessionStore};
use crate::types::Language;

// ============================================================================
// Collaborators
// ============================================================================

/// Text completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// One user/bot exchange, published to the live conversation feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub bot_response: String,
    pub language: Language,
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
}

#[async_trait]
pub trait ExchangeBroadcaster: Send + Sync {
    async fn broadcast(&self, event: ConversationEvent) -> Result<()>;
}

/// Broadcaster for hosts without a live feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBroadcaster;

#[async_trait]
impl ExchangeBroadcaster for NoopBroadcaster {
    async fn broadcast(&self, _event: ConversationEvent) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub language: Language,
    pub kind: ReplyKind,
    pub intent: QueryIntent,
    pub confidence: f32,
}

pub struct ChatService {
    retriever: KnowledgeRetriever,
    sessions: Arc<SessionStore>,
    dispatcher: ResponseDispatcher,
    llm: Arc<dyn LlmClient>,
    broadcaster: Arc<dyn ExchangeBroadcaster>,
    config: DialogueConfig,
}

impl ChatService {
    pub fn new(
        store: Arc<FactStore>,
        config: DialogueConfig,
        llm: Arc<dyn LlmClient>,
        broadcaster: Arc<dyn ExchangeBroadcaster>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(&config.session));
        Self::with_parts(store, config, sessions, ResponseDispatcher::new(), llm, broadcaster)
    }

    /// Assemble from explicit parts; tests inject a clocked store and a seeded dispatcher.
    pub fn with_parts(
        store: Arc<FactStore>,
        config: DialogueConfig,
        sessions: Arc<SessionStore>,
        dispatcher: ResponseDispatcher,
        llm: Arc<dyn LlmClient>,
        broadcaster: Arc<dyn ExchangeBroadcaster>,
    ) -> Self {
        let retriever = KnowledgeRetriever::with_clock(store, config.clone(), sessions.clock());
        Self {
            retriever,
            sessions,
            dispatcher,
            llm,
            broadcaster,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn retriever(&self) -> &KnowledgeRetriever {
        &self.retriever
    }

    pub async fn handle(&self, session_id: &str, message: &str) -> Result<ChatReply> {
        let start = std::time::Instant::now();
        let result = self.retrieve_and_commit(session_id, message)?;
        let language = result.context.language;
        let plan = self.dispatcher.plan(&result, message);
        let mut kind = plan.kind();

        let (text, topic) = match plan {
            ResponsePlan::Canned { text, topic } => (text, topic.to_string()),
            ResponsePlan::Fallback { text } => (text, "unknown".to_string()),
            ResponsePlan::LlmPrompt(request) => {
                let topic = topic_label(&result);
                match self.llm.complete(request).await {
                    Ok(text) => (text, topic),
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session_id,
                            error = %e,
                            "[ChatService] LLM completion failed, using fallback reply"
                        );
                        kind = ReplyKind::Fallback;
                        (fallback_reply(language).to_string(), topic)
                    }
                }
            }
        };

        let now = self.sessions.clock().now();
        let max_history = self.config.session.max_history;
        self.sessions.update(session_id, |ctx| {
            ctx.push_message(MessageRole::Assistant, text.clone(), now, max_history);
        });

        let event = ConversationEvent {
            id: Uuid::new_v4(),
            timestamp: now,
            user_message: message.to_string(),
            bot_response: text.clone(),
            language,
            topic,
            kind,
        };
        if let Err(e) = self.broadcaster.broadcast(event).await {
            tracing::warn!(session_id = %session_id, error = %e, "[ChatService] Broadcast failed");
        }

        tracing::info!(
            session_id = %session_id,
            intent = ?result.intent,
            kind = ?kind,
            confidence = result.confidence,
            duration_ms = start.elapsed().as_millis() as u64,
            "[ChatService] Turn handled"
        );

        Ok(ChatReply {
            message: text,
            language,
            kind,
            intent: result.intent,
            confidence: result.confidence,
        })
    }

    /// Retrieve against the stored context and commit the user's turn, retrying
    /// when another request for the same session committed first.
    fn retrieve_and_commit(&self, session_id: &str, message: &str) -> Result<RetrievalResult> {
        let attempts = self.config.session.commit_retries.max(1);
        let mut last_error: Option<SessionError> = None;

        for attempt in 1..=attempts {
            let stored = self.sessions.get_or_create(session_id);
            let mut result = self.retriever.retrieve(message, Some(&stored));
            let mut next: SessionContext = result.context.clone();
            next.session_id = session_id.to_string();
            next.push_message(
                MessageRole::User,
                message,
                next.timestamp,
                self.config.session.max_history,
            );

            match self.sessions.commit(session_id, next) {
                Ok(committed) => {
                    result.context = committed;
                    return Ok(result);
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %session_id,
                        attempt,
                        "[ChatService] Session changed underneath, retrying"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => anyhow::Error::new(e).context(format!(
                "session {} kept changing across {} commit attempts",
                session_id, attempts
            )),
            None => anyhow::anyhow!("no commit attempt was made for session {}", session_id),
        })
    }
}

fn topic_label(result: &RetrievalResult) -> String {
    result
        .relevant_info
        .first()
        .and_then(|entry| serde_json::to_value(entry.topic()).ok())
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use chrono::TimeZone;
    use parking_lot::Mutex;

    struct EchoLlm {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.requests.lock().push(request);
            Ok("Take the 05:30 coach from BSÍ Bus Terminal.".to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _request: CompletionRequest) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[derive(Default)]
    struct RecordingBroadcaster {
        events: Mutex<Vec<ConversationEvent>>,
    }

    #[async_trait]
    impl ExchangeBroadcaster for RecordingBroadcaster {
        async fn broadcast(&self, event: ConversationEvent) -> Result<()> {
            self.events.lock().push(event);
            Ok(())
        }
    }

    struct FailingBroadcaster;

    #[async_trait]
    impl ExchangeBroadcaster for FailingBroadcaster {
        async fn broadcast(&self, _event: ConversationEvent) -> Result<()> {
            anyhow::bail!("feed offline")
        }
    }

    fn service(
        llm: Arc<dyn LlmClient>,
        broadcaster: Arc<dyn ExchangeBroadcaster>,
    ) -> (ChatService, ManualClock) {
        let config = DialogueConfig::default();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        let sessions = Arc::new(SessionStore::with_clock(
            &config.session,
            Arc::new(clock.clone()),
        ));
        let service = ChatService::with_parts(
            Arc::new(FactStore::load().unwrap()),
            config,
            sessions,
            ResponseDispatcher::seeded(3),
            llm,
            broadcaster,
        );
        (service, clock)
    }

    #[tokio::test]
    async fn test_greeting_skips_llm() {
        let llm = Arc::new(EchoLlm {
            requests: Mutex::new(Vec::new()),
        });
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let (service, _) = service(llm.clone(), broadcaster.clone());

        let reply = service.handle("s1", "Hello").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::DirectResponse);
        assert!(llm.requests.lock().is_empty());

        let events = broadcaster.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].topic, "greeting");
        assert_eq!(events[0].user_message, "Hello");
    }

    #[tokio::test]
    async fn test_flight_dialogue_across_turns() {
        let llm = Arc::new(EchoLlm {
            requests: Mutex::new(Vec::new()),
        });
        let (service, _) = service(llm.clone(), Arc::new(NoopBroadcaster));

        let first = service.handle("s1", "My flight is at 10:00").await.unwrap();
        assert_eq!(first.kind, ReplyKind::LlmResponse);
        let ctx = service.sessions().get_context("s1").unwrap();
        assert!(ctx.needs_destination);

        service.handle("s1", "Going to London").await.unwrap();
        let requests = llm.requests.lock();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].prompt.contains("\"flight_schedule\""));
        assert!(requests[1].prompt.contains("05:30"));

        let ctx = service.sessions().get_context("s1").unwrap();
        assert!(!ctx.needs_destination);
        // Two user turns and two assistant turns.
        assert_eq!(ctx.messages.len(), 4);
        assert_eq!(ctx.messages[0].role, MessageRole::User);
        assert_eq!(ctx.messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_llm_failure_degrades_to_fallback() {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let (service, _) = service(Arc::new(FailingLlm), broadcaster.clone());
        let reply = service.handle("s1", "How much is the Flybus?").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Fallback);
        assert!(reply.message.contains("580 5400"));
        assert_eq!(broadcaster.events.lock()[0].kind, ReplyKind::Fallback);
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_not_fatal() {
        let (service, _) = service(Arc::new(FailingLlm), Arc::new(FailingBroadcaster));
        let reply = service.handle("s1", "takk").await.unwrap();
        assert_eq!(reply.language, Language::Icelandic);
        assert_eq!(reply.kind, ReplyKind::DirectResponse);
    }

    #[tokio::test]
    async fn test_expired_session_starts_fresh() {
        let llm = Arc::new(EchoLlm {
            requests: Mutex::new(Vec::new()),
        });
        let (service, clock) = service(llm, Arc::new(NoopBroadcaster));
        service.handle("s1", "My flight is at 10:00").await.unwrap();
        clock.advance(chrono::Duration::minutes(31));
        assert!(service.sessions().get_context("s1").is_none());

        let reply = service.handle("s1", "lorem ipsum dolor").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Fallback);
    }
}
