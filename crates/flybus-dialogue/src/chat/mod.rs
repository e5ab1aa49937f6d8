//! Response layer: canned replies, LLM prompt assembly and the per-turn chat service.

pub mod dispatcher;
pub mod prompt;
pub mod service;

pub use dispatcher::{fallback_reply, ReplyKind, ResponseDispatcher, ResponsePlan};
pub use prompt::{build_prompt, build_system_instruction, CompletionRequest};
pub use service::{
    ChatReply, ChatService, ConversationEvent, ExchangeBroadcaster, LlmClient, NoopBroadcaster,
};
