//! Session context store: per-session dialogue state with lazy TTL eviction
//! and optimistic (revision-checked) commits.

pub mod clock;
pub mod context;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextMessage, MessageRole, SessionContext};
pub use store::SessionStore;
