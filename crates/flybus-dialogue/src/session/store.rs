//! TTL-expiring, per-session context store.
//!
//! Each session is an independent DashMap entry, so turns for different
//! sessions never contend. Callers always receive clones; the live record
//! stays inside the store.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::context::SessionContext;
use crate::config::SessionConfig;
use crate::error::SessionError;

pub struct SessionStore {
    sessions: DashMap<String, SessionContext>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            ttl: Duration::minutes(i64::from(config.ttl_minutes)),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn is_expired(&self, ctx: &SessionContext, now: DateTime<Utc>) -> bool {
        now - ctx.timestamp > self.ttl
    }

    /// Snapshot of a live session. Expired records are evicted and reported as absent.
    pub fn get_context(&self, session_id: &str) -> Option<SessionContext> {
        let now = self.clock.now();
        {
            let entry = self.sessions.get(session_id)?;
            if !self.is_expired(entry.value(), now) {
                return Some(entry.value().clone());
            }
        }
        // Re-check under the write lock: another turn may have refreshed it.
        if self
            .sessions
            .remove_if(session_id, |_, ctx| self.is_expired(ctx, now))
            .is_some()
        {
            tracing::debug!(session_id = %session_id, "[SessionStore] Evicted expired session");
            return None;
        }
        self.sessions.get(session_id).map(|e| e.value().clone())
    }

    /// Snapshot of the session, creating (or restarting an expired) record first.
    pub fn get_or_create(&self, session_id: &str) -> SessionContext {
        let now = self.clock.now();
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext::new(session_id, now));
        if self.is_expired(entry.value(), now) {
            let revision = entry.revision;
            *entry = SessionContext::new(session_id, now);
            // Keep revisions monotonic so stale snapshots of the old record still fail.
            entry.revision = revision + 1;
            tracing::debug!(session_id = %session_id, "[SessionStore] Restarted expired session");
        }
        entry.value().clone()
    }

    /// Unconditional write (last writer wins).
    pub fn put_context(&self, session_id: &str, mut ctx: SessionContext) {
        ctx.session_id = session_id.to_string();
        ctx.timestamp = self.clock.now();
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut e) => {
                ctx.revision = e.get().revision + 1;
                e.insert(ctx);
            }
            Entry::Vacant(e) => {
                ctx.revision += 1;
                e.insert(ctx);
            }
        }
    }

    /// Compare-and-swap write: succeeds only if nobody committed since `ctx` was read.
    ///
    /// Returns the stored snapshot with its new revision.
    pub fn commit(
        &self,
        session_id: &str,
        mut ctx: SessionContext,
    ) -> Result<SessionContext, SessionError> {
        let now = self.clock.now();
        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(mut e) => {
                let found = e.get().revision;
                if found != ctx.revision && !self.is_expired(e.get(), now) {
                    tracing::warn!(
                        session_id = %session_id,
                        expected = ctx.revision,
                        found,
                        "[SessionStore] Stale commit rejected"
                    );
                    return Err(SessionError::Stale {
                        session_id: session_id.to_string(),
                        expected: ctx.revision,
                        found,
                    });
                }
                ctx.revision = found.max(ctx.revision) + 1;
                ctx.session_id = session_id.to_string();
                ctx.timestamp = now;
                e.insert(ctx.clone());
            }
            Entry::Vacant(e) => {
                ctx.revision += 1;
                ctx.session_id = session_id.to_string();
                ctx.timestamp = now;
                e.insert(ctx.clone());
            }
        }
        Ok(ctx)
    }

    /// Atomic read-modify-write under the entry lock.
    pub fn update<R>(&self, session_id: &str, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        let now = self.clock.now();
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext::new(session_id, now));
        if self.is_expired(entry.value(), now) {
            let revision = entry.revision;
            *entry = SessionContext::new(session_id, now);
            entry.revision = revision;
        }
        let result = f(entry.value_mut());
        entry.revision += 1;
        entry.timestamp = now;
        result
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.sessions.retain(|_, ctx| {
            let keep = !self.is_expired(ctx, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            tracing::debug!(removed, "[SessionStore] Swept expired sessions");
        }
        removed
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionContext> {
        self.sessions.remove(session_id).map(|(_, ctx)| ctx)
    }

    /// Stored records, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use crate::types::Destination;

    fn store_with_clock() -> (SessionStore, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let store = SessionStore::with_clock(&SessionConfig::default(), Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn test_get_or_create_then_get() {
        let (store, _clock) = store_with_clock();
        assert!(store.get_context("a").is_none());
        let ctx = store.get_or_create("a");
        assert_eq!(ctx.session_id, "a");
        assert!(store.get_context("a").is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_context_expires_after_ttl() {
        let (store, clock) = store_with_clock();
        store.put_context("a", SessionContext::default());
        clock.advance(Duration::minutes(29));
        assert!(store.get_context("a").is_some());
        clock.advance(Duration::minutes(1));
        assert!(store.get_context("a").is_some());
        clock.advance(Duration::seconds(1));
        assert!(store.get_context("a").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_refreshes_timestamp() {
        let (store, clock) = store_with_clock();
        store.put_context("a", SessionContext::default());
        clock.advance(Duration::minutes(20));
        let ctx = store.get_context("a").unwrap();
        store.put_context("a", ctx);
        clock.advance(Duration::minutes(20));
        assert!(store.get_context("a").is_some());
    }

    #[test]
    fn test_returned_context_is_a_copy() {
        let (store, _clock) = store_with_clock();
        let mut ctx = store.get_or_create("a");
        ctx.flight_destination = Some(Destination::Europe);
        assert!(store.get_context("a").unwrap().flight_destination.is_none());
    }

    #[test]
    fn test_commit_rejects_stale_revision() {
        let (store, _clock) = store_with_clock();
        let first = store.get_or_create("a");
        let second = first.clone();

        let committed = store.commit("a", first).unwrap();
        assert_eq!(committed.revision, 1);

        let err = store.commit("a", second).unwrap_err();
        assert_eq!(
            err,
            SessionError::Stale {
                session_id: "a".into(),
                expected: 0,
                found: 1
            }
        );

        // A fresh read commits cleanly.
        let fresh = store.get_context("a").unwrap();
        assert_eq!(store.commit("a", fresh).unwrap().revision, 2);
    }

    #[test]
    fn test_restart_after_expiry_invalidates_old_snapshots() {
        let (store, clock) = store_with_clock();
        let old = store.commit("a", store.get_or_create("a")).unwrap();
        clock.advance(Duration::minutes(45));
        let restarted = store.get_or_create("a");
        assert!(restarted.messages.is_empty());
        assert!(restarted.revision > old.revision);
        assert!(store.commit("a", old).is_err());
    }

    #[test]
    fn test_update_is_read_modify_write() {
        let (store, _clock) = store_with_clock();
        store.update("a", |ctx| ctx.needs_destination = true);
        let revision = store.update("a", |ctx| {
            assert!(ctx.needs_destination);
            ctx.revision
        });
        assert_eq!(revision, 1);
        assert_eq!(store.get_context("a").unwrap().revision, 2);
    }

    #[test]
    fn test_sweep_expired() {
        let (store, clock) = store_with_clock();
        store.put_context("old", SessionContext::default());
        clock.advance(Duration::minutes(31));
        store.put_context("new", SessionContext::default());
        assert_eq!(store.sweep_expired(), 1);
        assert!(store.get_context("new").is_some());
        assert!(store.remove("new").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_are_isolated_across_threads() {
        let store = Arc::new(SessionStore::new(&SessionConfig::default()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let id = format!("s{}", i);
                    for _ in 0..50 {
                        store.update(&id, |ctx| ctx.messages.clear());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
        assert_eq!(store.get_context("s3").unwrap().revision, 50);
    }
}
