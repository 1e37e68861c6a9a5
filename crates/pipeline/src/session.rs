//! Session store: one `SessionContext` per `session_id`, each behind its own
//! `tokio::sync::Mutex` so a handler call for one session never blocks
//! another, with TTL eviction. Grounded on the same idea
//! `vox_core::request::SessionContext::is_stale` already carries; this is
//! just the keyed store and the serialization discipline spec'd for
//! per-`session_id` handler dispatch.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use vox_core::request::SessionContext;

pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionContext>>>,
    ttl: Duration,
    max_interactions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_interactions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            max_interactions,
        }
    }

    /// Returns the lock for `session_id`, creating a fresh session if one
    /// doesn't exist or the existing one has gone stale. A session currently
    /// locked by an in-flight request is never replaced out from under it.
    pub fn get_or_create(&self, session_id: &str, locale: &str) -> Arc<Mutex<SessionContext>> {
        if let Some(entry) = self.sessions.get(session_id) {
            let is_stale = entry.try_lock().map(|guard| guard.is_stale(self.ttl)).unwrap_or(false);
            if !is_stale {
                return entry.clone();
            }
        }
        let fresh = Arc::new(Mutex::new(SessionContext::new(
            session_id.to_string(),
            locale.to_string(),
            self.max_interactions,
        )));
        self.sessions.insert(session_id.to_string(), fresh.clone());
        fresh
    }

    /// Drops every session past its TTL that isn't currently locked by an
    /// in-flight request. Intended to run on a periodic background tick.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => !guard.is_stale(ttl),
            Err(_) => true,
        });
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
