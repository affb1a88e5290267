//! In-process session store backed by DashMap. Sessions expire after an
//! idle TTL; a background task calls `evict_expired` periodically.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::QuestionCatalog;
use crate::error::{QuizError, QuizResult};
use crate::session::{QuizSession, SessionSnapshot};

struct StoredSession {
    session: QuizSession,
    touched_at: Instant,
}

impl StoredSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.touched_at.elapsed() > ttl
    }
}

/// Keeps live quiz sessions for the visitors currently taking the quiz.
pub struct SessionStore {
    catalog: Arc<QuestionCatalog>,
    sessions: DashMap<Uuid, StoredSession>,
    /// Serializes `create` so the capacity check and the insert are one step.
    create_lock: Mutex<()>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(catalog: Arc<QuestionCatalog>, ttl: Duration, max_sessions: usize) -> Self {
        Self {
            catalog,
            sessions: DashMap::new(),
            create_lock: Mutex::new(()),
            ttl,
            max_sessions,
        }
    }

    pub fn catalog(&self) -> &Arc<QuestionCatalog> {
        &self.catalog
    }

    /// Create and start a session on `flow` (default flow when `None`).
    pub fn create(&self, flow: Option<&str>) -> QuizResult<SessionSnapshot> {
        let _guard = self.create_lock.lock();
        if self.sessions.len() >= self.max_sessions {
            self.evict_expired();
            if self.sessions.len() >= self.max_sessions {
                return Err(QuizError::StoreFull(self.max_sessions));
            }
        }

        let mut session = QuizSession::new(Arc::clone(&self.catalog));
        session.start(flow)?;
        let snapshot = session.snapshot();
        self.sessions.insert(
            session.id(),
            StoredSession {
                session,
                touched_at: Instant::now(),
            },
        );
        Ok(snapshot)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionSnapshot> {
        let entry = self.sessions.get(id)?;
        if entry.is_expired(self.ttl) {
            drop(entry);
            self.remove_if_expired(id);
            return None;
        }
        Some(entry.session.snapshot())
    }

    /// Run `f` against the session while holding its entry.
    pub fn with_session<R>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut QuizSession) -> QuizResult<R>,
    ) -> QuizResult<R> {
        let not_found = || QuizError::SessionNotFound(id.to_string());
        let mut entry = self.sessions.get_mut(id).ok_or_else(not_found)?;
        if entry.is_expired(self.ttl) {
            drop(entry);
            self.remove_if_expired(id);
            return Err(not_found());
        }
        entry.touched_at = Instant::now();
        f(&mut entry.session)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Remove idle sessions. Returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| !stored.is_expired(self.ttl));
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "Evicted idle quiz sessions");
        } else {
            debug!(remaining = self.sessions.len(), "No idle quiz sessions to evict");
        }
        evicted
    }

    /// Re-checks expiry under the entry lock, so a session refreshed in
    /// the meantime survives.
    fn remove_if_expired(&self, id: &Uuid) {
        self.sessions
            .remove_if(id, |_, stored| stored.is_expired(self.ttl));
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
