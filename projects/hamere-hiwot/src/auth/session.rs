//! Server-side session registry.
//!
//! A signed token alone is not enough to be the "current user": its session id
//! must also be live here. Logout and user deletion remove entries, which
//! invalidates outstanding tokens immediately.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub started_at: Instant,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session for `user_id` and returns its id.
    pub fn open(&self, user_id: i64) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            Session { user_id, started_at: Instant::now() },
        );
        id
    }

    /// The session's user, if the session is live and belongs to `user_id`.
    pub fn resolve(&self, session_id: &str, user_id: i64) -> Option<Session> {
        self.sessions
            .get(session_id)
            .filter(|s| s.user_id == user_id)
            .map(|s| s.clone())
    }

    pub fn close(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Drops every session of `user_id`; returns how many were closed.
    pub fn revoke_user(&self, user_id: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.user_id != user_id);
        before - self.sessions.len()
    }

    /// Removes sessions older than `max_age`.
    pub fn prune(&self, max_age: Duration) {
        self.sessions.retain(|_, s| s.started_at.elapsed() < max_age);
    }

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

    #[test]
    fn test_open_and_resolve() {
        let reg = SessionRegistry::new();
        let sid = reg.open(3);
        assert_eq!(reg.resolve(&sid, 3).map(|s| s.user_id), Some(3));
    }

    #[test]
    fn test_resolve_rejects_other_user() {
        let reg = SessionRegistry::new();
        let sid = reg.open(3);
        assert!(reg.resolve(&sid, 4).is_none());
    }

    #[test]
    fn test_close_invalidates_session() {
        let reg = SessionRegistry::new();
        let sid = reg.open(1);
        assert!(reg.close(&sid));
        assert!(reg.resolve(&sid, 1).is_none());
        assert!(!reg.close(&sid), "closing twice is a no-op");
    }

    #[test]
    fn test_revoke_user_only_touches_that_user() {
        let reg = SessionRegistry::new();
        let a1 = reg.open(1);
        let a2 = reg.open(1);
        let b = reg.open(2);
        assert_eq!(reg.revoke_user(1), 2);
        assert!(reg.resolve(&a1, 1).is_none());
        assert!(reg.resolve(&a2, 1).is_none());
        assert!(reg.resolve(&b, 2).is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_prune_zero_age_drops_everything() {
        let reg = SessionRegistry::new();
        reg.open(1);
        reg.prune(Duration::ZERO);
        assert!(reg.is_empty());
    }
}
