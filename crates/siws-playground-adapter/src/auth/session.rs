/*
[INPUT]:  Sessions issued by the verifier, sign-out requests
[OUTPUT]: Current session lookup and invalidation events
[POS]:    Auth layer - client-side session lifecycle
[UPDATE]: When adding session refresh or changing invalidation signals
*/

use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::info;

use crate::types::Session;

const EVENT_CAPACITY: usize = 16;

/// Signal for views that depend on who is signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

/// Thread-safe holder of the current session
#[derive(Debug, Clone)]
pub struct SessionCache {
    data: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionCache {
    /// Create a new empty session cache
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            data: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Store a session and tell subscribers to refetch
    pub fn set_session(&self, session: Session) {
        info!(wallet = %session.wallet_address, expires_at = %session.expires_at, "session stored");
        {
            let mut guard = self.data.write().unwrap();
            *guard = Some(session.clone());
        }
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }

    /// Current session, unless it has expired
    pub fn session(&self) -> Option<Session> {
        let guard = self.data.read().unwrap();
        guard
            .as_ref()
            .filter(|session| !session.is_expired_at(Utc::now()))
            .cloned()
    }

    /// Check if there is no usable session
    pub fn is_expired(&self) -> bool {
        self.session().is_none()
    }

    /// Session token if the backend issued one
    pub fn token(&self) -> Option<String> {
        self.session().and_then(|session| session.token)
    }

    /// Drop the session and tell subscribers to refetch
    pub fn clear(&self) {
        let had_session = {
            let mut guard = self.data.write().unwrap();
            guard.take().is_some()
        };
        if had_session {
            info!("session cleared");
            let _ = self.events.send(SessionEvent::SignedOut);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            user_id: "user-1".to_string(),
            wallet_address: "SEekKY1iUoWYJqZ3d9QBsfJytNx5RLBjBmgznkGrqbH".to_string(),
            issued_at: now,
            expires_at: now + expires_in,
            token: Some("session-token".to_string()),
        }
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = SessionCache::new();
        assert!(cache.session().is_none());
        assert!(cache.is_expired());
    }

    #[test]
    fn test_set_and_get_session() {
        let cache = SessionCache::new();
        cache.set_session(session(Duration::hours(1)));

        assert_eq!(cache.token(), Some("session-token".to_string()));
        assert!(!cache.is_expired());
    }

    #[test]
    fn test_expired_session_hidden() {
        let cache = SessionCache::new();
        cache.set_session(session(Duration::seconds(-1)));
        assert!(cache.session().is_none());
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let cache = SessionCache::new();
        let mut events = cache.subscribe();

        let stored = session(Duration::hours(1));
        cache.set_session(stored.clone());
        cache.clear();
        cache.clear();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedIn(stored));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut);
        assert!(events.try_recv().is_err());
    }
}
