use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use murmur_types::models::Session;

/// Contract of the external authentication service, reduced to what the
/// interaction core consumes: a current session whose username becomes the
/// opaque `author` string on comments, and a way to observe session changes.
pub struct SessionTracker {
    current: watch::Sender<Option<Session>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Start a session for `username`, replacing any existing one. The real
    /// credential exchange belongs to the auth provider; this tracker only
    /// models the resulting identity.
    pub fn sign_in(&self, username: &str) -> Session {
        let session = Session {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
        };
        self.current.send_replace(Some(session.clone()));
        info!(user = %session.username, "session started");
        session
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.current.send_replace(None) {
            info!(user = %session.username, "session ended");
        }
    }

    /// Observe session changes. Dropping the receiver unsubscribes.
    pub fn observe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_observers_see_sign_in_and_out() {
        let tracker = SessionTracker::new();
        let mut rx = tracker.observe();
        assert!(rx.borrow().is_none());

        let session = tracker.sign_in("alice");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&session));
        assert_eq!(tracker.current(), Some(session));

        tracker.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_sign_in_replaces_existing_session() {
        let tracker = SessionTracker::new();
        let first = tracker.sign_in("alice");
        let second = tracker.sign_in("bob");

        let current = tracker.current().unwrap();
        assert_eq!(current, second);
        assert_ne!(current.user_id, first.user_id);
    }
}
