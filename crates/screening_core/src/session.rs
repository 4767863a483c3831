//! crates/screening_core/src/session.rs
//!
//! The explicit session context handed to every network-call boundary.
//! It owns the bearer token in memory and mirrors it into a `TokenStore`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::ports::TokenStore;

/// Invoked by the transport when the service rejects the credentials (401).
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

pub struct SessionContext {
    token: watch::Sender<Option<String>>,
    storage: Arc<dyn TokenStore>,
}

impl SessionContext {
    /// Starts with whatever token the store already holds.
    pub fn new(storage: Arc<dyn TokenStore>) -> Self {
        let (token, _) = watch::channel(storage.load());
        Self { token, storage }
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// Notified every time the token is set or cleared.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }

    pub fn set_token(&self, token: &str) {
        if let Err(e) = self.storage.save(token) {
            warn!("Failed to persist auth token: {}", e);
        }
        self.token.send_replace(Some(token.to_string()));
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.clear() {
            warn!("Failed to remove persisted auth token: {}", e);
        }
        self.token.send_replace(None);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::PortResult;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemoryTokens(pub Mutex<Option<String>>);

    impl TokenStore for MemoryTokens {
        fn load(&self) -> Option<String> {
            self.0.lock().unwrap().clone()
        }

        fn save(&self, token: &str) -> PortResult<()> {
            *self.0.lock().unwrap() = Some(token.to_string());
            Ok(())
        }

        fn clear(&self) -> PortResult<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    #[test]
    fn loads_and_persists_token() {
        let storage = Arc::new(MemoryTokens(Mutex::new(Some("stored".into()))));
        let session = SessionContext::new(storage.clone());
        assert_eq!(session.token().as_deref(), Some("stored"));

        let mut rx = session.subscribe();
        session.clear();
        assert!(rx.has_changed().unwrap());
        assert!(!session.is_signed_in());
        assert_eq!(storage.load(), None);

        session.set_token("fresh");
        assert_eq!(storage.load().as_deref(), Some("fresh"));
    }
}
