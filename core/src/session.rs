//! Process-wide authentication state.
//!
//! # Design
//! `Session` is a cheap handle; clones share one state. It owns the token
//! store, the navigator and a handle to the query cache, so tearing the
//! session down (explicit logout or a 401) is one call that clears all three
//! together.
//!
//! Status moves `Initializing -> Restoring -> Authenticated | Anonymous`.
//! Until it leaves `Initializing`/`Restoring`, authenticated queries are
//! refused.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::cache::QueryCache;
use crate::events::Navigator;
use crate::storage::TokenStore;
use crate::types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Process just started; persisted state not looked at yet.
    Initializing,
    /// A persisted token was found and awaits profile confirmation.
    Restoring,
    Authenticated,
    Anonymous,
}

impl SessionStatus {
    /// Whether the session has settled on authenticated or not.
    pub fn is_determined(self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Anonymous)
    }
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    current_user: Option<User>,
}

struct SessionInner {
    state: RwLock<SessionState>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    cache: QueryCache,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Session")
            .field("status", &state.status)
            .field("user", &state.current_user.as_ref().map(|u| u.id))
            .finish()
    }
}

impl Session {
    pub fn new(tokens: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>, cache: QueryCache) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(SessionState {
                    status: SessionStatus::Initializing,
                    current_user: None,
                }),
                tokens,
                navigator,
                cache,
            }),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.read().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.read().current_user.clone()
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.inner.state.read().current_user.as_ref().map(|u| u.id)
    }

    /// The persisted bearer token, if any.
    pub fn token(&self) -> Option<String> {
        match self.inner.tokens.load() {
            Ok(token) => token,
            Err(error) => {
                warn!(%error, "could not read persisted token");
                None
            }
        }
    }

    /// Look at persisted state. Returns the token to confirm, if one exists.
    pub(crate) fn begin_restore(&self) -> Option<String> {
        let token = self.token();
        let mut state = self.inner.state.write();
        state.current_user = None;
        state.status = match token {
            Some(_) => SessionStatus::Restoring,
            None => SessionStatus::Anonymous,
        };
        token
    }

    /// Persist `token` and mark the session authenticated.
    pub(crate) fn sign_in(&self, token: &str, user: Option<User>) {
        if let Err(error) = self.inner.tokens.save(token) {
            warn!(%error, "could not persist token; session lasts for this process only");
        }
        let mut state = self.inner.state.write();
        info!(user = ?user.as_ref().map(|u| u.id), "signed in");
        state.status = SessionStatus::Authenticated;
        state.current_user = user;
    }

    /// Mark an authenticated session whose token is already stored.
    pub(crate) fn confirm(&self, user: Option<User>) {
        let mut state = self.inner.state.write();
        state.status = SessionStatus::Authenticated;
        state.current_user = user;
    }

    /// Replace the in-memory user with the server's representation. Ignored
    /// when nobody is signed in.
    pub fn replace_user(&self, user: User) {
        let mut state = self.inner.state.write();
        if state.status == SessionStatus::Authenticated {
            state.current_user = Some(user);
        }
    }

    /// 401 policy. Tears the session down only if this call is the one that
    /// removed a present token, so concurrent 401s clear it exactly once.
    pub fn expire(&self) -> bool {
        match self.inner.tokens.take() {
            Ok(Some(_)) => {
                warn!("token rejected by server; signing out");
                self.teardown();
                true
            }
            Ok(None) => false,
            Err(error) => {
                warn!(%error, "could not remove persisted token");
                self.teardown();
                true
            }
        }
    }

    /// Explicit logout.
    pub fn logout(&self) {
        if let Err(error) = self.inner.tokens.take() {
            warn!(%error, "could not remove persisted token");
        }
        info!("signed out");
        self.teardown();
    }

    fn teardown(&self) {
        {
            let mut state = self.inner.state.write();
            state.status = SessionStatus::Anonymous;
            state.current_user = None;
        }
        self.inner.cache.clear();
        self.inner.navigator.redirect_to_login();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingNavigator(AtomicUsize);

    impl Navigator for CountingNavigator {
        fn redirect_to_login(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn user() -> User {
        serde_json::from_str(r#"{"id":1,"username":"a"}"#).unwrap()
    }

    fn session(tokens: MemoryTokenStore) -> (Session, Arc<CountingNavigator>) {
        let navigator = Arc::new(CountingNavigator::default());
        let session = Session::new(Arc::new(tokens), navigator.clone(), QueryCache::new());
        (session, navigator)
    }

    #[test]
    fn starts_indeterminate() {
        let (session, _) = session(MemoryTokenStore::default());
        assert_eq!(session.status(), SessionStatus::Initializing);
        assert!(!session.status().is_determined());
    }

    #[test]
    fn restore_without_token_is_anonymous() {
        let (session, _) = session(MemoryTokenStore::default());
        assert_eq!(session.begin_restore(), None);
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn restore_with_token_is_provisional() {
        let (session, _) = session(MemoryTokenStore::with_token("t1"));
        assert_eq!(session.begin_restore().as_deref(), Some("t1"));
        assert_eq!(session.status(), SessionStatus::Restoring);
        assert!(session.current_user().is_none());
    }

    #[test]
    fn expire_tears_down_once() {
        let (session, navigator) = session(MemoryTokenStore::default());
        session.sign_in("t1", Some(user()));
        assert!(session.is_authenticated());

        assert!(session.expire());
        assert!(!session.expire());
        assert_eq!(navigator.0.load(Ordering::SeqCst), 1);
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.current_user().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn replace_user_requires_sign_in() {
        let (session, _) = session(MemoryTokenStore::default());
        session.replace_user(user());
        assert!(session.current_user().is_none());

        session.sign_in("t1", None);
        session.replace_user(user());
        assert_eq!(session.current_user_id(), Some(1));
    }
}
