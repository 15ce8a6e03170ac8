//! The application context: one client, one session, one cache.
//!
//! # Design
//! Every operation takes the context explicitly instead of reaching for
//! globals. The three handles inside share state with their clones, so an
//! `AppContext` is cheap to clone into tasks.
//!
//! Reads go through `fetch`, which never fails: it returns a `QueryResult`
//! carrying the last good value next to the latest error. Writes go through
//! `mutate`, which returns the server's answer and then invalidates exactly
//! the keys the mutation declares, refetching the ones somebody observes
//! before returning.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, FutureExt};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api;
use crate::cache::{CachedValue, Fetcher, QueryCache, QueryKey, Snapshot, Subscription};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::events::{LogNavigator, LogNotifier, Navigator, Notifier};
use crate::http::FileUpload;
use crate::mutation::{self, Mutation};
use crate::query::Query;
use crate::session::{Session, SessionStatus};
use crate::storage::TokenStore;
use crate::transport::{Transport, UreqTransport};
use crate::types::{AuthToken, Message, ProfileUpdate, RegisterUser, Registration, Upload, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// A disabled query only reports what is already cached.
    pub enabled: bool,
    /// Retry a failed fetch once.
    pub retry: bool,
    /// Report failures to the ambient notifier.
    pub ambient_errors: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            retry: true,
            ambient_errors: false,
        }
    }
}

impl QueryOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Enabled only while `condition` holds, e.g. "a post id is selected".
    pub fn enabled_if(condition: bool) -> Self {
        Self {
            enabled: condition,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing was fetched: the query is disabled or its session gate is shut.
    Idle,
    Success,
    Error,
}

/// Outcome of one read. `data` survives failures; `error` is the latest one.
#[derive(Debug)]
pub struct QueryResult<V> {
    pub data: Option<Arc<V>>,
    pub error: Option<ApiError>,
    pub status: QueryStatus,
}

impl<V> Clone for QueryResult<V> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
        }
    }
}

impl<V: Send + Sync + 'static> QueryResult<V> {
    fn idle(key: QueryKey, snapshot: Snapshot) -> Self {
        let (data, error) = downcast(key, snapshot.value);
        Self {
            data,
            error,
            status: QueryStatus::Idle,
        }
    }

    fn from_snapshot(key: QueryKey, snapshot: Snapshot) -> Self {
        let (data, cast_error) = downcast(key, snapshot.value);
        let error = snapshot.error.or(cast_error);
        let status = match error {
            Some(_) => QueryStatus::Error,
            None => QueryStatus::Success,
        };
        Self {
            data,
            error,
            status,
        }
    }
}

impl<V> QueryResult<V> {
    pub fn data(&self) -> Option<&V> {
        self.data.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }
}

fn downcast<V: Send + Sync + 'static>(
    key: QueryKey,
    value: Option<CachedValue>,
) -> (Option<Arc<V>>, Option<ApiError>) {
    match value.map(|value| value.downcast::<V>()) {
        None => (None, None),
        Some(Ok(value)) => (Some(value), None),
        Some(Err(_)) => (
            None,
            Some(ApiError::Deserialization(format!(
                "cached value for {key} has an unexpected type"
            ))),
        ),
    }
}

/// What registration produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The server issued a token; the session is now authenticated.
    SignedIn(User),
    /// The account exists but the caller still has to log in.
    Created(User),
}

pub struct AppContext<T> {
    client: ApiClient<T>,
    session: Session,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl<T> Clone for AppContext<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session: self.session.clone(),
            cache: self.cache.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<T> fmt::Debug for AppContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("client", &self.client)
            .field("session", &self.session)
            .field("cache", &self.cache)
            .finish()
    }
}

impl AppContext<UreqTransport> {
    /// Context talking to the server named by the environment.
    pub fn from_env() -> Self {
        AppContext::builder(UreqTransport::new())
            .config(ClientConfig::from_env())
            .build()
    }
}

impl<T: Transport> AppContext<T> {
    pub fn builder(transport: T) -> AppContextBuilder<T> {
        AppContextBuilder {
            transport,
            config: ClientConfig::default(),
            tokens: None,
            navigator: Arc::new(LogNavigator),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // --- queries ---

    /// Read `query` through the cache.
    pub async fn fetch<V>(&self, query: &Query<V>, options: QueryOptions) -> QueryResult<V>
    where
        V: DeserializeOwned + Send + Sync + 'static,
    {
        let gated = query.requires_auth && !self.session.is_authenticated();
        if !options.enabled || gated {
            debug!(key = %query.key, gated, "query not enabled");
            return QueryResult::idle(query.key, self.cache.peek(&query.key));
        }

        let snapshot = self
            .cache
            .read(query.key, self.fetcher(query), options.retry)
            .await;
        let result = QueryResult::from_snapshot(query.key, snapshot);
        if let (Some(error), true) = (&result.error, options.ambient_errors) {
            self.report(error);
        }
        result
    }

    /// Register interest in `key`; invalidations of observed keys refetch
    /// them eagerly.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        self.cache.subscribe(key)
    }

    fn fetcher<V>(&self, query: &Query<V>) -> Fetcher
    where
        V: DeserializeOwned + Send + Sync + 'static,
    {
        let client = self.client.clone();
        let endpoint = query.endpoint.clone();
        Arc::new(move || {
            let client = client.clone();
            let endpoint = endpoint.clone();
            async move {
                let value = client.send(&endpoint).await?;
                Ok(Arc::new(value) as CachedValue)
            }
            .boxed()
        })
    }

    // --- mutations ---

    /// Run a write. Never retried. On success its declared keys are
    /// invalidated and observed ones refetched before this returns.
    pub async fn mutate<V: DeserializeOwned>(&self, mutation: &Mutation<V>) -> Result<V, ApiError> {
        match self.client.send(&mutation.endpoint).await {
            Ok(value) => {
                self.invalidate(&mutation.invalidates).await;
                Ok(value)
            }
            Err(error) => {
                if mutation.ambient_errors {
                    self.report(&error);
                }
                Err(error)
            }
        }
    }

    /// Mark `keys` stale and refetch the observed ones.
    pub async fn invalidate(&self, keys: &[QueryKey]) {
        let observed: Vec<QueryKey> = keys
            .iter()
            .filter(|key| self.cache.invalidate(key))
            .copied()
            .collect();
        future::join_all(observed.into_iter().map(|key| self.cache.refresh(key))).await;
    }

    fn report(&self, error: &ApiError) {
        // 401 already redirected; validation belongs to the form that sent it.
        if error.is_validation() || error.is_unauthorized() {
            return;
        }
        self.notifier.notify_error(error);
    }

    // --- session ---

    /// Restore a persisted session, confirming the token against the server.
    pub async fn init(&self) -> SessionStatus {
        if self.session.begin_restore().is_none() {
            return self.session.status();
        }
        match self.client.send(&api::users::me()).await {
            Ok(user) => self.session.confirm(Some(user)),
            // The client has already torn the session down.
            Err(error) if error.is_unauthorized() => {}
            Err(error) => {
                warn!(%error, "could not confirm restored session; keeping token");
                self.session.confirm(None);
            }
        }
        self.session.status()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let token = self.client.send(&api::auth::login(email, password)).await?;
        self.establish(token).await
    }

    pub async fn register(&self, user: &RegisterUser) -> Result<RegisterOutcome, ApiError> {
        match self.client.send(&api::auth::register(user)).await? {
            Registration::SignedIn(token) => Ok(RegisterOutcome::SignedIn(self.establish(token).await?)),
            Registration::Created(user) => Ok(RegisterOutcome::Created(user)),
        }
    }

    async fn establish(&self, token: AuthToken) -> Result<User, ApiError> {
        self.session.sign_in(&token.token, token.user.clone());
        if let Some(user) = token.user {
            return Ok(user);
        }
        match self.client.send(&api::users::me()).await {
            Ok(user) => {
                self.session.replace_user(user.clone());
                Ok(user)
            }
            Err(error) => {
                // A 401 has already torn the session down.
                if !error.is_unauthorized() {
                    warn!(%error, "could not load profile after sign-in; signing out");
                    self.session.logout();
                }
                Err(error)
            }
        }
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    /// Apply a partial profile update; the server's copy replaces the
    /// session user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let mutation = mutation::update_profile(self.session.current_user_id(), update)?;
        let user = self.mutate(&mutation).await?;
        self.session.replace_user(user.clone());
        Ok(user)
    }

    /// Upload a new profile picture. The server points the profile at it and
    /// its copy of the profile replaces the session user.
    pub async fn upload_profile_picture(&self, file: &FileUpload) -> Result<Upload, ApiError> {
        let mutation = mutation::upload_profile_picture(self.session.current_user_id(), file);
        let upload = self.mutate(&mutation).await?;
        let me = self.fetch(&crate::query::me(), QueryOptions::default()).await;
        match (me.data, me.error) {
            (Some(user), None) => self.session.replace_user(User::clone(&user)),
            (_, error) => warn!(?error, "could not reload profile after picture upload"),
        }
        Ok(upload)
    }

    /// Delete the signed-in account, then log out.
    pub async fn delete_account(&self) -> Result<Message, ApiError> {
        let message = self.mutate(&mutation::delete_account()).await?;
        self.session.logout();
        Ok(message)
    }
}

pub struct AppContextBuilder<T> {
    transport: T,
    config: ClientConfig,
    tokens: Option<Arc<dyn TokenStore>>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl<T: Transport> AppContextBuilder<T> {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the store `config` would pick.
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn build(self) -> AppContext<T> {
        let cache = QueryCache::new();
        let tokens = self.tokens.unwrap_or_else(|| self.config.token_store());
        let session = Session::new(tokens, self.navigator, cache.clone());
        let client = ApiClient::new(&self.config.base_url, self.transport, session.clone());
        AppContext {
            client,
            session,
            cache,
            notifier: self.notifier,
        }
    }
}
