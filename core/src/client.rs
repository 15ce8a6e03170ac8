//! The single configured HTTP client every call goes through.
//!
//! # Design
//! `ApiClient` resolves endpoint paths against the base URL and applies two
//! interceptors around the `Transport`:
//!
//! - request: attach `Authorization: Bearer <token>` when a token is
//!   persisted, otherwise send the request unauthenticated;
//! - response: turn non-2xx replies into `ApiError`s with a readable message,
//!   log every failure, and on 401 expire the session (token, user, cache,
//!   redirect) regardless of what the caller does with the error.
//!
//! The caller always still receives the failure.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::error;

use crate::api::Endpoint;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::Transport;

pub struct ApiClient<T> {
    transport: Arc<T>,
    base_url: Arc<str>,
    session: Session,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            base_url: self.base_url.clone(),
            session: self.session.clone(),
        }
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, transport: T, session: Session) -> Self {
        Self {
            transport: Arc::new(transport),
            base_url: base_url.trim_end_matches('/').into(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute `endpoint` and decode its reply.
    pub async fn send<R: DeserializeOwned>(&self, endpoint: &Endpoint<R>) -> Result<R, ApiError> {
        let response = self.execute(endpoint.request.clone()).await?;
        endpoint
            .parse(&response)
            .map_err(|err| self.reject(&endpoint.request, Some(&response), err))
    }

    /// Send a raw request through both interceptors. Non-2xx replies are
    /// returned as data; only transport failures are errors here.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = self.prepare(request);
        match self.transport.execute(request.clone()).await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.reject(&request, None, err)),
        }
    }

    fn prepare(&self, mut request: HttpRequest) -> HttpRequest {
        request.path = format!("{}{}", self.base_url, request.path);
        request.set_header("accept", "application/json");
        if let Some(token) = self.session.token() {
            request.set_header("authorization", format!("Bearer {token}"));
        }
        request
    }

    fn reject(&self, request: &HttpRequest, response: Option<&HttpResponse>, err: ApiError) -> ApiError {
        error!(
            method = %request.method,
            path = %request.path,
            status = response.map(|r| r.status),
            body = response.map(|r| r.body.as_str()),
            message = %err,
            "API error"
        );
        if err.is_unauthorized() {
            self.session.expire();
        }
        err
    }
}
