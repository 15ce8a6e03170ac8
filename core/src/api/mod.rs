//! Typed API surface: one module per server resource.
//!
//! # Design
//! Every operation is a pure function returning an `Endpoint<T>`: the
//! `HttpRequest` to send plus the knowledge of how to parse the reply into
//! `T`. Nothing here retries, caches or touches session state; `ApiClient`
//! executes endpoints and the query layer decides when to.
//!
//! Paths are relative to the API base URL.

pub mod auth;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod stories;
pub mod uploads;
pub mod users;

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Multipart};

/// `skip`/`limit` pagination. The server owns totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub const fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    pub const fn first(limit: u32) -> Self {
        Self { skip: 0, limit }
    }

    /// The page right after this one. `skip` stops at `u32::MAX`.
    pub const fn next(self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skip={}&limit={}", self.skip, self.limit)
    }
}

/// A request paired with the type its successful response decodes to.
pub struct Endpoint<T> {
    pub request: HttpRequest,
    _response: PhantomData<fn() -> T>,
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            _response: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .finish()
    }
}

impl<T: DeserializeOwned> Endpoint<T> {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            _response: PhantomData,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(HttpRequest::new(HttpMethod::Get, path))
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpRequest::new(HttpMethod::Delete, path))
    }

    pub(crate) fn post_empty(path: impl Into<String>) -> Self {
        Self::new(HttpRequest::new(HttpMethod::Post, path))
    }

    pub(crate) fn post_json<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Ok(Self::new(HttpRequest::new(HttpMethod::Post, path).json(to_json(body)?)))
    }

    pub(crate) fn put_json<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Ok(Self::new(HttpRequest::new(HttpMethod::Put, path).json(to_json(body)?)))
    }

    pub(crate) fn post_form(path: impl Into<String>, form: Multipart) -> Self {
        Self::new(HttpRequest::new(HttpMethod::Post, path).multipart(form))
    }

    /// Map a response to `T`, or to the error its status implies.
    pub fn parse(&self, response: &HttpResponse) -> Result<T, ApiError> {
        check_status(response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_response(response))
}
