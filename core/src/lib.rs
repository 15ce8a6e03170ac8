//! Client-side data layer for the social API.
//!
//! # Overview
//! Typed endpoints build `HttpRequest` values and parse `HttpResponse`
//! values without touching the network; a `Transport` executes the actual
//! round-trip. On top of that sit the configured client (bearer token,
//! error normalization, 401 teardown), a keyed query cache with declared
//! invalidations, and the session lifecycle.
//!
//! # Design
//! - `AppContext` bundles client, session and cache and is passed to every
//!   operation. There is no global state.
//! - `api::*` functions are pure: `Endpoint<T>` is a request plus the type
//!   its reply decodes to.
//! - `query::*` pairs endpoints with cache keys; `mutation::*` pairs them
//!   with the keys they invalidate.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod format;
pub mod http;
pub mod mutation;
pub mod query;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use cache::{QueryCache, QueryKey, Subscription};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use context::{AppContext, AppContextBuilder, QueryOptions, QueryResult, QueryStatus, RegisterOutcome};
pub use error::{ApiError, ValidationIssue};
pub use events::{Navigator, Notifier};
pub use format::{relative_time, StoryExpiry};
pub use http::{FileUpload, HttpMethod, HttpRequest, HttpResponse};
pub use mutation::Mutation;
pub use query::Query;
pub use session::{Session, SessionStatus};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{Transport, UreqTransport};
