//! In-memory stand-in for the social backend, used as a test fixture.
//!
//! Routes, status codes and error bodies follow the real service closely
//! enough for the client crate to run end to end against it.

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod routes;
pub mod store;

pub use store::{Db, Store};

/// Room for the largest upload (50MB video) plus multipart framing.
const BODY_LIMIT: usize = 64 * 1024 * 1024;

pub fn app() -> Router {
    app_with_db(Store::new_db())
}

/// Build the app over an existing store so callers can seed or inspect it.
pub fn app_with_db(db: Db) -> Router {
    routes::router()
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, Store::new_db()).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}
