#![forbid(unsafe_code)]

//! HTTP surface of the activity monitor: JSON query endpoints under `/api`, report generation
//! and download, and a liveness check.

mod args;
pub mod config;
mod error;
mod handlers;
mod middleware;
mod state;

pub use config::{AllowedOrigins, Config, ConfigError};
pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::routing::get;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", handlers::api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cors,
        ))
        .layer(axum::middleware::from_fn(middleware::request_context))
        .with_state(state)
}
