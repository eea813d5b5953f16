//! gitshelf - browse local git repositories and serve them over Smart HTTP
//!
//! `app` builds the full axum router from an `AppState`; the binary in
//! `main.rs` only loads configuration, scans the root and serves it.

pub mod config;
pub mod error;
pub mod git;
pub mod models;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::git::SharedRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(registry: SharedRegistry, config: Config) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
