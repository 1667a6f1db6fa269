pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod report;
pub mod stats;
pub mod team;
pub mod tech_stack;
pub mod util;

use axum::Router;

use crate::db::AppState;

/// The full HTTP application, without transport layers.
pub fn app(state: AppState) -> Router {
    handlers::router(state.clone()).with_state(state)
}
