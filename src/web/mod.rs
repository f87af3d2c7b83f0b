//! HTTP API (axum router, handlers, error mapping).
//!
//! - `routes/`: one file per area (public catalog, admin catalog, invoices)
//! - `errors.rs`: JSON error responses
//! - `middleware.rs`: bearer-token admin sessions

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::config::Config;
use crate::db::Database;

pub mod errors;
pub mod middleware;
pub mod routes;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build the full HTTP router.
pub fn build_app(state: AppState) -> Router {
    // Everything under /admin except login needs a valid session.
    let protected = routes::admin::router()
        .merge(routes::invoices::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    let admin = Router::new()
        .route("/login", axum::routing::post(routes::admin::login))
        .merge(protected);

    Router::new()
        .route("/health", get(routes::public::health))
        .merge(routes::public::router())
        .nest("/admin", admin)
        .with_state(state)
}
