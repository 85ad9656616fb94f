//! HTTP surface of the portal.

mod extract;
mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use crate::config::Config;
use crate::error::internal_error_response;
use crate::notice::NoticeSigner;
use axum::{extract::FromRef, middleware as axum_middleware, response::Response, routing::get, Router};
use std::any::Any;
use student_store::StudentStore;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

/// Shared application state.
///
/// Holds no connection: handlers open one per storage operation.
#[derive(Clone)]
pub struct AppState {
    /// Registration database handle
    pub store: StudentStore,
    /// Notice cookie signer
    pub notices: NoticeSigner,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: StudentStore, notices: NoticeSigner) -> Self {
        Self { store, notices }
    }

    /// Build state from the startup configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = StudentStore::new(config.store.path.clone())
            .with_busy_timeout(config.store.busy_timeout);
        let notices = NoticeSigner::new(config.session.secret_key.clone());
        Self::new(store, notices)
    }
}

impl FromRef<AppState> for NoticeSigner {
    fn from_ref(state: &AppState) -> Self {
        state.notices.clone()
    }
}

fn handle_panic(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("Handler panicked");
    internal_error_response()
}

/// Create the portal router.
pub fn create_router(state: AppState) -> Router {
    with_layers(routes()).with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/confirmation", get(handlers::confirmation))
        .route("/students", get(handlers::students))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
}

/// Wrap `routes` in request logging, tracing and the panic-to-500 handler.
pub fn with_layers(routes: Router<AppState>) -> Router<AppState> {
    routes
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
