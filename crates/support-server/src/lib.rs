//! Support service library logic.
//!
//! The router serves a landing page, a signup form, and a health check. Every
//! request first passes through [`middleware::schema_guard_middleware`], which
//! provisions the database schema the first time the process sees a request.

pub mod config;
pub mod flash;
pub mod guard;
pub mod middleware;
pub mod signup;
pub mod views;

use axum::{routing::get, Extension, Json, Router};
use guard::InitGuard;
use serde_json::{json, Value};
use std::sync::Arc;
use support_db::ConnectionProvider;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Hands out one database connection per operation.
    pub provider: Arc<dyn ConnectionProvider>,
    /// Tracks whether the schema pass has been attempted in this process.
    pub init_guard: Arc<InitGuard>,
    /// Disables the schema pass for this run (`SKIP_DB_INIT`).
    pub skip_schema_init: bool,
}

impl AppState {
    /// Builds state with a fresh, unset initialization guard.
    pub fn new(provider: Arc<dyn ConnectionProvider>, skip_schema_init: bool) -> Self {
        Self {
            provider,
            init_guard: Arc::new(InitGuard::new()),
            skip_schema_init,
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(signup::landing_handler))
        .route(
            "/signup",
            get(signup::signup_form_handler).post(signup::signup_submit_handler),
        )
        .route("/health", get(health))
        .layer(axum::middleware::from_fn(
            middleware::schema_guard_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
