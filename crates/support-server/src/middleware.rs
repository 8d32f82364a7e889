use axum::{body::Body, http::Request, http::StatusCode, middleware::Next, response::Response};
use std::sync::Arc;
use support_db::{initialize_schema, SchemaOutcome};

use crate::AppState;

/// Provisions the database schema on the first request the process sees.
///
/// Once the guard is set this is a flag read and nothing more. Until then the
/// schema pass runs on the blocking pool before the request continues. The
/// request is always forwarded, whatever the pass reported.
pub async fn schema_guard_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    if !state.init_guard.is_initialized() {
        let result = tokio::task::spawn_blocking(move || {
            state.init_guard.run_once(|| {
                initialize_schema(state.provider.as_ref(), state.skip_schema_init)
            })
        })
        .await;

        match result {
            Ok(Some(SchemaOutcome::Applied(count))) => {
                tracing::debug!(statements = count, "first-request schema pass complete");
            }
            Ok(Some(outcome)) => {
                tracing::debug!(?outcome, "first-request schema pass did not apply");
            }
            // Another request set the flag while this one waited.
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "schema initialization task panicked or was cancelled");
            }
        }
    }

    Ok(next.run(req).await)
}
