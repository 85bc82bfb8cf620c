#![forbid(unsafe_code)]

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// `200 {status:"ok"}` after a store round-trip, `503` when the store does not answer.
pub(crate) async fn healthz(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
) -> (StatusCode, Json<Value>) {
    match state.pool.run(&cancel, |store| store.ping()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
