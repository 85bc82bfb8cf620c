#![forbid(unsafe_code)]

use crate::AppState;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const SLOW_REQUEST: Duration = Duration::from_secs(2);
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-User-Name, X-User-Email";

/// Attaches a cancellation token that fires if the request future is dropped before the
/// response is ready, and logs one line per request.
pub(crate) async fn request_context(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let cancel = CancellationToken::new();
    request.extensions_mut().insert(cancel.clone());
    let guard = cancel.drop_guard();

    let response = next.run(request).await;
    guard.disarm();

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), latency_ms, "request failed");
    } else if started.elapsed() >= SLOW_REQUEST {
        tracing::warn!(%method, %path, status = status.as_u16(), latency_ms, "slow request");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "request");
    }
    response
}

/// Answers preflights and decorates responses for allowed origins. Disallowed origins get
/// no CORS headers, so the browser blocks the response.
pub(crate) async fn cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let allowed = origin
        .as_deref()
        .filter(|origin| state.allowed_origins.allows(origin))
        .map(str::to_string);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = allowed {
        let headers = response.headers_mut();
        let allow_origin = match state.allowed_origins.as_ref() {
            crate::config::AllowedOrigins::Any => HeaderValue::from_static("*"),
            crate::config::AllowedOrigins::List(_) => {
                HeaderValue::from_str(&origin).unwrap_or_else(|_| HeaderValue::from_static("null"))
            }
        };
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
    response
}
