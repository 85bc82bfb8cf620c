#![forbid(unsafe_code)]

use am_core::window::WindowError;
use am_reports::RenderError;
use am_storage::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error as ThisError;

const UPSTREAM_MESSAGE: &str = "Terjadi kesalahan pada server. Silakan coba lagi.";

///
/// ApiError
///
/// User-facing messages are Indonesian. `Upstream` keeps the internal detail for the log only.
///

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Client closed request; nobody reads the body.
            Self::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput(_) => Self::input("Parameter permintaan tidak valid."),
            StoreError::NotFound(_) | StoreError::UnknownReference { .. } => {
                Self::NotFound("Data tidak ditemukan.".to_string())
            }
            StoreError::Duplicate { .. } => Self::Conflict("Data sudah ada.".to_string()),
            StoreError::Cancelled => Self::Cancelled,
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        if err.is_cancelled() {
            return Self::Cancelled;
        }
        Self::Upstream(err.to_string())
    }
}

impl From<WindowError> for ApiError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::InvalidDate(_) => {
                Self::input("Format tanggal tidak valid, gunakan YYYY-MM-DD.")
            }
            WindowError::Inverted => {
                Self::input("Tanggal mulai tidak boleh setelah tanggal akhir.")
            }
            WindowError::UnknownPreset(_) => Self::input("Rentang tanggal tidak dikenal."),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Upstream(detail) => {
                tracing::error!(detail = %detail, "request failed upstream");
                UPSTREAM_MESSAGE.to_string()
            }
            Self::Cancelled => {
                tracing::debug!("request cancelled by client");
                return status.into_response();
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status_classes() {
        let cases = [
            (StoreError::InvalidInput("bad"), StatusCode::BAD_REQUEST),
            (StoreError::NotFound("org unit"), StatusCode::NOT_FOUND),
            (
                StoreError::UnknownReference {
                    table: "ref_clusters",
                    id: 7,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::Duplicate {
                    transaction_id: "x".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (StoreError::PoolClosed, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert!(matches!(
            ApiError::from(StoreError::Cancelled),
            ApiError::Cancelled
        ));
    }

    #[tokio::test]
    async fn upstream_detail_never_reaches_the_body() {
        let err = ApiError::from(StoreError::Worker("sqlite at /srv/db".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf-8");
        assert!(!text.contains("/srv/db"));
        assert!(text.contains("Terjadi kesalahan"));
    }
}
