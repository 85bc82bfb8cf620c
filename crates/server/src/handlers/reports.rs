#![forbid(unsafe_code)]

use crate::{ApiError, AppState};
use am_core::report::{ReportFormat, ReportTemplate};
use am_core::window::DateWindow;
use am_reports::ReportMeta;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio_util::sync::CancellationToken;

const DEFAULT_REQUESTER: &str = "Administrator";
const USER_NAME_HEADER: &str = "x-user-name";
const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateReportBody {
    template_id: String,
    format: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeneratedReport {
    file_name: String,
    format: ReportFormat,
    template_id: String,
    generated_at: String,
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Requester identity comes from the upstream auth proxy.
fn report_meta(headers: &HeaderMap, requested_at: OffsetDateTime) -> ReportMeta {
    ReportMeta {
        requester_name: header_text(headers, USER_NAME_HEADER)
            .unwrap_or_else(|| DEFAULT_REQUESTER.to_string()),
        requester_email: header_text(headers, USER_EMAIL_HEADER).unwrap_or_default(),
        requested_at,
    }
}

pub(crate) async fn generate(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    headers: HeaderMap,
    body: Result<Json<GenerateReportBody>, JsonRejection>,
) -> Result<Json<GeneratedReport>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::input("Isi permintaan laporan tidak valid."))?;
    let template = ReportTemplate::parse(&body.template_id)
        .ok_or_else(|| ApiError::input("Template laporan tidak dikenal."))?;
    let format = ReportFormat::parse(&body.format)
        .ok_or_else(|| ApiError::input("Format laporan tidak didukung."))?;
    let window = DateWindow::parse(body.start_date.as_deref(), body.end_date.as_deref())?;

    let doc = state
        .store(&cancel, move |store| store.build_report(template, window))
        .await?;

    let requested_at = OffsetDateTime::now_utc();
    let meta = report_meta(&headers, requested_at);
    let out_dir = state.reports_dir.as_ref().clone();
    let render_cancel = cancel.clone();
    let path = tokio::task::spawn_blocking(move || {
        am_reports::render(&doc, &meta, format, &out_dir, &render_cancel)
    })
    .await
    .map_err(|err| ApiError::Upstream(format!("render task failed: {err}")))??;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Upstream(format!("unexpected report path {}", path.display())))?;
    Ok(Json(GeneratedReport {
        file_name,
        format,
        template_id: template.id().to_string(),
        generated_at: requested_at
            .format(&Rfc3339)
            .map_err(|err| ApiError::Upstream(err.to_string()))?,
    }))
}

/// Plain file names only; anything that could leave the reports directory is refused.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && !name.starts_with('.')
}

pub(crate) async fn download(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_file_name(&file_name) {
        return Err(ApiError::input("Nama berkas tidak valid."));
    }
    let format = file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| ReportFormat::parse(ext))
        .ok_or_else(|| ApiError::input("Nama berkas tidak valid."))?;

    let path = state.reports_dir.join(&file_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Berkas laporan tidak ditemukan.".to_string()));
        }
        Err(err) => return Err(ApiError::Upstream(format!("reading {}: {err}", path.display()))),
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|_| ApiError::input("Nama berkas tidak valid."))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
