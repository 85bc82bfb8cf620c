#![forbid(unsafe_code)]

//! Report renderers. Each emitter is a pure function of a [`ReportDocument`] and
//! [`ReportMeta`]; [`render`] adds the file write.

mod csv;
mod error;
mod format;
mod pdf;
mod xlsx;

pub use error::RenderError;
pub use format::{format_count, format_percentage, format_timestamp};

use am_core::categorize::FeatureCategory;
use am_core::report::{ReportDocument, ReportFormat, ReportTemplate, percentage};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

pub const GENERATOR_NAME: &str = "Activity Monitor";

/// Rows emitted between two cancellation checks.
const ROW_BATCH: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportMeta {
    pub requester_name: String,
    pub requester_email: String,
    pub requested_at: OffsetDateTime,
}

impl ReportMeta {
    /// `Name <email>`, or just the name when no email is known.
    pub fn requester(&self) -> String {
        let name = self.requester_name.trim();
        let email = self.requester_email.trim();
        if email.is_empty() {
            name.to_string()
        } else {
            format!("{name} <{email}>")
        }
    }
}

/// `<template_id>_<YYYYMMDD_HHMMSS>.<ext>`.
pub fn file_name(
    template: ReportTemplate,
    format: ReportFormat,
    requested_at: OffsetDateTime,
) -> String {
    format!(
        "{}_{}.{}",
        template.id(),
        format::file_stamp(requested_at),
        format.extension()
    )
}

/// Encodes `doc` without touching the filesystem.
pub fn render_bytes(
    doc: &ReportDocument,
    meta: &ReportMeta,
    format: ReportFormat,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, RenderError> {
    let ctx = RenderContext {
        doc,
        meta,
        format,
        cancel,
    };
    match format {
        ReportFormat::Csv => csv::render(&ctx),
        ReportFormat::Xlsx => xlsx::render(&ctx),
        ReportFormat::Pdf => pdf::render(&ctx),
    }
}

/// Renders `doc` into `out_dir` and returns the written path. A failed write may leave a
/// partial file behind.
pub fn render(
    doc: &ReportDocument,
    meta: &ReportMeta,
    format: ReportFormat,
    out_dir: &Path,
    cancel: &CancellationToken,
) -> Result<PathBuf, RenderError> {
    let bytes = render_bytes(doc, meta, format, cancel)?;
    std::fs::create_dir_all(out_dir).map_err(|source| RenderError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let path = out_dir.join(file_name(doc.template, format, meta.requested_at));
    std::fs::write(&path, &bytes).map_err(|source| RenderError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(
        template = doc.template.id(),
        format = format.as_str(),
        bytes = bytes.len(),
        path = %path.display(),
        "report rendered"
    );
    Ok(path)
}

struct DetailLine<'a> {
    index: usize,
    name: &'a str,
    category: Option<&'static str>,
    count: i64,
    share: f64,
}

/// Shared view handed to each emitter.
struct RenderContext<'a> {
    doc: &'a ReportDocument,
    meta: &'a ReportMeta,
    format: ReportFormat,
    cancel: &'a CancellationToken,
}

impl RenderContext<'_> {
    fn generated_at(&self) -> String {
        format_timestamp(self.meta.requested_at)
    }

    /// Detail rows numbered from 1, with percentages over the detail sum.
    fn detail_rows(&self) -> impl Iterator<Item = DetailLine<'_>> + '_ {
        let total = self.doc.details_total();
        self.doc
            .details
            .iter()
            .enumerate()
            .map(move |(index, row)| DetailLine {
                index: index + 1,
                name: row.name.as_str(),
                category: row.category.map(FeatureCategory::as_str),
                count: row.count,
                share: percentage(row.count, total),
            })
    }

    /// Feature-usage tables carry a category column after the name.
    fn shows_category(&self) -> bool {
        self.doc.template == ReportTemplate::FeatureUsage
    }

    /// Fails with `Cancelled` at each batch boundary once the token fires.
    fn checkpoint(&self, rows_done: usize) -> Result<(), RenderError> {
        if rows_done % ROW_BATCH == 0 && self.cancel.is_cancelled() {
            return Err(RenderError::Cancelled {
                template: self.doc.template.id(),
                format: self.format.as_str(),
            });
        }
        Ok(())
    }

    fn encode_error(&self, cause: impl std::fmt::Display) -> RenderError {
        RenderError::Encode {
            template: self.doc.template.id(),
            format: self.format.as_str(),
            cause: cause.to_string(),
        }
    }
}
