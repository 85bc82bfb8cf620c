#![forbid(unsafe_code)]

use std::path::PathBuf;
use thiserror::Error as ThisError;

///
/// RenderError
///
/// Every variant names the step that failed, so callers can log which template and format
/// broke without inspecting the cause.
///

#[derive(Debug, ThisError)]
pub enum RenderError {
    #[error("encoding {template} report as {format} failed: {cause}")]
    Encode {
        template: &'static str,
        format: &'static str,
        cause: String,
    },

    #[error("writing report file {} failed: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rendering {template} report as {format} was cancelled")]
    Cancelled {
        template: &'static str,
        format: &'static str,
    },
}

impl RenderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
