#![forbid(unsafe_code)]

//! Query-string readers. Absent and blank values are `None`; present but malformed values are
//! input errors.

use crate::ApiError;
use am_core::window::DateWindow;
use std::collections::HashMap;

pub(crate) type Params = HashMap<String, String>;

pub(crate) fn optional_string(params: &Params, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn required_string(params: &Params, key: &str) -> Result<String, ApiError> {
    optional_string(params, key)
        .ok_or_else(|| ApiError::input(format!("Parameter {key} wajib diisi.")))
}

pub(crate) fn optional_i64(params: &Params, key: &str) -> Result<Option<i64>, ApiError> {
    let Some(value) = optional_string(params, key) else {
        return Ok(None);
    };
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::input(format!("Parameter {key} harus berupa bilangan bulat.")))
}

pub(crate) fn optional_usize(params: &Params, key: &str) -> Result<Option<usize>, ApiError> {
    let Some(value) = optional_string(params, key) else {
        return Ok(None);
    };
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| ApiError::input(format!("Parameter {key} harus berupa bilangan positif.")))
}

pub(crate) fn optional_bool(params: &Params, key: &str) -> Result<Option<bool>, ApiError> {
    let Some(value) = optional_string(params, key) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(Some(true)),
        "0" | "false" | "no" => Ok(Some(false)),
        _ => Err(ApiError::input(format!(
            "Parameter {key} harus bernilai true atau false."
        ))),
    }
}

/// Comma-separated list with blanks dropped.
pub(crate) fn csv_list(params: &Params, key: &str) -> Vec<String> {
    optional_string(params, key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn date_window(
    params: &Params,
    start_key: &str,
    end_key: &str,
) -> Result<DateWindow, ApiError> {
    Ok(DateWindow::parse(
        params.get(start_key).map(String::as_str),
        params.get(end_key).map(String::as_str),
    )?)
}
