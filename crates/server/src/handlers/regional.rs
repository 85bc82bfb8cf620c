#![forbid(unsafe_code)]

use crate::args::{Params, date_window, optional_usize, required_string};
use crate::{ApiError, AppState};
use am_storage::{GroupCount, HourCount};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONTRIBUTORS: usize = 10;

pub(crate) async fn provinces(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let window = date_window(&params, "start_date", "end_date")?.to_time_range();
    Ok(Json(
        state
            .store(&cancel, move |store| store.count_by_province(window))
            .await?,
    ))
}

pub(crate) async fn locations(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let window = date_window(&params, "start_date", "end_date")?.to_time_range();
    Ok(Json(
        state
            .store(&cancel, move |store| store.count_by_location(window))
            .await?,
    ))
}

pub(crate) async fn units(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let window = date_window(&params, "start_date", "end_date")?.to_time_range();
    Ok(Json(
        state
            .store(&cancel, move |store| store.count_by_org_unit_name(window))
            .await?,
    ))
}

/// Hour-of-day profile of one unit, selected by exact name in `unit`.
pub(crate) async fn units_hourly(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<HourCount>>, ApiError> {
    let unit = required_string(&params, "unit")?;
    let window = date_window(&params, "start_date", "end_date")?.to_time_range();
    Ok(Json(
        state
            .store(&cancel, move |store| store.count_by_hour_for_unit(&unit, window))
            .await?,
    ))
}

pub(crate) async fn top_contributors(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let window = date_window(&params, "start_date", "end_date")?.to_time_range();
    let limit = optional_usize(&params, "limit")?.unwrap_or(DEFAULT_CONTRIBUTORS);
    Ok(Json(
        state
            .store(&cancel, move |store| store.top_contributors(window, limit))
            .await?,
    ))
}
