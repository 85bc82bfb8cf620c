#![forbid(unsafe_code)]

use crate::args::{Params, date_window, optional_string, optional_usize};
use crate::{ApiError, AppState};
use am_core::window::TimeRange;
use am_storage::{ExportStats, GroupCount, RankingRow};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use tokio_util::sync::CancellationToken;

const DEFAULT_INTENT_LIMIT: usize = 10;

/// Window and optional cluster shared by the content endpoints.
fn scope(params: &Params) -> Result<(TimeRange, Option<String>), ApiError> {
    let window = date_window(params, "start_date", "end_date")?.to_time_range();
    Ok((window, optional_string(params, "cluster")))
}

pub(crate) async fn dashboard_rankings(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<RankingRow>>, ApiError> {
    let (window, _) = scope(&params)?;
    Ok(Json(
        state
            .store(&cancel, move |store| store.dashboard_rankings(window))
            .await?,
    ))
}

pub(crate) async fn search_modules(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let (window, cluster) = scope(&params)?;
    Ok(Json(
        state
            .store(&cancel, move |store| {
                store.search_module_usage(window, cluster.as_deref())
            })
            .await?,
    ))
}

pub(crate) async fn export_stats(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<ExportStats>, ApiError> {
    let (window, cluster) = scope(&params)?;
    Ok(Json(
        state
            .store(&cancel, move |store| store.export_stats(window, cluster.as_deref()))
            .await?,
    ))
}

pub(crate) async fn operational_intents(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let (window, cluster) = scope(&params)?;
    let limit = optional_usize(&params, "limit")?.unwrap_or(DEFAULT_INTENT_LIMIT);
    Ok(Json(
        state
            .store(&cancel, move |store| {
                store.operational_intents(window, cluster.as_deref(), limit)
            })
            .await?,
    ))
}

pub(crate) async fn global_economics(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<GroupCount>>, ApiError> {
    let (window, _) = scope(&params)?;
    Ok(Json(
        state
            .store(&cancel, move |store| store.global_economics_chart(window))
            .await?,
    ))
}
