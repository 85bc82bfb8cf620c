#![forbid(unsafe_code)]

use crate::{ApiError, AppState};
use am_core::ids::TransactionId;
use am_core::window::{TimeRange, now_ms};
use am_storage::{
    ActivityRecord, DashboardStats, DateBounds, HourCount, InteractionChart, ScopeSuccessRate,
};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

const RECENT_ACTIVITY_LIMIT: usize = 50;
const HOURLY_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Serialize)]
pub(crate) struct RecentActivities {
    data: Vec<ActivityRecord>,
    total: usize,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Chart {
    Interaction(InteractionChart),
    Hourly(Vec<HourCount>),
}

pub(crate) async fn stats(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.store(&cancel, |store| store.dashboard_stats()).await?))
}

pub(crate) async fn activities(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
) -> Result<Json<RecentActivities>, ApiError> {
    let data = state
        .store(&cancel, |store| store.recent_activities(RECENT_ACTIVITY_LIMIT))
        .await?;
    Ok(Json(RecentActivities {
        total: data.len(),
        data,
    }))
}

/// One activity by its source transaction id.
pub(crate) async fn activity(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Path(transaction_id): Path<String>,
) -> Result<Json<ActivityRecord>, ApiError> {
    let transaction_id = TransactionId::parse(&transaction_id)
        .map_err(|_| ApiError::input("ID transaksi tidak valid."))?;
    state
        .store(&cancel, move |store| store.fact_by_transaction_id(&transaction_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Aktivitas tidak ditemukan.".to_string()))
}

/// `interaction` is the scope mix; `hourly` covers the last 24 hours.
pub(crate) async fn chart(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Path(kind): Path<String>,
) -> Result<Json<Chart>, ApiError> {
    match kind.as_str() {
        "interaction" => Ok(Json(Chart::Interaction(
            state.store(&cancel, |store| store.interaction_chart()).await?,
        ))),
        "hourly" => {
            let window = TimeRange::rolling_hours(now_ms(), HOURLY_WINDOW_HOURS);
            Ok(Json(Chart::Hourly(
                state.store(&cancel, move |store| store.count_by_hour(window)).await?,
            )))
        }
        _ => Err(ApiError::input("Jenis grafik tidak dikenal.")),
    }
}

pub(crate) async fn access_success(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
) -> Result<Json<Vec<ScopeSuccessRate>>, ApiError> {
    Ok(Json(
        state
            .store(&cancel, |store| store.access_success_rate_by_scope())
            .await?,
    ))
}

pub(crate) async fn date_range(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
) -> Result<Json<DateBounds>, ApiError> {
    Ok(Json(state.store(&cancel, |store| store.date_bounds()).await?))
}
