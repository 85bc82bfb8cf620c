#![forbid(unsafe_code)]

use crate::args::{Params, csv_list, date_window, optional_i64, optional_string};
use crate::{ApiError, AppState};
use am_core::model::OrgUnit;
use am_core::paging::{DEFAULT_PAGE_SIZE, Pagination};
use am_core::window::{DateRangePreset, DateWindow, date_of_ms, now_ms};
use am_storage::{
    ActivityFilter, OrgUnitFilter, SearchPage, SearchRequest, Suggestion, UserMatch,
};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use tokio_util::sync::CancellationToken;

/// A `dateRange` preset wins over explicit dates unless it is `custom`.
fn search_window(params: &Params) -> Result<DateWindow, ApiError> {
    let custom = date_window(params, "startDate", "endDate")?;
    match optional_string(params, "dateRange") {
        Some(preset) => Ok(DateRangePreset::parse(&preset)?.resolve(date_of_ms(now_ms()), custom)),
        None => Ok(custom),
    }
}

pub(crate) fn search_request(params: &Params) -> Result<SearchRequest, ApiError> {
    let window = search_window(params)?;
    let filter = ActivityFilter {
        text: optional_string(params, "q"),
        org_unit: optional_string(params, "satker").map(OrgUnitFilter::Name),
        cluster: optional_string(params, "cluster"),
        level_label: optional_string(params, "eselon"),
        status: optional_string(params, "status"),
        activity_type_names: csv_list(params, "activityTypes"),
        window: window.to_time_range(),
    };
    let pagination = Pagination {
        page: optional_i64(params, "page")?.unwrap_or(1),
        page_size: optional_i64(params, "pageSize")?.unwrap_or(DEFAULT_PAGE_SIZE),
    };
    Ok(SearchRequest { filter, pagination })
}

pub(crate) async fn search(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<SearchPage>, ApiError> {
    let request = search_request(&params)?;
    Ok(Json(
        state
            .store(&cancel, move |store| store.search_activities(request))
            .await?,
    ))
}

pub(crate) async fn suggestions(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
    let q = optional_string(&params, "q").unwrap_or_default();
    Ok(Json(
        state.store(&cancel, move |store| store.suggestions(&q)).await?,
    ))
}

pub(crate) async fn users(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<UserMatch>>, ApiError> {
    let q = optional_string(&params, "q").unwrap_or_default();
    Ok(Json(
        state.store(&cancel, move |store| store.search_users(&q)).await?,
    ))
}

pub(crate) async fn org_units(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<OrgUnit>>, ApiError> {
    let q = optional_string(&params, "q").unwrap_or_default();
    Ok(Json(
        state
            .store(&cancel, move |store| store.search_org_units(&q))
            .await?,
    ))
}
