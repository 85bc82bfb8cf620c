#![forbid(unsafe_code)]

use crate::args::{Params, date_window, optional_bool, optional_string};
use crate::{ApiError, AppState};
use am_core::tree::OrgTreeNode;
use am_storage::{OrgTreeRequest, OrgUnitPath};
use axum::extract::{Query, State};
use axum::{Extension, Json};
use tokio_util::sync::CancellationToken;

pub(crate) async fn tree(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<OrgTreeNode>>, ApiError> {
    let request = OrgTreeRequest {
        level_label: optional_string(&params, "eselon_level"),
        include_activity_count: optional_bool(&params, "include_activity_count")?.unwrap_or(false),
        window: date_window(&params, "start_date", "end_date")?.to_time_range(),
    };
    Ok(Json(
        state.store(&cancel, move |store| store.org_tree(request)).await?,
    ))
}

pub(crate) async fn levels(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        state.store(&cancel, |store| store.org_unit_levels()).await?,
    ))
}

pub(crate) async fn search(
    State(state): State<AppState>,
    Extension(cancel): Extension<CancellationToken>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<OrgUnitPath>>, ApiError> {
    let q = optional_string(&params, "q").unwrap_or_default();
    Ok(Json(
        state
            .store(&cancel, move |store| store.org_tree_search(&q))
            .await?,
    ))
}
