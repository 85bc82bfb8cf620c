#![forbid(unsafe_code)]

mod content;
mod dashboard;
mod health;
mod org_tree;
mod regional;
mod reports;
mod search;

use crate::AppState;
use axum::Router;
use axum::routing::{get, post};

pub(crate) use health::healthz;

/// Routes mounted under `/api`.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/activities", get(dashboard::activities))
        .route("/dashboard/activities/:transaction_id", get(dashboard::activity))
        .route("/dashboard/charts/:kind", get(dashboard::chart))
        .route("/dashboard/access-success", get(dashboard::access_success))
        .route("/dashboard/date-range", get(dashboard::date_range))
        .route("/regional/provinces", get(regional::provinces))
        .route("/regional/locations", get(regional::locations))
        .route("/regional/units", get(regional::units))
        .route("/regional/units/hourly", get(regional::units_hourly))
        .route("/regional/top-contributors", get(regional::top_contributors))
        .route("/content/dashboard-rankings", get(content::dashboard_rankings))
        .route("/content/search-modules", get(content::search_modules))
        .route("/content/export-stats", get(content::export_stats))
        .route("/content/operational-intents", get(content::operational_intents))
        .route("/content/global-economics", get(content::global_economics))
        .route("/search", get(search::search))
        .route("/search/suggestions", get(search::suggestions))
        .route("/search/users", get(search::users))
        .route("/search/satker", get(search::org_units))
        .route("/org-tree", get(org_tree::tree))
        .route("/org-tree/levels", get(org_tree::levels))
        .route("/org-tree/search", get(org_tree::search))
        .route("/reports/generate", post(reports::generate))
        .route("/reports/files/:file_name", get(reports::download))
}
