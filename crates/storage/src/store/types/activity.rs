#![forbid(unsafe_code)]

use am_core::window::serialize_ms_rfc3339;
use serde::Serialize;

/// A fact with its dimensions preloaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub transaction_id: String,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub org_unit_id: Option<i64>,
    pub org_unit_name: Option<String>,
    pub level_label: Option<String>,
    pub activity_type_id: i64,
    pub activity_type: String,
    pub category: String,
    pub cluster: Option<String>,
    pub location: Option<String>,
    pub province: Option<String>,
    pub region: Option<&'static str>,
    pub scope: String,
    pub detail: String,
    pub status: String,
    #[serde(rename = "event_time", serialize_with = "serialize_ms_rfc3339")]
    pub event_ts_ms: i64,
    #[serde(rename = "ingested_at", serialize_with = "serialize_ms_rfc3339")]
    pub ingested_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub data: Vec<ActivityRecord>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}
