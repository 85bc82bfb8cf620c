#![forbid(unsafe_code)]

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub label: String,
    pub count: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u8,
    pub count: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BusiestHour {
    pub start: u8,
    pub end: u8,
    pub count: i64,
}

impl BusiestHour {
    /// Reported when the fact store has no events.
    pub const FALLBACK: Self = Self {
        start: 13,
        end: 14,
        count: 0,
    };

    pub fn for_hour(hour: u8, count: i64) -> Self {
        Self {
            start: hour,
            end: (hour + 1) % 24,
            count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScopeSuccessRate {
    pub scope: String,
    pub success: i64,
    pub failed: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub cluster: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub view_only: i64,
    pub download: i64,
    pub export: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub success_logins: i64,
    pub total_activity: i64,
    pub logout_errors: i64,
    pub busiest_hour: BusiestHour,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

/// Interaction chart: top scopes plus the totals the dashboard shows beside them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionChart {
    pub scopes: Vec<GroupCount>,
    pub total: i64,
}
