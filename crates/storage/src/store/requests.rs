#![forbid(unsafe_code)]

use am_core::ids::TransactionId;
use am_core::model::{ActivityType, Cluster, Location, OrgUnit, UserProfile};
use am_core::paging::Pagination;
use am_core::window::TimeRange;

/// Org-unit constraint: a case-insensitive name substring, or an explicit id set (subtree
/// selection). An empty id set matches nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrgUnitFilter {
    Name(String),
    Ids(Vec<i64>),
}

/// The composable predicate shared by search, aggregates and reports. Every option is a
/// conjunct; blank strings and empty sets impose no constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub text: Option<String>,
    pub org_unit: Option<OrgUnitFilter>,
    pub cluster: Option<String>,
    pub level_label: Option<String>,
    pub status: Option<String>,
    pub activity_type_names: Vec<String>,
    pub window: TimeRange,
}

impl ActivityFilter {
    pub fn in_window(window: TimeRange) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn with_cluster(mut self, cluster: Option<&str>) -> Self {
        self.cluster = cluster.map(str::to_string);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRequest {
    pub filter: ActivityFilter,
    pub order: ScanOrder,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub filter: ActivityFilter,
    pub pagination: Pagination,
}

/// Grouping key for `group_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactDimension {
    User,
    OrgUnit,
    ActivityType,
    Cluster,
    Location,
    Province,
    Status,
    Scope,
    Hour,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrgTreeRequest {
    pub level_label: Option<String>,
    pub include_activity_count: bool,
    pub window: TimeRange,
}

/// Offline seed of the reference dimensions. Rows are upserted by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedDimensionsRequest {
    pub org_units: Vec<OrgUnit>,
    pub activity_types: Vec<ActivityType>,
    pub clusters: Vec<Cluster>,
    pub locations: Vec<Location>,
    pub users: Vec<UserProfile>,
}

/// One denormalized row as delivered by the source system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawActivityEvent {
    pub transaction_id: TransactionId,
    pub user_name: String,
    pub user_email: String,
    pub org_unit_name: Option<String>,
    pub activity_type_name: String,
    pub cluster_name: Option<String>,
    pub location_name: Option<String>,
    pub scope: String,
    pub detail: String,
    pub status: String,
    pub event_ts_ms: i64,
}
