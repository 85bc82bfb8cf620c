#![forbid(unsafe_code)]

//! Dashboard, regional and content aggregates. Each one is a projection or grouping tail on
//! the shared fact skeleton; an empty store yields zeros and empty lists.

use super::*;
use am_core::categorize::{
    DOWNLOAD_MARKER, EXPORT_MARKER, SESSION_ACTIVITY_TYPES, VIEW_MARKER, economics_bucket_order,
};
use am_core::model::FactStatus;
use am_core::report::percentage;
use am_core::window::{TimeRange, date_of_ms, format_date};
use rusqlite::types::Value as SqlValue;
use std::collections::HashMap;

const TOP_N: i64 = 10;
const SEARCH_MODULE_LIMIT: i64 = 5;
const MAX_RECENT: usize = 500;

/// Activity-type name and scope, case-folded, for keyword matching.
const FEATURE_TEXT_EXPR: &str = "fold(COALESCE(a.name, '') || ' ' || COALESCE(f.scope, ''))";
const ECONOMICS_BUCKET_EXPR: &str = "economics_bucket(f.scope)";
const INTENT_LABEL_EXPR: &str =
    "COALESCE(NULLIF(TRIM(f.scope), ''), NULLIF(TRIM(f.detail), ''), a.name)";
const SEARCH_MODULE_LABEL_EXPR: &str = "COALESCE(NULLIF(TRIM(f.scope), ''), a.name)";

impl SqliteStore {
    pub fn count_by_status(&self, status: &str) -> Result<i64, StoreError> {
        let Some(status) = non_blank(Some(status)) else {
            return Err(StoreError::InvalidInput("status must not be empty"));
        };
        let filter = ActivityFilter {
            status: Some(status.to_string()),
            ..ActivityFilter::default()
        };
        self.count_where(&filter)
    }

    pub fn recent_activities(&self, limit: usize) -> Result<Vec<ActivityRecord>, StoreError> {
        let limit = to_sqlite_i64(limit.clamp(1, MAX_RECENT))?;
        facts::scan_facts(&self.conn, &FactQuery::new(), ScanOrder::NewestFirst, limit, 0)
    }

    /// Scope → count, descending; blank scopes are not counted.
    pub fn count_by_scope(
        &self,
        window: TimeRange,
        limit: Option<usize>,
    ) -> Result<Vec<GroupCount>, StoreError> {
        self.group_count(FactDimension::Scope, &ActivityFilter::in_window(window), limit)
    }

    /// Hour-of-day buckets (UTC) observed within `window`, ascending by hour.
    pub fn count_by_hour(&self, window: TimeRange) -> Result<Vec<HourCount>, StoreError> {
        let mut query = FactQuery::new();
        query.and_window(window);
        hour_counts(&self.conn, &query)
    }

    pub fn count_by_hour_for_unit(
        &self,
        unit_name: &str,
        window: TimeRange,
    ) -> Result<Vec<HourCount>, StoreError> {
        let Some(unit_name) = non_blank(Some(unit_name)) else {
            return Err(StoreError::InvalidInput("unit name must not be empty"));
        };
        let mut query = FactQuery::new();
        query
            .and("s.name = ?", [SqlValue::Text(unit_name.to_string())])
            .and_window(window);
        hour_counts(&self.conn, &query)
    }

    pub fn count_by_province(&self, window: TimeRange) -> Result<Vec<GroupCount>, StoreError> {
        self.top_groups(FactDimension::Province, window)
    }

    pub fn count_by_org_unit_name(&self, window: TimeRange) -> Result<Vec<GroupCount>, StoreError> {
        self.top_groups(FactDimension::OrgUnit, window)
    }

    pub fn count_by_location(&self, window: TimeRange) -> Result<Vec<GroupCount>, StoreError> {
        self.top_groups(FactDimension::Location, window)
    }

    /// Users ranked by fact count.
    pub fn top_contributors(
        &self,
        window: TimeRange,
        limit: usize,
    ) -> Result<Vec<GroupCount>, StoreError> {
        self.group_count(
            FactDimension::User,
            &ActivityFilter::in_window(window),
            Some(limit.clamp(1, 100)),
        )
    }

    fn top_groups(
        &self,
        dimension: FactDimension,
        window: TimeRange,
    ) -> Result<Vec<GroupCount>, StoreError> {
        FactQuery::from_filter(&ActivityFilter::in_window(window)).group_counts(
            &self.conn,
            &facts::dimension_label(dimension),
            Some(TOP_N),
        )
    }

    /// The hour with the most events; the earliest hour wins a tie.
    pub fn busiest_hour(&self) -> Result<BusiestHour, StoreError> {
        let rows = FactQuery::new()
            .select(&format!("{HOUR_EXPR} AS hour, COUNT(*) AS cnt"))
            .tail(" GROUP BY hour ORDER BY cnt DESC, hour ASC LIMIT 1")
            .query_rows(&self.conn, |row| Ok((row.get::<_, u8>(0)?, row.get::<_, i64>(1)?)))?;
        Ok(rows
            .first()
            .map(|(hour, count)| BusiestHour::for_hour(*hour, *count))
            .unwrap_or(BusiestHour::FALLBACK))
    }

    /// SUCCESS and FAILED counts for the ten busiest scopes.
    pub fn access_success_rate_by_scope(&self) -> Result<Vec<ScopeSuccessRate>, StoreError> {
        let mut query = FactQuery::new();
        query.and(format!("{SCOPE_EXPR} IS NOT NULL"), NO_PARAMS);
        let success = sql_text_literal(FactStatus::SUCCESS);
        let failed = sql_text_literal(FactStatus::FAILED);
        query
            .select(&format!(
                "{SCOPE_EXPR} AS label, \
                 SUM(CASE WHEN f.status = {success} THEN 1 ELSE 0 END), \
                 SUM(CASE WHEN f.status = {failed} THEN 1 ELSE 0 END), \
                 COUNT(*) AS cnt"
            ))
            .tail(" GROUP BY label ORDER BY cnt DESC, label ASC LIMIT ?")
            .bind(SqlValue::Integer(TOP_N))
            .query_rows(&self.conn, |row| {
                Ok(ScopeSuccessRate {
                    scope: row.get(0)?,
                    success: row.get(1)?,
                    failed: row.get(2)?,
                })
            })
    }

    pub fn unique_user_count(&self) -> Result<i64, StoreError> {
        FactQuery::new()
            .select("COUNT(DISTINCT f.user_id)")
            .query_scalar(&self.conn)
    }

    pub fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        Ok(DashboardStats {
            total_users: self.unique_user_count()?,
            success_logins: self.count_by_status(FactStatus::SUCCESS)?,
            total_activity: FactQuery::new().count(&self.conn)?,
            logout_errors: self.count_by_status(FactStatus::FAILED)?,
            busiest_hour: self.busiest_hour()?,
        })
    }

    /// First and last event dates (UTC); both absent on an empty store.
    pub fn date_bounds(&self) -> Result<DateBounds, StoreError> {
        let rows = FactQuery::new()
            .select("MIN(f.event_ts_ms), MAX(f.event_ts_ms)")
            .query_rows(&self.conn, |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?))
            })?;
        let (min, max) = rows.first().copied().unwrap_or((None, None));
        Ok(DateBounds {
            min_date: min.map(|ts| format_date(date_of_ms(ts))),
            max_date: max.map(|ts| format_date(date_of_ms(ts))),
        })
    }

    pub fn interaction_chart(&self) -> Result<InteractionChart, StoreError> {
        Ok(InteractionChart {
            scopes: self.count_by_scope(TimeRange::UNBOUNDED, Some(TOP_N as usize))?,
            total: FactQuery::new().count(&self.conn)?,
        })
    }

    /// Counts per cluster with their share of the window total. Rows partition the window.
    pub fn dashboard_rankings(&self, window: TimeRange) -> Result<Vec<RankingRow>, StoreError> {
        let groups = self.group_count(
            FactDimension::Cluster,
            &ActivityFilter::in_window(window),
            None,
        )?;
        let total: i64 = groups.iter().map(|group| group.count).sum();
        Ok(groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| RankingRow {
                rank: index + 1,
                percentage: percentage(group.count, total),
                cluster: group.label,
                count: group.count,
            })
            .collect())
    }

    /// Search-like events grouped by module (scope, else activity-type name), top five.
    pub fn search_module_usage(
        &self,
        window: TimeRange,
        cluster: Option<&str>,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let mut query =
            FactQuery::from_filter(&ActivityFilter::in_window(window).with_cluster(cluster));
        query.and(format!("search_like({FEATURE_TEXT_EXPR})"), NO_PARAMS);
        query.group_counts(&self.conn, SEARCH_MODULE_LABEL_EXPR, Some(SEARCH_MODULE_LIMIT))
    }

    pub fn export_stats(
        &self,
        window: TimeRange,
        cluster: Option<&str>,
    ) -> Result<ExportStats, StoreError> {
        let view = sql_text_literal(VIEW_MARKER);
        let download = sql_text_literal(DOWNLOAD_MARKER);
        let export = sql_text_literal(EXPORT_MARKER);
        let text = FEATURE_TEXT_EXPR;
        let rows = FactQuery::from_filter(&ActivityFilter::in_window(window).with_cluster(cluster))
            .select(&format!(
                "SUM(CASE WHEN instr({text}, {view}) > 0 AND instr({text}, {download}) = 0 \
                   AND instr({text}, {export}) = 0 THEN 1 ELSE 0 END), \
                 SUM(CASE WHEN instr({text}, {download}) > 0 THEN 1 ELSE 0 END), \
                 SUM(CASE WHEN instr({text}, {export}) > 0 THEN 1 ELSE 0 END)"
            ))
            .query_rows(&self.conn, |row| {
                Ok(ExportStats {
                    view_only: row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                    download: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    export: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })?;
        Ok(rows.first().copied().unwrap_or_default())
    }

    /// What users came to do: first non-empty of scope, detail, activity-type name. Session
    /// events (LOGIN/LOGOUT) are excluded.
    pub fn operational_intents(
        &self,
        window: TimeRange,
        cluster: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let limit = to_sqlite_i64(limit.clamp(1, 100))?;
        let excluded = SESSION_ACTIVITY_TYPES
            .iter()
            .map(|name| sql_text_literal(name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut query =
            FactQuery::from_filter(&ActivityFilter::in_window(window).with_cluster(cluster));
        query.and(
            format!("upper(COALESCE(a.name, '')) NOT IN ({excluded})"),
            NO_PARAMS,
        );
        query.group_counts(&self.conn, INTENT_LABEL_EXPR, Some(limit))
    }

    /// Events bucketed by scope keywords, in the fixed bucket order; empty buckets omitted.
    pub fn global_economics_chart(&self, window: TimeRange) -> Result<Vec<GroupCount>, StoreError> {
        let query = FactQuery::from_filter(&ActivityFilter::in_window(window));
        let counts: HashMap<String, i64> = query
            .group_counts(&self.conn, ECONOMICS_BUCKET_EXPR, None)?
            .into_iter()
            .map(|group| (group.label, group.count))
            .collect();
        Ok(economics_bucket_order()
            .filter_map(|bucket| {
                counts
                    .get(bucket)
                    .filter(|count| **count > 0)
                    .map(|count| GroupCount {
                        label: bucket.to_string(),
                        count: *count,
                    })
            })
            .collect())
    }
}

fn hour_counts(conn: &Connection, query: &FactQuery) -> Result<Vec<HourCount>, StoreError> {
    query
        .select(&format!("{HOUR_EXPR} AS hour, COUNT(*) AS cnt"))
        .tail(" GROUP BY hour ORDER BY hour ASC")
        .query_rows(conn, |row| {
            Ok(HourCount {
                hour: row.get(0)?,
                count: row.get(1)?,
            })
        })
}
