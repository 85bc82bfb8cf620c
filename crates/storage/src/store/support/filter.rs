#![forbid(unsafe_code)]

use super::super::{ActivityFilter, ActivityRecord, GroupCount, OrgUnitFilter, StoreError};
use am_core::region::region_for_province;
use am_core::window::TimeRange;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params_from_iter};

/// Every fact query runs over this skeleton; all dimensions are optional joins so any
/// predicate can be evaluated uniformly.
const FACT_JOINS: &str = " FROM activity_logs_normalized f \
     LEFT JOIN user_profiles u ON u.id = f.user_id \
     LEFT JOIN ref_satker_units s ON s.id = f.satker_id \
     LEFT JOIN ref_activity_types a ON a.id = f.activity_type_id \
     LEFT JOIN ref_clusters c ON c.id = f.cluster_id \
     LEFT JOIN ref_locations l ON l.id = f.location_id";

pub(in crate::store) const RECORD_COLUMNS: &str = "f.id, f.transaction_id, f.user_id, \
     COALESCE(u.name, ''), COALESCE(u.email, ''), f.satker_id, s.name, s.level_label, \
     f.activity_type_id, COALESCE(a.name, ''), COALESCE(a.category, ''), c.name, l.name, \
     l.province, f.scope, f.detail, f.status, f.event_ts_ms, f.ingested_at_ms";

/// UTC hour of the event, 0..=23.
pub(in crate::store) const HOUR_EXPR: &str =
    "CAST(strftime('%H', f.event_ts_ms / 1000, 'unixepoch') AS INTEGER)";

pub(in crate::store) const NO_PARAMS: [SqlValue; 0] = [];

pub(in crate::store) const SCOPE_EXPR: &str = "NULLIF(TRIM(f.scope), '')";

/// Conjunction of predicates over the fact skeleton, with positional parameters.
#[derive(Clone, Debug, Default)]
pub(in crate::store) struct FactQuery {
    conditions: Vec<String>,
    params: Vec<SqlValue>,
}

impl FactQuery {
    pub(in crate::store) fn new() -> Self {
        Self::default()
    }

    pub(in crate::store) fn from_filter(filter: &ActivityFilter) -> Self {
        let mut query = Self::new();

        if let Some(text) = non_blank(filter.text.as_deref()) {
            let needle = SqlValue::Text(text.to_lowercase());
            query.and(
                "(instr(fold(COALESCE(u.name, '')), ?) > 0 \
                 OR instr(fold(COALESCE(s.name, '')), ?) > 0 \
                 OR instr(fold(COALESCE(u.email, '')), ?) > 0 \
                 OR instr(fold(COALESCE(a.name, '')), ?) > 0)",
                std::iter::repeat_n(needle, 4),
            );
        }

        match &filter.org_unit {
            Some(OrgUnitFilter::Name(name)) => {
                if let Some(name) = non_blank(Some(name)) {
                    query.and(
                        "instr(fold(COALESCE(s.name, '')), ?) > 0",
                        [SqlValue::Text(name.to_lowercase())],
                    );
                }
            }
            Some(OrgUnitFilter::Ids(ids)) => {
                query.and_in_ids("f.satker_id", ids);
            }
            None => {}
        }

        if let Some(cluster) = non_blank(filter.cluster.as_deref()) {
            query.and("c.name = ?", [SqlValue::Text(cluster.to_string())]);
        }
        if let Some(level) = non_blank(filter.level_label.as_deref()) {
            query.and("s.level_label = ?", [SqlValue::Text(level.to_string())]);
        }
        if let Some(status) = non_blank(filter.status.as_deref()) {
            query.and("f.status = ?", [SqlValue::Text(status.to_ascii_uppercase())]);
        }

        let names: Vec<SqlValue> = filter
            .activity_type_names
            .iter()
            .filter_map(|name| non_blank(Some(name)))
            .map(|name| SqlValue::Text(name.to_string()))
            .collect();
        if !names.is_empty() {
            let placeholders = vec!["?"; names.len()].join(", ");
            query.and(format!("a.name IN ({placeholders})"), names);
        }

        query.and_window(filter.window);
        query
    }

    pub(in crate::store) fn and(
        &mut self,
        condition: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> &mut Self {
        self.conditions.push(condition.into());
        self.params.extend(params);
        self
    }

    pub(in crate::store) fn and_window(&mut self, window: TimeRange) -> &mut Self {
        if let Some(start) = window.start_ms {
            self.and("f.event_ts_ms >= ?", [SqlValue::Integer(start)]);
        }
        if let Some(end) = window.end_ms {
            self.and("f.event_ts_ms < ?", [SqlValue::Integer(end)]);
        }
        self
    }

    pub(in crate::store) fn and_in_ids(&mut self, column: &str, ids: &[i64]) -> &mut Self {
        if ids.is_empty() {
            return self.and("0 = 1", NO_PARAMS);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        self.and(
            format!("{column} IN ({placeholders})"),
            ids.iter().map(|id| SqlValue::Integer(*id)),
        )
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.conditions.join(" AND "))
    }

    pub(in crate::store) fn select(&self, projection: &str) -> SqlStatement {
        SqlStatement {
            sql: format!("SELECT {projection}{FACT_JOINS}{}", self.where_clause()),
            params: self.params.clone(),
        }
    }

    pub(in crate::store) fn count(&self, conn: &Connection) -> Result<i64, StoreError> {
        self.select("COUNT(*)").query_scalar(conn)
    }

    /// `label_expr` grouped and counted, NULL labels dropped, ordered by count then label.
    pub(in crate::store) fn grouped(&self, label_expr: &str, limit: Option<i64>) -> SqlStatement {
        let mut query = self.clone();
        query.and(format!("({label_expr}) IS NOT NULL"), NO_PARAMS);
        let statement = query
            .select(&format!("{label_expr} AS label, COUNT(*) AS cnt"))
            .tail(" GROUP BY label ORDER BY cnt DESC, label ASC");
        match limit {
            Some(limit) => statement.tail(" LIMIT ?").bind(SqlValue::Integer(limit)),
            None => statement,
        }
    }

    pub(in crate::store) fn group_counts(
        &self,
        conn: &Connection,
        label_expr: &str,
        limit: Option<i64>,
    ) -> Result<Vec<GroupCount>, StoreError> {
        self.grouped(label_expr, limit).query_rows(conn, |row| {
            Ok(GroupCount {
                label: row.get(0)?,
                count: row.get(1)?,
            })
        })
    }
}

/// A fully assembled statement; further clauses and parameters append in order.
#[derive(Clone, Debug)]
pub(in crate::store) struct SqlStatement {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlStatement {
    pub(in crate::store) fn tail(mut self, sql: &str) -> Self {
        self.sql.push_str(sql);
        self
    }

    pub(in crate::store) fn bind(mut self, value: SqlValue) -> Self {
        self.params.push(value);
        self
    }

    pub(in crate::store) fn query_rows<T>(
        &self,
        conn: &Connection,
        mut map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, StoreError> {
        let mut stmt = conn.prepare(&self.sql)?;
        let mut rows = stmt.query(params_from_iter(self.params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map(row)?);
        }
        Ok(out)
    }

    pub(in crate::store) fn query_scalar(&self, conn: &Connection) -> Result<i64, StoreError> {
        let value = conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get::<_, Option<i64>>(0)
        })?;
        Ok(value.unwrap_or(0))
    }
}

pub(in crate::store) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityRecord> {
    let province: Option<String> = row.get(13)?;
    Ok(ActivityRecord {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        user_email: row.get(4)?,
        org_unit_id: row.get(5)?,
        org_unit_name: row.get(6)?,
        level_label: row.get(7)?,
        activity_type_id: row.get(8)?,
        activity_type: row.get(9)?,
        category: row.get(10)?,
        cluster: row.get(11)?,
        location: row.get(12)?,
        region: province.as_deref().map(region_for_province),
        province,
        scope: row.get(14)?,
        detail: row.get(15)?,
        status: row.get(16)?,
        event_ts_ms: row.get(17)?,
        ingested_at_ms: row.get(18)?,
    })
}

/// Quoted SQL string literal for compile-time keyword tables.
pub(in crate::store) fn sql_text_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(in crate::store) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
