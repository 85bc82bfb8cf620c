#![forbid(unsafe_code)]

use super::*;
use am_core::categorize::UNCATEGORIZED_CLUSTER;
use am_core::ids::TransactionId;
use am_core::model::{FactError, FactStatus, NewActivityFact};
use rusqlite::types::Value as SqlValue;

/// Result of inserting a single fact inside a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FactInsert {
    Inserted,
    AlreadyPresent,
}

impl SqliteStore {
    /// Atomic batch insert. A transaction id already stored with the same event content is
    /// skipped; the same id with different content fails the whole batch.
    pub fn insert_facts(&mut self, batch: &[NewActivityFact]) -> Result<InsertOutcome, StoreError> {
        let tx = self.conn.transaction()?;
        let mut outcome = InsertOutcome::default();
        for fact in batch {
            match insert_fact_tx(&tx, fact)? {
                FactInsert::Inserted => outcome.inserted += 1,
                FactInsert::AlreadyPresent => outcome.already_present += 1,
            }
        }
        tx.commit()?;
        Ok(outcome)
    }

    pub fn count_where(&self, filter: &ActivityFilter) -> Result<i64, StoreError> {
        FactQuery::from_filter(filter).count(&self.conn)
    }

    pub fn group_count(
        &self,
        dimension: FactDimension,
        filter: &ActivityFilter,
        limit: Option<usize>,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let limit = limit.map(to_sqlite_i64).transpose()?;
        FactQuery::from_filter(filter).group_counts(&self.conn, &dimension_label(dimension), limit)
    }

    pub fn scan(&self, request: ScanRequest) -> Result<Vec<ActivityRecord>, StoreError> {
        let limit = to_sqlite_i64(request.limit)?;
        let offset = to_sqlite_i64(request.offset)?;
        let query = FactQuery::from_filter(&request.filter);
        scan_facts(&self.conn, &query, request.order, limit, offset)
    }

    pub fn fact_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<ActivityRecord>, StoreError> {
        let mut query = FactQuery::new();
        query.and(
            "f.transaction_id = ?",
            [SqlValue::Text(transaction_id.to_canonical())],
        );
        let mut rows = query.select(RECORD_COLUMNS).query_rows(&self.conn, record_from_row)?;
        Ok(rows.pop())
    }
}

pub(super) fn scan_facts(
    conn: &Connection,
    query: &FactQuery,
    order: ScanOrder,
    limit: i64,
    offset: i64,
) -> Result<Vec<ActivityRecord>, StoreError> {
    let order_sql = match order {
        ScanOrder::NewestFirst => " ORDER BY f.event_ts_ms DESC, f.id DESC",
        ScanOrder::OldestFirst => " ORDER BY f.event_ts_ms ASC, f.id ASC",
    };
    query
        .select(RECORD_COLUMNS)
        .tail(order_sql)
        .tail(" LIMIT ? OFFSET ?")
        .bind(SqlValue::Integer(limit.max(0)))
        .bind(SqlValue::Integer(offset.max(0)))
        .query_rows(conn, record_from_row)
}

pub(super) fn dimension_label(dimension: FactDimension) -> String {
    match dimension {
        FactDimension::User => "u.name".to_string(),
        FactDimension::OrgUnit => "s.name".to_string(),
        FactDimension::ActivityType => "a.name".to_string(),
        FactDimension::Cluster => {
            format!("COALESCE(c.name, {})", sql_text_literal(UNCATEGORIZED_CLUSTER))
        }
        FactDimension::Location => "l.name".to_string(),
        FactDimension::Province => "l.province".to_string(),
        FactDimension::Status => "f.status".to_string(),
        FactDimension::Scope => SCOPE_EXPR.to_string(),
        FactDimension::Hour => format!("printf('%02d', {HOUR_EXPR})"),
    }
}

pub(super) fn insert_fact_tx(
    tx: &Transaction<'_>,
    fact: &NewActivityFact,
) -> Result<FactInsert, StoreError> {
    fact.validate().map_err(|err| StoreError::InvalidInput(fact_error_message(&err)))?;

    ensure_reference_tx(tx, Reference::User, fact.user_id)?;
    ensure_reference_tx(tx, Reference::ActivityType, fact.activity_type_id)?;
    if let Some(id) = fact.org_unit_id {
        ensure_reference_tx(tx, Reference::OrgUnit, id)?;
    }
    if let Some(id) = fact.cluster_id {
        ensure_reference_tx(tx, Reference::Cluster, id)?;
    }
    if let Some(id) = fact.location_id {
        ensure_reference_tx(tx, Reference::Location, id)?;
    }

    let transaction_id = fact.transaction_id.to_canonical();
    let inserted = tx.execute(
        "INSERT INTO activity_logs_normalized(transaction_id, user_id, satker_id, \
         activity_type_id, cluster_id, location_id, scope, detail, status, event_ts_ms, \
         ingested_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
         ON CONFLICT(transaction_id) DO NOTHING",
        params![
            transaction_id,
            fact.user_id,
            fact.org_unit_id,
            fact.activity_type_id,
            fact.cluster_id,
            fact.location_id,
            fact.scope,
            fact.detail,
            fact.status.as_str(),
            fact.event_ts_ms,
            fact.ingested_at_ms
        ],
    )?;

    if inserted == 0 {
        let stored = stored_fact_tx(tx, &fact.transaction_id)?;
        if stored.is_some_and(|stored| stored.same_event_as(fact)) {
            return Ok(FactInsert::AlreadyPresent);
        }
        return Err(StoreError::Duplicate { transaction_id });
    }

    tx.execute(
        "UPDATE user_profiles SET \
         first_activity_ms = MIN(COALESCE(first_activity_ms, ?1), ?1), \
         last_activity_ms = MAX(COALESCE(last_activity_ms, ?1), ?1) \
         WHERE id=?2",
        params![fact.event_ts_ms, fact.user_id],
    )?;
    Ok(FactInsert::Inserted)
}

fn stored_fact_tx(
    tx: &Transaction<'_>,
    transaction_id: &TransactionId,
) -> Result<Option<NewActivityFact>, StoreError> {
    let row = tx
        .query_row(
            "SELECT user_id, satker_id, activity_type_id, cluster_id, location_id, scope, detail, \
             status, event_ts_ms, ingested_at_ms FROM activity_logs_normalized \
             WHERE transaction_id=?1",
            params![transaction_id.to_canonical()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            },
        )
        .optional()?;

    let Some((
        user_id,
        org_unit_id,
        activity_type_id,
        cluster_id,
        location_id,
        scope,
        detail,
        status,
        event_ts_ms,
        ingested_at_ms,
    )) = row
    else {
        return Ok(None);
    };
    let status = FactStatus::parse(&status)
        .map_err(|err| StoreError::InvalidInput(fact_error_message(&err)))?;
    Ok(Some(NewActivityFact {
        transaction_id: *transaction_id,
        user_id,
        org_unit_id,
        activity_type_id,
        cluster_id,
        location_id,
        scope,
        detail,
        status,
        event_ts_ms,
        ingested_at_ms,
    }))
}

fn fact_error_message(err: &FactError) -> &'static str {
    match err {
        FactError::EmptyStatus => "status must not be empty",
        FactError::EventAfterIngestion => "event timestamp is after ingestion timestamp",
    }
}
