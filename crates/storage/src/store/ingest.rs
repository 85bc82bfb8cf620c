#![forbid(unsafe_code)]

use super::facts::{FactInsert, insert_fact_tx};
use super::*;
use am_core::ids::TransactionId;
use am_core::model::{FactStatus, NewActivityFact};

const MAX_NORMALIZE_BATCH: usize = 10_000;

#[derive(Debug)]
struct StagedRow {
    id: i64,
    transaction_id: String,
    user_name: String,
    user_email: String,
    org_unit_name: Option<String>,
    activity_type_name: String,
    cluster_name: Option<String>,
    location_name: Option<String>,
    scope: String,
    detail: String,
    status: String,
    event_ts_ms: i64,
}

enum Normalized {
    Fact(FactInsert),
    Rejected(&'static str),
}

impl SqliteStore {
    /// Appends raw rows to the staging table. Rows whose transaction id is already staged are
    /// ignored; returns how many were added.
    pub fn stage_raw_events(
        &mut self,
        batch: &[RawActivityEvent],
        staged_at_ms: i64,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut staged = 0usize;
        for event in batch {
            if event.user_name.trim().is_empty() {
                return Err(StoreError::InvalidInput("user name must not be empty"));
            }
            if event.activity_type_name.trim().is_empty() {
                return Err(StoreError::InvalidInput("activity type must not be empty"));
            }
            staged += tx.execute(
                "INSERT OR IGNORE INTO act_log(transaction_id, nama, email, satker, aktifitas, \
                 cluster, lokasi, scope, detail_aktifitas, status, tanggal_ms, staged_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    event.transaction_id.to_canonical(),
                    event.user_name.trim(),
                    event.user_email.trim(),
                    event.org_unit_name.as_deref().map(str::trim),
                    event.activity_type_name.trim(),
                    event.cluster_name.as_deref().map(str::trim),
                    event.location_name.as_deref().map(str::trim),
                    event.scope,
                    event.detail,
                    event.status.trim(),
                    event.event_ts_ms,
                    staged_at_ms
                ],
            )?;
        }
        tx.commit()?;
        Ok(staged)
    }

    pub fn pending_staged_count(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM act_log \
             WHERE normalized_at_ms IS NULL AND rejected_reason IS NULL",
            [],
            |row| row.get(0),
        )?)
    }

    /// Converts up to `limit` pending staging rows into facts, oldest first, in one transaction.
    /// Rows that cannot be normalized keep their reason and are not retried.
    pub fn normalize_staged(
        &mut self,
        limit: usize,
        now_ms: i64,
    ) -> Result<NormalizeOutcome, StoreError> {
        let limit = to_sqlite_i64(limit.clamp(1, MAX_NORMALIZE_BATCH))?;
        let tx = self.conn.transaction()?;

        let rows = pending_rows_tx(&tx, limit)?;
        let mut outcome = NormalizeOutcome::default();
        for row in &rows {
            match normalize_row_tx(&tx, row, now_ms)? {
                Normalized::Fact(FactInsert::Inserted) => outcome.normalized += 1,
                Normalized::Fact(FactInsert::AlreadyPresent) => outcome.duplicates += 1,
                Normalized::Rejected(reason) => {
                    outcome.rejected += 1;
                    tx.execute(
                        "UPDATE act_log SET rejected_reason=?1 WHERE id=?2",
                        params![reason, row.id],
                    )?;
                    tracing::debug!(staged_id = row.id, reason, "staged activity rejected");
                    continue;
                }
            }
            tx.execute(
                "UPDATE act_log SET normalized_at_ms=?1 WHERE id=?2",
                params![now_ms, row.id],
            )?;
        }

        tx.commit()?;
        Ok(outcome)
    }
}

fn pending_rows_tx(tx: &Transaction<'_>, limit: i64) -> Result<Vec<StagedRow>, StoreError> {
    let mut stmt = tx.prepare(
        "SELECT id, transaction_id, nama, email, satker, aktifitas, cluster, lokasi, scope, \
         detail_aktifitas, status, tanggal_ms FROM act_log \
         WHERE normalized_at_ms IS NULL AND rejected_reason IS NULL ORDER BY id LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(StagedRow {
            id: row.get(0)?,
            transaction_id: row.get(1)?,
            user_name: row.get(2)?,
            user_email: row.get(3)?,
            org_unit_name: row.get(4)?,
            activity_type_name: row.get(5)?,
            cluster_name: row.get(6)?,
            location_name: row.get(7)?,
            scope: row.get(8)?,
            detail: row.get(9)?,
            status: row.get(10)?,
            event_ts_ms: row.get(11)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn normalize_row_tx(
    tx: &Transaction<'_>,
    row: &StagedRow,
    now_ms: i64,
) -> Result<Normalized, StoreError> {
    let Ok(transaction_id) = TransactionId::parse(&row.transaction_id) else {
        return Ok(Normalized::Rejected("invalid transaction id"));
    };
    let Ok(status) = FactStatus::parse(&row.status) else {
        return Ok(Normalized::Rejected("empty status"));
    };
    if row.event_ts_ms > now_ms {
        return Ok(Normalized::Rejected("event timestamp in the future"));
    }
    let Some(activity_type) = dimensions::activity_type_by_name_tx(tx, &row.activity_type_name)?
    else {
        return Ok(Normalized::Rejected("unknown activity type"));
    };

    let org_unit_id = lookup_id_tx(tx, "ref_satker_units", row.org_unit_name.as_deref())?;
    let cluster_id = lookup_id_tx(tx, "ref_clusters", row.cluster_name.as_deref())?;
    let location_id = lookup_id_tx(tx, "ref_locations", row.location_name.as_deref())?;
    let user_id = upsert_user_tx(tx, &row.user_name, &row.user_email, org_unit_id)?;

    let fact = NewActivityFact {
        transaction_id,
        user_id,
        org_unit_id,
        activity_type_id: activity_type.id,
        cluster_id,
        location_id,
        scope: row.scope.clone(),
        detail: row.detail.clone(),
        status,
        event_ts_ms: row.event_ts_ms,
        ingested_at_ms: now_ms,
    };
    match insert_fact_tx(tx, &fact) {
        Ok(inserted) => Ok(Normalized::Fact(inserted)),
        Err(StoreError::Duplicate { .. }) => Ok(Normalized::Rejected("conflicting transaction id")),
        Err(err) => Err(err),
    }
}

/// Id of the row named `name` (case-insensitive) in a dimension table; absent names and
/// unknown names both resolve to `None`.
fn lookup_id_tx(
    tx: &Transaction<'_>,
    table: &'static str,
    name: Option<&str>,
) -> Result<Option<i64>, StoreError> {
    let Some(name) = non_blank(name) else {
        return Ok(None);
    };
    Ok(tx
        .query_row(
            &format!("SELECT id FROM {table} WHERE fold(name)=fold(?1) ORDER BY id LIMIT 1"),
            params![name],
            |row| row.get(0),
        )
        .optional()?)
}

/// The profile keyed by `(name, email)`, created on first sight. A unit learned later fills
/// an empty `satker_id` but never overwrites one.
fn upsert_user_tx(
    tx: &Transaction<'_>,
    name: &str,
    email: &str,
    org_unit_id: Option<i64>,
) -> Result<i64, StoreError> {
    tx.execute(
        "INSERT INTO user_profiles(name, email, satker_id) VALUES (?1, ?2, ?3) \
         ON CONFLICT(name, email) DO UPDATE SET \
         satker_id = COALESCE(user_profiles.satker_id, excluded.satker_id)",
        params![name.trim(), email.trim(), org_unit_id],
    )?;
    Ok(tx.query_row(
        "SELECT id FROM user_profiles WHERE name=?1 AND email=?2",
        params![name.trim(), email.trim()],
        |row| row.get(0),
    )?)
}
