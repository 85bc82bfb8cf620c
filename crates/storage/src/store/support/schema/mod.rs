#![forbid(unsafe_code)]

mod sql;

use super::super::StoreError;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};

/// Applies every pending migration, each in its own immediate transaction so concurrent
/// openers serialize instead of racing on DDL.
pub(in crate::store) fn migrate_sqlite_schema(
    conn: &Connection,
    now_ms: i64,
) -> Result<(), StoreError> {
    conn.execute_batch(sql::MIGRATIONS_TABLE)?;

    for (version, ddl) in sql::migrations() {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let applied = tx
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version=?1",
                params![version],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if applied {
            tx.commit()?;
            continue;
        }
        tx.execute_batch(&ddl)?;
        tx.execute(
            "INSERT INTO schema_migrations(version, applied_at_ms) VALUES (?1, ?2)",
            params![version, now_ms],
        )?;
        tx.commit()?;
        tracing::info!(version, "applied schema migration");
    }

    Ok(())
}

pub(in crate::store) fn applied_migrations(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
