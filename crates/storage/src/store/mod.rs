#![forbid(unsafe_code)]

mod aggregates;
mod dimensions;
mod error;
mod facts;
mod ingest;
mod org_tree;
mod reports;
mod requests;
mod search;
mod suggestions;
mod support;
mod types;

pub use error::StoreError;
pub use requests::*;
pub use types::*;

use am_core::window::now_ms;
use error::is_constraint_violation;
use rusqlite::{Connection, InterruptHandle, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use support::*;

/// VM instructions between two checks of the cancellation flag.
const CANCEL_CHECK_STEPS: i32 = 64;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    db_path: PathBuf,
    cancelled: Arc<AtomicBool>,
}

/// Stops a connection's work from another thread. The running statement is interrupted, and
/// every later statement fails as soon as it steps, until the next [`SqliteStore::cancel_handle`].
pub struct CancelHandle {
    interrupt: InterruptHandle,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.interrupt.interrupt();
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and brings the schema up to date.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;",
        )?;

        register_functions(&conn)?;
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        conn.progress_handler(
            CANCEL_CHECK_STEPS,
            Some(move || flag.load(Ordering::Acquire)),
        );

        migrate_sqlite_schema(&conn, now_ms())?;

        Ok(Self {
            conn,
            db_path,
            cancelled,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Clears any earlier cancellation and returns a handle that can stop the work started
    /// after this call.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancelled.store(false, Ordering::Release);
        CancelHandle {
            interrupt: self.conn.get_interrupt_handle(),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn ping(&self) -> Result<(), StoreError> {
        self.conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    pub fn applied_migrations(&self) -> Result<Vec<String>, StoreError> {
        applied_migrations(&self.conn)
    }
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

/// Table whose id a fact refers to.
#[derive(Clone, Copy, Debug)]
enum Reference {
    User,
    OrgUnit,
    ActivityType,
    Cluster,
    Location,
}

impl Reference {
    fn table(self) -> &'static str {
        match self {
            Self::User => "user_profiles",
            Self::OrgUnit => "ref_satker_units",
            Self::ActivityType => "ref_activity_types",
            Self::Cluster => "ref_clusters",
            Self::Location => "ref_locations",
        }
    }
}

fn ensure_reference_tx(
    tx: &Transaction<'_>,
    reference: Reference,
    id: i64,
) -> Result<(), StoreError> {
    let table = reference.table();
    let exists = tx
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id=?1"),
            params![id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownReference { table, id })
    }
}
