#![forbid(unsafe_code)]

use rusqlite::ErrorCode;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownReference { table: &'static str, id: i64 },
    Duplicate { transaction_id: String },
    NotFound(&'static str),
    Cancelled,
    PoolClosed,
    Worker(String),
}

impl StoreError {
    /// Stable machine-readable code, independent of the display text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnknownReference { .. } => "UNKNOWN_REFERENCE",
            Self::Duplicate { .. } => "DUPLICATE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Cancelled => "CANCELLED",
            Self::Io(_) | Self::Sql(_) | Self::PoolClosed | Self::Worker(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownReference { table, id } => {
                write!(f, "unknown reference (table={table}, id={id})")
            }
            Self::Duplicate { transaction_id } => write!(
                f,
                "transaction id already stored with different content \
                 (transaction_id={transaction_id})"
            ),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::PoolClosed => write!(f, "connection pool closed"),
            Self::Worker(message) => write!(f, "store worker failed: {message}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if is_interrupted(&value) {
            return Self::Cancelled;
        }
        Self::Sql(value)
    }
}

pub(super) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::OperationInterrupted
    )
}
