#![forbid(unsafe_code)]

mod filter;
mod functions;
mod schema;

pub(super) use filter::*;
pub(super) use functions::register_functions;
pub(super) use schema::{applied_migrations, migrate_sqlite_schema};
