#![forbid(unsafe_code)]

mod dimensions;
mod facts;
mod indexes;
mod migrations_table;
mod staging;

pub(super) use migrations_table::SQL as MIGRATIONS_TABLE;

/// Ordered `(version, ddl)` pairs. A version is recorded once its DDL has run.
pub(super) fn migrations() -> [(&'static str, String); 3] {
    [
        ("0001_reference_dimensions", dimensions::SQL.to_string()),
        (
            "0002_activity_facts",
            [facts::SQL, indexes::SQL].concat(),
        ),
        ("0003_act_log_staging", staging::SQL.to_string()),
    ]
}
