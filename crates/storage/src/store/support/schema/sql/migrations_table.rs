#![forbid(unsafe_code)]

pub(in crate::store) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS schema_migrations (
          version TEXT PRIMARY KEY,
          applied_at_ms INTEGER NOT NULL
        );
"#;
