#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS ref_satker_units (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL,
          level_label TEXT NOT NULL,
          parent_id INTEGER REFERENCES ref_satker_units(id)
            ON DELETE RESTRICT DEFERRABLE INITIALLY DEFERRED
        );

        CREATE TABLE IF NOT EXISTS ref_activity_types (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL UNIQUE,
          category TEXT NOT NULL DEFAULT '',
          description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS ref_clusters (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL UNIQUE,
          description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS ref_locations (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL UNIQUE,
          province TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_profiles (
          id INTEGER PRIMARY KEY,
          name TEXT NOT NULL CHECK (length(trim(name)) > 0),
          email TEXT NOT NULL DEFAULT '',
          external_token TEXT,
          satker_id INTEGER REFERENCES ref_satker_units(id) ON DELETE RESTRICT,
          is_active INTEGER NOT NULL DEFAULT 1,
          first_activity_ms INTEGER,
          last_activity_ms INTEGER,
          UNIQUE (name, email)
        );
"#;
