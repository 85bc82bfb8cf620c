#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS activity_logs_normalized (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          transaction_id TEXT NOT NULL UNIQUE,
          user_id INTEGER NOT NULL REFERENCES user_profiles(id) ON DELETE RESTRICT,
          satker_id INTEGER REFERENCES ref_satker_units(id) ON DELETE RESTRICT,
          activity_type_id INTEGER NOT NULL REFERENCES ref_activity_types(id) ON DELETE RESTRICT,
          cluster_id INTEGER REFERENCES ref_clusters(id) ON DELETE RESTRICT,
          location_id INTEGER REFERENCES ref_locations(id) ON DELETE RESTRICT,
          scope TEXT NOT NULL DEFAULT '',
          detail TEXT NOT NULL DEFAULT '',
          status TEXT NOT NULL CHECK (length(status) > 0),
          event_ts_ms INTEGER NOT NULL,
          ingested_at_ms INTEGER NOT NULL,
          CHECK (event_ts_ms <= ingested_at_ms)
        );
"#;
