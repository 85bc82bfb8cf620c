#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_facts_event_ts
          ON activity_logs_normalized(event_ts_ms);
        CREATE INDEX IF NOT EXISTS idx_facts_user
          ON activity_logs_normalized(user_id, event_ts_ms);
        CREATE INDEX IF NOT EXISTS idx_facts_satker
          ON activity_logs_normalized(satker_id, event_ts_ms);
        CREATE INDEX IF NOT EXISTS idx_facts_activity_type
          ON activity_logs_normalized(activity_type_id);
        CREATE INDEX IF NOT EXISTS idx_facts_cluster
          ON activity_logs_normalized(cluster_id);
        CREATE INDEX IF NOT EXISTS idx_facts_location
          ON activity_logs_normalized(location_id);
        CREATE INDEX IF NOT EXISTS idx_facts_status
          ON activity_logs_normalized(status);
        CREATE INDEX IF NOT EXISTS idx_satker_parent
          ON ref_satker_units(parent_id);
"#;
