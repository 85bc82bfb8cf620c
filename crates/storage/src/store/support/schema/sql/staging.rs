#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS act_log (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          transaction_id TEXT NOT NULL UNIQUE,
          nama TEXT NOT NULL,
          email TEXT NOT NULL DEFAULT '',
          satker TEXT,
          aktifitas TEXT NOT NULL,
          cluster TEXT,
          lokasi TEXT,
          scope TEXT NOT NULL DEFAULT '',
          detail_aktifitas TEXT NOT NULL DEFAULT '',
          status TEXT NOT NULL,
          tanggal_ms INTEGER NOT NULL,
          staged_at_ms INTEGER NOT NULL,
          normalized_at_ms INTEGER,
          rejected_reason TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_act_log_pending
          ON act_log(normalized_at_ms, id);
"#;
