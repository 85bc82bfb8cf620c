#![forbid(unsafe_code)]

use super::*;
use std::collections::HashSet;

const PER_SOURCE: i64 = 5;

/// Sources in response order. Each yields `(value, label)`; prefix matches rank first.
const SOURCES: [(SuggestionKind, &str); 3] = [
    (
        SuggestionKind::User,
        "SELECT name, name FROM user_profiles \
         WHERE instr(fold(name), ?1) > 0 GROUP BY name \
         ORDER BY instr(fold(name), ?1) = 1 DESC, name ASC LIMIT ?2",
    ),
    (
        SuggestionKind::OrgUnit,
        "SELECT name, name || ' - ' || MIN(level_label) FROM ref_satker_units \
         WHERE instr(fold(name), ?1) > 0 GROUP BY name \
         ORDER BY instr(fold(name), ?1) = 1 DESC, name ASC LIMIT ?2",
    ),
    (
        SuggestionKind::Location,
        "SELECT name, name || ' - ' || MIN(province) FROM ref_locations \
         WHERE instr(fold(name), ?1) > 0 GROUP BY name \
         ORDER BY instr(fold(name), ?1) = 1 DESC, name ASC LIMIT ?2",
    ),
];

impl SqliteStore {
    /// Up to five candidates per source, concatenated user → orgunit → location.
    /// A blank query yields nothing.
    pub fn suggestions(&self, q: &str) -> Result<Vec<Suggestion>, StoreError> {
        let Some(needle) = non_blank(Some(q)) else {
            return Ok(Vec::new());
        };
        let needle = needle.to_lowercase();

        let mut out = Vec::new();
        let mut seen: HashSet<(SuggestionKind, String)> = HashSet::new();
        for (kind, sql) in SOURCES {
            let mut stmt = self.conn.prepare(sql)?;
            let mut rows = stmt.query(params![needle, PER_SOURCE])?;
            while let Some(row) = rows.next()? {
                let value: String = row.get(0)?;
                if value.trim().is_empty() || !seen.insert((kind, value.clone())) {
                    continue;
                }
                out.push(Suggestion {
                    kind,
                    label: row.get(1)?,
                    value,
                });
            }
        }
        Ok(out)
    }
}
