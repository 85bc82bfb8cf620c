#![forbid(unsafe_code)]

use super::*;
use am_core::model::OrgUnit;
use am_core::tree::{OrgTreeNode, ancestor_path, build_forest};
use am_core::window::TimeRange;
use std::collections::HashMap;

const TREE_SEARCH_LIMIT: i64 = 20;

impl SqliteStore {
    /// The unit hierarchy as a forest. With `include_activity_count` every node carries the
    /// number of facts attributed to exactly that unit within the window.
    pub fn org_tree(&self, request: OrgTreeRequest) -> Result<Vec<OrgTreeNode>, StoreError> {
        let units = self.list_org_units(request.level_label.as_deref())?;
        let counts = if request.include_activity_count {
            Some(self.activity_counts_by_unit(request.window)?)
        } else {
            None
        };
        Ok(build_forest(units, counts.as_ref()))
    }

    pub fn activity_counts_by_unit(
        &self,
        window: TimeRange,
    ) -> Result<HashMap<i64, i64>, StoreError> {
        let mut query = FactQuery::new();
        query
            .and("f.satker_id IS NOT NULL", NO_PARAMS)
            .and_window(window);
        let rows = query
            .select("f.satker_id, COUNT(*)")
            .tail(" GROUP BY f.satker_id")
            .query_rows(&self.conn, |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
        Ok(rows.into_iter().collect())
    }

    /// Units whose name contains `q`, each with its path from the root.
    pub fn org_tree_search(&self, q: &str) -> Result<Vec<OrgUnitPath>, StoreError> {
        let Some(needle) = non_blank(Some(q)) else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(
            "SELECT id, name, level_label, parent_id FROM ref_satker_units \
             WHERE instr(fold(name), ?1) > 0 \
             ORDER BY instr(fold(name), ?1) = 1 DESC, name ASC, id ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            params![needle.to_lowercase(), TREE_SEARCH_LIMIT],
            dimensions::org_unit_from_row,
        )?;
        let matches: Vec<OrgUnit> = rows.collect::<Result<Vec<_>, _>>()?;
        if matches.is_empty() {
            return Ok(Vec::new());
        }

        let parents = dimensions::org_unit_parents(&self.conn)?;
        let names = self.org_unit_names()?;
        Ok(matches
            .into_iter()
            .map(|unit| {
                let path = ancestor_path(unit.id, &parents)
                    .into_iter()
                    .map(|id| PathSegment {
                        id,
                        name: names.get(&id).cloned().unwrap_or_default(),
                    })
                    .collect();
                OrgUnitPath { unit, path }
            })
            .collect())
    }

    fn org_unit_names(&self) -> Result<HashMap<i64, String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM ref_satker_units")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
    }
}
