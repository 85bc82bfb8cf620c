#![forbid(unsafe_code)]

use super::*;
use am_core::paging::Pagination;

impl SqliteStore {
    /// Filtered, paginated search ordered newest first. `total` counts the whole filtered set.
    pub fn search_activities(&self, request: SearchRequest) -> Result<SearchPage, StoreError> {
        let pagination = Pagination::clamped(request.pagination.page, request.pagination.page_size);
        let query = FactQuery::from_filter(&request.filter);

        let total = query.count(&self.conn)?;
        let data = facts::scan_facts(
            &self.conn,
            &query,
            ScanOrder::NewestFirst,
            pagination.page_size,
            pagination.offset(),
        )?;

        Ok(SearchPage {
            data,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: pagination.total_pages(total),
        })
    }

    /// Up to ten users whose name or email contains `q`, with their unit name.
    pub fn search_users(&self, q: &str) -> Result<Vec<UserMatch>, StoreError> {
        let Some(needle) = non_blank(Some(q)) else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.name, u.email, s.name FROM user_profiles u \
             LEFT JOIN ref_satker_units s ON s.id = u.satker_id \
             WHERE instr(fold(u.name), ?1) > 0 OR instr(fold(u.email), ?1) > 0 \
             ORDER BY instr(fold(u.name), ?1) = 1 DESC, u.name ASC, u.id ASC LIMIT 10",
        )?;
        let rows = stmt.query_map(params![needle.to_lowercase()], |row| {
            Ok(UserMatch {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                org_unit: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Up to ten units whose name contains `q`.
    pub fn search_org_units(&self, q: &str) -> Result<Vec<am_core::model::OrgUnit>, StoreError> {
        let Some(needle) = non_blank(Some(q)) else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(
            "SELECT id, name, level_label, parent_id FROM ref_satker_units \
             WHERE instr(fold(name), ?1) > 0 \
             ORDER BY instr(fold(name), ?1) = 1 DESC, name ASC, id ASC LIMIT 10",
        )?;
        let rows = stmt.query_map(params![needle.to_lowercase()], dimensions::org_unit_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
