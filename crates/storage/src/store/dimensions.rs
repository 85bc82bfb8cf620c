#![forbid(unsafe_code)]

use super::*;
use am_core::model::{ActivityType, Cluster, Location, OrgUnit, UserProfile};
use am_core::region::canonical_province;
use rusqlite::Row;
use std::collections::HashMap;

const ORG_UNIT_COLUMNS: &str = "id, name, level_label, parent_id";
const USER_COLUMNS: &str =
    "id, name, email, external_token, satker_id, is_active, first_activity_ms, last_activity_ms";

impl SqliteStore {
    /// Offline seeding path. Everything lands in one transaction; a unit graph that is not a
    /// forest, or a parent that does not resolve, rolls the whole seed back.
    pub fn seed_dimensions(
        &mut self,
        request: SeedDimensionsRequest,
    ) -> Result<SeedSummary, StoreError> {
        let tx = self.conn.transaction()?;

        for unit in &request.org_units {
            if unit.name.trim().is_empty() {
                return Err(StoreError::InvalidInput("org unit name must not be empty"));
            }
            let parent_id = unit.parent_id.filter(|parent| *parent != 0);
            tx.execute(
                "INSERT INTO ref_satker_units(id, name, level_label, parent_id) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, \
                 level_label=excluded.level_label, parent_id=excluded.parent_id",
                params![unit.id, unit.name.trim(), unit.level_label.trim(), parent_id],
            )?;
        }
        validate_org_forest_tx(&tx)?;

        for activity_type in &request.activity_types {
            if activity_type.name.trim().is_empty() {
                return Err(StoreError::InvalidInput("activity type name must not be empty"));
            }
            tx.execute(
                "INSERT INTO ref_activity_types(id, name, category, description) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, category=excluded.category, \
                 description=excluded.description",
                params![
                    activity_type.id,
                    activity_type.name.trim(),
                    activity_type.category,
                    activity_type.description
                ],
            )
            .map_err(|err| map_seed_conflict(err, "duplicate activity type name"))?;
        }

        for cluster in &request.clusters {
            if cluster.name.trim().is_empty() {
                return Err(StoreError::InvalidInput("cluster name must not be empty"));
            }
            tx.execute(
                "INSERT INTO ref_clusters(id, name, description) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, \
                 description=excluded.description",
                params![cluster.id, cluster.name.trim(), cluster.description],
            )
            .map_err(|err| map_seed_conflict(err, "duplicate cluster name"))?;
        }

        for location in &request.locations {
            if location.name.trim().is_empty() {
                return Err(StoreError::InvalidInput("location name must not be empty"));
            }
            tx.execute(
                "INSERT INTO ref_locations(id, name, province) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, province=excluded.province",
                params![
                    location.id,
                    location.name.trim(),
                    canonical_province(&location.province)
                ],
            )
            .map_err(|err| map_seed_conflict(err, "duplicate location name"))?;
        }

        for user in &request.users {
            if user.name.trim().is_empty() {
                return Err(StoreError::InvalidInput("user name must not be empty"));
            }
            if let Some(unit) = user.org_unit_id {
                ensure_reference_tx(&tx, Reference::OrgUnit, unit)?;
            }
            tx.execute(
                "INSERT INTO user_profiles(id, name, email, external_token, satker_id, is_active, \
                 first_activity_ms, last_activity_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, email=excluded.email, \
                 external_token=excluded.external_token, satker_id=excluded.satker_id, \
                 is_active=excluded.is_active",
                params![
                    user.id,
                    user.name.trim(),
                    user.email.trim(),
                    user.external_token,
                    user.org_unit_id,
                    user.is_active,
                    user.first_activity_ms,
                    user.last_activity_ms
                ],
            )
            .map_err(|err| map_seed_conflict(err, "duplicate user (name, email)"))?;
        }

        tx.commit()?;
        Ok(SeedSummary {
            org_units: request.org_units.len(),
            activity_types: request.activity_types.len(),
            clusters: request.clusters.len(),
            locations: request.locations.len(),
            users: request.users.len(),
        })
    }

    pub fn org_unit(&self, id: i64) -> Result<Option<OrgUnit>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {ORG_UNIT_COLUMNS} FROM ref_satker_units WHERE id=?1"),
                params![id],
                org_unit_from_row,
            )
            .optional()?)
    }

    pub fn org_unit_by_name(&self, name: &str) -> Result<Option<OrgUnit>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {ORG_UNIT_COLUMNS} FROM ref_satker_units \
                     WHERE fold(name)=fold(?1) ORDER BY id LIMIT 1"
                ),
                params![name.trim()],
                org_unit_from_row,
            )
            .optional()?)
    }

    /// Units with non-empty names, optionally restricted to one level label.
    pub fn list_org_units(&self, level_label: Option<&str>) -> Result<Vec<OrgUnit>, StoreError> {
        let mut sql = format!(
            "SELECT {ORG_UNIT_COLUMNS} FROM ref_satker_units WHERE length(trim(name)) > 0"
        );
        let mut params: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(level) = non_blank(level_label) {
            sql.push_str(" AND level_label=?");
            params.push(rusqlite::types::Value::Text(level.to_string()));
        }
        sql.push_str(" ORDER BY name, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(org_unit_from_row(row)?);
        }
        Ok(out)
    }

    pub fn org_unit_levels(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT level_label FROM ref_satker_units \
             WHERE length(trim(level_label)) > 0 ORDER BY level_label",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// `root_id` and every descendant, ascending.
    pub fn org_unit_subtree_ids(&self, root_id: i64) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE subtree(id) AS ( \
               SELECT id FROM ref_satker_units WHERE id=?1 \
               UNION \
               SELECT u.id FROM ref_satker_units u JOIN subtree t ON u.parent_id = t.id \
             ) SELECT id FROM subtree ORDER BY id",
        )?;
        let rows = stmt.query_map(params![root_id], |row| row.get::<_, i64>(0))?;
        let ids = rows.collect::<Result<Vec<_>, _>>()?;
        if ids.is_empty() {
            return Err(StoreError::NotFound("org unit"));
        }
        Ok(ids)
    }

    pub fn activity_type(&self, id: i64) -> Result<Option<ActivityType>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, category, description FROM ref_activity_types WHERE id=?1",
                params![id],
                activity_type_from_row,
            )
            .optional()?)
    }

    pub fn activity_type_by_name(&self, name: &str) -> Result<Option<ActivityType>, StoreError> {
        Ok(activity_type_by_name_tx(&self.conn, name)?)
    }

    pub fn list_activity_types(&self) -> Result<Vec<ActivityType>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, description FROM ref_activity_types ORDER BY name",
        )?;
        let rows = stmt.query_map([], activity_type_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn cluster_by_name(&self, name: &str) -> Result<Option<Cluster>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, description FROM ref_clusters WHERE fold(name)=fold(?1)",
                params![name.trim()],
                |row| {
                    Ok(Cluster {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn list_clusters(&self) -> Result<Vec<Cluster>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM ref_clusters ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Cluster {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn location_by_name(&self, name: &str) -> Result<Option<Location>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, province FROM ref_locations WHERE fold(name)=fold(?1)",
                params![name.trim()],
                |row| {
                    Ok(Location {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        province: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn user_profile(&self, id: i64) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user_profiles WHERE id=?1"),
                params![id],
                user_profile_from_row,
            )
            .optional()?)
    }

    pub fn user_profile_by_identity(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user_profiles WHERE name=?1 AND email=?2"),
                params![name.trim(), email.trim()],
                user_profile_from_row,
            )
            .optional()?)
    }
}

pub(super) fn org_unit_from_row(row: &Row<'_>) -> rusqlite::Result<OrgUnit> {
    Ok(OrgUnit {
        id: row.get(0)?,
        name: row.get(1)?,
        level_label: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

fn activity_type_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityType> {
    Ok(ActivityType {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
    })
}

fn user_profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        external_token: row.get(3)?,
        org_unit_id: row.get(4)?,
        is_active: row.get(5)?,
        first_activity_ms: row.get(6)?,
        last_activity_ms: row.get(7)?,
    })
}

pub(super) fn activity_type_by_name_tx(
    conn: &Connection,
    name: &str,
) -> rusqlite::Result<Option<ActivityType>> {
    conn.query_row(
        "SELECT id, name, category, description FROM ref_activity_types \
         WHERE fold(name)=fold(?1)",
        params![name.trim()],
        activity_type_from_row,
    )
    .optional()
}

/// `{id → parent_id}` for every unit.
pub(super) fn org_unit_parents(conn: &Connection) -> Result<HashMap<i64, Option<i64>>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, parent_id FROM ref_satker_units")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
    })?;
    Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
}

fn validate_org_forest_tx(tx: &Transaction<'_>) -> Result<(), StoreError> {
    let parents = org_unit_parents(tx)?;
    for (id, parent) in &parents {
        if let Some(parent) = parent
            && !parents.contains_key(parent)
        {
            return Err(StoreError::UnknownReference {
                table: Reference::OrgUnit.table(),
                id: *parent,
            });
        }
        let mut current = *parent;
        let mut steps = 0usize;
        while let Some(node) = current {
            if node == *id || steps > parents.len() {
                return Err(StoreError::InvalidInput("org unit hierarchy contains a cycle"));
            }
            steps += 1;
            current = parents.get(&node).copied().flatten();
        }
    }
    Ok(())
}

fn map_seed_conflict(err: rusqlite::Error, message: &'static str) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::InvalidInput(message);
    }
    StoreError::from(err)
}
