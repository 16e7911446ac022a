//! Group repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(vle_course_id, vle_group_id)` is unique across `group_kv_store`.
//! - Renaming or deleting a group cascades into group members with the same
//!   pair. The owning course of a group never changes here.

use crate::filter::group_filter::{FilterMode, GroupFilter};
use crate::model::group::{Group, GroupKey};
use crate::repo::{RepoResult, UpsertOutcome, MAX_BIND_PARAMS};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Rows removed by a group delete cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCascade {
    pub groups: usize,
    pub group_members: usize,
}

/// Repository interface for group records.
pub trait GroupRepository {
    fn get_group(&self, vle_course_id: &str, vle_group_id: &str) -> RepoResult<Option<Group>>;
    fn group_exists(&self, vle_course_id: &str, vle_group_id: &str) -> RepoResult<bool>;
    /// Lists groups ordered by `(vle_course_id, vle_group_id)`, optionally
    /// restricted by a pair filter.
    fn list_groups(&self, filter: Option<(&GroupFilter, FilterMode)>) -> RepoResult<Vec<Group>>;
    fn list_group_keys(&self) -> RepoResult<Vec<GroupKey>>;
    /// Inserts a new group. Fails on a duplicate pair.
    fn create_group(&self, group: &Group) -> RepoResult<()>;
    /// Looks the group up by pair, inserts it if absent, then writes `name`.
    fn upsert_group(&self, group: &Group) -> RepoResult<UpsertOutcome>;
    /// Re-keys `(vle_course_id, old_vle_group_id)` to `new_vle_group_id` on the
    /// group and its members and writes the new name. Returns `false` when no
    /// such group exists.
    fn rename_group(
        &self,
        vle_course_id: &str,
        old_vle_group_id: &str,
        new_vle_group_id: &str,
        name: &str,
    ) -> RepoResult<bool>;
    /// Deletes every group and group member selected by `filter`.
    fn delete_groups(&self, filter: &GroupFilter) -> RepoResult<GroupCascade>;
}

/// SQLite-backed group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn get_group(&self, vle_course_id: &str, vle_group_id: &str) -> RepoResult<Option<Group>> {
        let group = self
            .conn
            .query_row(
                "SELECT vle_course_id, vle_group_id, name
                 FROM group_kv_store
                 WHERE vle_course_id = ?1
                   AND vle_group_id = ?2;",
                [vle_course_id, vle_group_id],
                parse_group_row,
            )
            .optional()?;
        Ok(group)
    }

    fn group_exists(&self, vle_course_id: &str, vle_group_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM group_kv_store
                WHERE vle_course_id = ?1
                  AND vle_group_id = ?2
            );",
            [vle_course_id, vle_group_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_groups(&self, filter: Option<(&GroupFilter, FilterMode)>) -> RepoResult<Vec<Group>> {
        let mut sql = String::from("SELECT vle_course_id, vle_group_id, name FROM group_kv_store");
        let mut bind_values = Vec::new();
        if let Some((filter, mode)) = filter {
            let (clause, values) = filter.to_sql(mode, "vle_course_id", "vle_group_id");
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            bind_values = values;
        }
        sql.push_str(" ORDER BY vle_course_id ASC, vle_group_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let groups = stmt
            .query_map(params_from_iter(bind_values), parse_group_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    fn list_group_keys(&self) -> RepoResult<Vec<GroupKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT vle_course_id, vle_group_id
             FROM group_kv_store
             ORDER BY vle_course_id ASC, vle_group_id ASC;",
        )?;
        let keys = stmt
            .query_map([], |row| {
                Ok(GroupKey {
                    vle_course_id: row.get(0)?,
                    vle_group_id: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    fn create_group(&self, group: &Group) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO group_kv_store (vle_course_id, vle_group_id, name)
             VALUES (?1, ?2, ?3);",
            params![group.vle_course_id, group.vle_group_id, group.name],
        )?;
        Ok(())
    }

    fn upsert_group(&self, group: &Group) -> RepoResult<UpsertOutcome> {
        let outcome = match self.get_group(&group.vle_course_id, &group.vle_group_id)? {
            None => {
                self.create_group(group)?;
                return Ok(UpsertOutcome::Created);
            }
            Some(existing) if existing.name == group.name => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Updated,
        };

        self.conn.execute(
            "UPDATE group_kv_store
             SET name = ?3
             WHERE vle_course_id = ?1
               AND vle_group_id = ?2;",
            params![group.vle_course_id, group.vle_group_id, group.name],
        )?;
        Ok(outcome)
    }

    fn rename_group(
        &self,
        vle_course_id: &str,
        old_vle_group_id: &str,
        new_vle_group_id: &str,
        name: &str,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE group_kv_store
             SET vle_group_id = ?3,
                 name = ?4
             WHERE vle_course_id = ?1
               AND vle_group_id = ?2;",
            params![vle_course_id, old_vle_group_id, new_vle_group_id, name],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        self.conn.execute(
            "UPDATE group_members
             SET vle_group_id = ?3
             WHERE vle_course_id = ?1
               AND vle_group_id = ?2;",
            params![vle_course_id, old_vle_group_id, new_vle_group_id],
        )?;
        Ok(true)
    }

    fn delete_groups(&self, filter: &GroupFilter) -> RepoResult<GroupCascade> {
        let mut cascade = GroupCascade::default();
        for chunk in filter.chunks(MAX_BIND_PARAMS / 2) {
            let (clause, values) = chunk.to_sql(FilterMode::Matching, "vle_course_id", "vle_group_id");
            cascade.groups += self.conn.execute(
                &format!("DELETE FROM group_kv_store WHERE {clause};"),
                params_from_iter(values.iter()),
            )?;
            cascade.group_members += self.conn.execute(
                &format!("DELETE FROM group_members WHERE {clause};"),
                params_from_iter(values.iter()),
            )?;
        }
        Ok(cascade)
    }
}

fn parse_group_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        vle_course_id: row.get(0)?,
        vle_group_id: row.get(1)?,
        name: row.get(2)?,
    })
}
