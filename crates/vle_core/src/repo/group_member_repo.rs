//! Group membership repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(user_id, vle_course_id, vle_group_id)` is unique across
//!   `group_members`.
//! - Group members carry no mutable payload; they are only created or removed.

use crate::filter::group_filter::{FilterMode, GroupFilter};
use crate::model::membership::{GroupMember, MembershipId};
use crate::model::user::UserId;
use crate::repo::{placeholders, RepoResult, UpsertOutcome, MAX_BIND_PARAMS};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Repository interface for group memberships.
pub trait GroupMemberRepository {
    fn is_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<bool>;
    fn create_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<MembershipId>;
    /// Returns the existing membership id, or inserts one.
    fn get_or_create_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<(MembershipId, UpsertOutcome)>;
    fn delete_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<usize>;
    /// Deletes every group membership of `user_id` within one course.
    fn delete_group_members_in_course(
        &self,
        user_id: UserId,
        vle_course_id: &str,
    ) -> RepoResult<usize>;
    fn list_group_member_ids(&self) -> RepoResult<Vec<MembershipId>>;
    fn delete_group_members_by_id(&self, ids: &[MembershipId]) -> RepoResult<usize>;
    /// Lists memberships ordered by `(vle_course_id, vle_group_id, user_id)`.
    fn list_group_members(
        &self,
        filter: Option<(&GroupFilter, FilterMode)>,
    ) -> RepoResult<Vec<GroupMember>>;
    /// User ids with a membership in any group matched by `filter` (may repeat).
    fn user_ids_in_groups(&self, filter: &GroupFilter) -> RepoResult<Vec<UserId>>;
}

/// SQLite-backed group membership repository.
pub struct SqliteGroupMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupMemberRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_group_member_id(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<Option<MembershipId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id
                 FROM group_members
                 WHERE user_id = ?1
                   AND vle_course_id = ?2
                   AND vle_group_id = ?3;",
                params![user_id, vle_course_id, vle_group_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl GroupMemberRepository for SqliteGroupMemberRepository<'_> {
    fn is_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<bool> {
        Ok(self
            .find_group_member_id(user_id, vle_course_id, vle_group_id)?
            .is_some())
    }

    fn create_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<MembershipId> {
        self.conn.execute(
            "INSERT INTO group_members (user_id, vle_course_id, vle_group_id)
             VALUES (?1, ?2, ?3);",
            params![user_id, vle_course_id, vle_group_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_or_create_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<(MembershipId, UpsertOutcome)> {
        if let Some(id) = self.find_group_member_id(user_id, vle_course_id, vle_group_id)? {
            return Ok((id, UpsertOutcome::Unchanged));
        }
        let id = self.create_group_member(user_id, vle_course_id, vle_group_id)?;
        Ok((id, UpsertOutcome::Created))
    }

    fn delete_group_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        vle_group_id: &str,
    ) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM group_members
             WHERE user_id = ?1
               AND vle_course_id = ?2
               AND vle_group_id = ?3;",
            params![user_id, vle_course_id, vle_group_id],
        )?;
        Ok(deleted)
    }

    fn delete_group_members_in_course(
        &self,
        user_id: UserId,
        vle_course_id: &str,
    ) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM group_members WHERE user_id = ?1 AND vle_course_id = ?2;",
            params![user_id, vle_course_id],
        )?;
        Ok(deleted)
    }

    fn list_group_member_ids(&self) -> RepoResult<Vec<MembershipId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM group_members ORDER BY id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, MembershipId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn delete_group_members_by_id(&self, ids: &[MembershipId]) -> RepoResult<usize> {
        let mut deleted = 0;
        for chunk in ids.chunks(MAX_BIND_PARAMS) {
            deleted += self.conn.execute(
                &format!(
                    "DELETE FROM group_members WHERE id IN ({});",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk.iter()),
            )?;
        }
        Ok(deleted)
    }

    fn list_group_members(
        &self,
        filter: Option<(&GroupFilter, FilterMode)>,
    ) -> RepoResult<Vec<GroupMember>> {
        let mut sql =
            String::from("SELECT id, user_id, vle_course_id, vle_group_id FROM group_members");
        let mut bind_values = Vec::new();
        if let Some((filter, mode)) = filter {
            let (clause, values) = filter.to_sql(mode, "vle_course_id", "vle_group_id");
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            bind_values = values;
        }
        sql.push_str(" ORDER BY vle_course_id ASC, vle_group_id ASC, user_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let members = stmt
            .query_map(params_from_iter(bind_values), parse_group_member_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    fn user_ids_in_groups(&self, filter: &GroupFilter) -> RepoResult<Vec<UserId>> {
        let mut user_ids = Vec::new();
        for chunk in filter.chunks(MAX_BIND_PARAMS / 2) {
            let (clause, values) =
                chunk.to_sql(FilterMode::Matching, "vle_course_id", "vle_group_id");
            let mut stmt = self
                .conn
                .prepare(&format!("SELECT user_id FROM group_members WHERE {clause};"))?;
            let ids = stmt
                .query_map(params_from_iter(values), |row| row.get::<_, UserId>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            user_ids.extend(ids);
        }
        Ok(user_ids)
    }
}

fn parse_group_member_row(row: &Row<'_>) -> rusqlite::Result<GroupMember> {
    Ok(GroupMember {
        id: row.get(0)?,
        user_id: row.get(1)?,
        vle_course_id: row.get(2)?,
        vle_group_id: row.get(3)?,
    })
}
