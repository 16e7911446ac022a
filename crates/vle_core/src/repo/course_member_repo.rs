//! Course membership repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `(user_id, vle_course_id)` is unique across `course_members`.
//! - `is_tutor` is stored as `0|1` and rejected otherwise on read.

use crate::model::membership::{CourseMember, MembershipId};
use crate::model::user::UserId;
use crate::repo::{
    bool_to_int, int_to_bool, placeholders, text_values, RepoResult, UpsertOutcome,
    MAX_BIND_PARAMS,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const COURSE_MEMBER_SELECT_SQL: &str = "SELECT id, user_id, vle_course_id, is_tutor FROM course_members";

/// Repository interface for course memberships.
pub trait CourseMemberRepository {
    fn find_course_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
    ) -> RepoResult<Option<CourseMember>>;
    fn is_course_member(&self, user_id: UserId, vle_course_id: &str) -> RepoResult<bool>;
    fn create_course_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        is_tutor: bool,
    ) -> RepoResult<MembershipId>;
    /// Looks the membership up by `(user, course)`, inserts it if absent, then
    /// writes `is_tutor` unconditionally.
    fn upsert_course_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        is_tutor: bool,
    ) -> RepoResult<(MembershipId, UpsertOutcome)>;
    /// Returns `false` when the membership does not exist.
    fn set_tutor(&self, user_id: UserId, vle_course_id: &str, is_tutor: bool) -> RepoResult<bool>;
    fn delete_course_member(&self, user_id: UserId, vle_course_id: &str) -> RepoResult<usize>;
    fn list_course_member_ids(&self) -> RepoResult<Vec<MembershipId>>;
    fn delete_course_members_by_id(&self, ids: &[MembershipId]) -> RepoResult<usize>;
    /// Lists memberships ordered by `(vle_course_id, user_id)`, optionally for
    /// one course only.
    fn list_course_members(&self, vle_course_id: Option<&str>) -> RepoResult<Vec<CourseMember>>;
    /// User ids with a membership in any of `vle_course_ids` (may repeat).
    fn user_ids_in_courses(&self, vle_course_ids: &[String]) -> RepoResult<Vec<UserId>>;
}

/// SQLite-backed course membership repository.
pub struct SqliteCourseMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseMemberRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CourseMemberRepository for SqliteCourseMemberRepository<'_> {
    fn find_course_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
    ) -> RepoResult<Option<CourseMember>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COURSE_MEMBER_SELECT_SQL}
             WHERE user_id = ?1
               AND vle_course_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id, vle_course_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_course_member_row(row)?));
        }
        Ok(None)
    }

    fn is_course_member(&self, user_id: UserId, vle_course_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM course_members
                WHERE user_id = ?1
                  AND vle_course_id = ?2
            );",
            params![user_id, vle_course_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_course_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        is_tutor: bool,
    ) -> RepoResult<MembershipId> {
        self.conn.execute(
            "INSERT INTO course_members (user_id, vle_course_id, is_tutor)
             VALUES (?1, ?2, ?3);",
            params![user_id, vle_course_id, bool_to_int(is_tutor)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn upsert_course_member(
        &self,
        user_id: UserId,
        vle_course_id: &str,
        is_tutor: bool,
    ) -> RepoResult<(MembershipId, UpsertOutcome)> {
        let Some(existing) = self.find_course_member(user_id, vle_course_id)? else {
            let id = self.create_course_member(user_id, vle_course_id, is_tutor)?;
            return Ok((id, UpsertOutcome::Created));
        };

        self.conn.execute(
            "UPDATE course_members SET is_tutor = ?2 WHERE id = ?1;",
            params![existing.id, bool_to_int(is_tutor)],
        )?;
        let outcome = if existing.is_tutor == is_tutor {
            UpsertOutcome::Unchanged
        } else {
            UpsertOutcome::Updated
        };
        Ok((existing.id, outcome))
    }

    fn set_tutor(&self, user_id: UserId, vle_course_id: &str, is_tutor: bool) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE course_members
             SET is_tutor = ?3
             WHERE user_id = ?1
               AND vle_course_id = ?2;",
            params![user_id, vle_course_id, bool_to_int(is_tutor)],
        )?;
        Ok(changed > 0)
    }

    fn delete_course_member(&self, user_id: UserId, vle_course_id: &str) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM course_members WHERE user_id = ?1 AND vle_course_id = ?2;",
            params![user_id, vle_course_id],
        )?;
        Ok(deleted)
    }

    fn list_course_member_ids(&self) -> RepoResult<Vec<MembershipId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM course_members ORDER BY id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, MembershipId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn delete_course_members_by_id(&self, ids: &[MembershipId]) -> RepoResult<usize> {
        let mut deleted = 0;
        for chunk in ids.chunks(MAX_BIND_PARAMS) {
            deleted += self.conn.execute(
                &format!(
                    "DELETE FROM course_members WHERE id IN ({});",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk.iter()),
            )?;
        }
        Ok(deleted)
    }

    fn list_course_members(&self, vle_course_id: Option<&str>) -> RepoResult<Vec<CourseMember>> {
        let mut sql = String::from(COURSE_MEMBER_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(vle_course_id) = vle_course_id {
            sql.push_str(" WHERE vle_course_id = ?");
            bind_values.push(Value::Text(vle_course_id.to_string()));
        }
        sql.push_str(" ORDER BY vle_course_id ASC, user_id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_course_member_row(row)?);
        }
        Ok(members)
    }

    fn user_ids_in_courses(&self, vle_course_ids: &[String]) -> RepoResult<Vec<UserId>> {
        let mut user_ids = Vec::new();
        for chunk in vle_course_ids.chunks(MAX_BIND_PARAMS) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT user_id FROM course_members WHERE vle_course_id IN ({});",
                placeholders(chunk.len())
            ))?;
            let ids = stmt
                .query_map(params_from_iter(text_values(chunk)), |row| {
                    row.get::<_, UserId>(0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            user_ids.extend(ids);
        }
        Ok(user_ids)
    }
}

fn parse_course_member_row(row: &Row<'_>) -> RepoResult<CourseMember> {
    Ok(CourseMember {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        vle_course_id: row.get("vle_course_id")?,
        is_tutor: int_to_bool(row.get("is_tutor")?, "course_members.is_tutor")?,
    })
}
