//! Course repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `vle_course_id` is unique across `course_kv_store`.
//! - Renaming or deleting a course cascades into groups, course members and
//!   group members sharing its `vle_course_id`.

use crate::model::course::Course;
use crate::repo::{placeholders, text_values, RepoResult, UpsertOutcome, MAX_BIND_PARAMS};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

/// Rows removed by a course delete cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseCascade {
    pub courses: usize,
    pub groups: usize,
    pub course_members: usize,
    pub group_members: usize,
}

impl CourseCascade {
    fn absorb(&mut self, other: CourseCascade) {
        self.courses += other.courses;
        self.groups += other.groups;
        self.course_members += other.course_members;
        self.group_members += other.group_members;
    }
}

/// Repository interface for course records.
pub trait CourseRepository {
    fn get_course(&self, vle_course_id: &str) -> RepoResult<Option<Course>>;
    fn course_exists(&self, vle_course_id: &str) -> RepoResult<bool>;
    fn list_courses(&self) -> RepoResult<Vec<Course>>;
    fn list_course_ids(&self) -> RepoResult<Vec<String>>;
    /// Inserts a new course. Fails on a duplicate `vle_course_id`.
    fn create_course(&self, course: &Course) -> RepoResult<()>;
    /// Looks the course up by key, inserts it if absent, then writes `name`.
    fn upsert_course(&self, course: &Course) -> RepoResult<UpsertOutcome>;
    /// Re-keys `old_vle_course_id` to `course.vle_course_id` everywhere and
    /// writes the new name. Returns `false` when no such course exists.
    fn rename_course(&self, old_vle_course_id: &str, course: &Course) -> RepoResult<bool>;
    /// Deletes the courses and every dependent record sharing their ids.
    fn delete_courses(&self, vle_course_ids: &[String]) -> RepoResult<CourseCascade>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn get_course(&self, vle_course_id: &str) -> RepoResult<Option<Course>> {
        let course = self
            .conn
            .query_row(
                "SELECT vle_course_id, name
                 FROM course_kv_store
                 WHERE vle_course_id = ?1;",
                [vle_course_id],
                |row| {
                    Ok(Course {
                        vle_course_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(course)
    }

    fn course_exists(&self, vle_course_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM course_kv_store WHERE vle_course_id = ?1);",
            [vle_course_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT vle_course_id, name
             FROM course_kv_store
             ORDER BY vle_course_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(Course {
                vle_course_id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(courses)
    }

    fn list_course_ids(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT vle_course_id FROM course_kv_store ORDER BY vle_course_id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn create_course(&self, course: &Course) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO course_kv_store (vle_course_id, name) VALUES (?1, ?2);",
            params![course.vle_course_id, course.name],
        )?;
        Ok(())
    }

    fn upsert_course(&self, course: &Course) -> RepoResult<UpsertOutcome> {
        let outcome = match self.get_course(&course.vle_course_id)? {
            None => {
                self.create_course(course)?;
                return Ok(UpsertOutcome::Created);
            }
            Some(existing) if existing.name == course.name => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Updated,
        };

        self.conn.execute(
            "UPDATE course_kv_store SET name = ?2 WHERE vle_course_id = ?1;",
            params![course.vle_course_id, course.name],
        )?;
        Ok(outcome)
    }

    fn rename_course(&self, old_vle_course_id: &str, course: &Course) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE course_kv_store
             SET vle_course_id = ?2,
                 name = ?3
             WHERE vle_course_id = ?1;",
            params![old_vle_course_id, course.vle_course_id, course.name],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        for table in ["group_kv_store", "course_members", "group_members"] {
            self.conn.execute(
                &format!("UPDATE {table} SET vle_course_id = ?2 WHERE vle_course_id = ?1;"),
                params![old_vle_course_id, course.vle_course_id],
            )?;
        }
        Ok(true)
    }

    fn delete_courses(&self, vle_course_ids: &[String]) -> RepoResult<CourseCascade> {
        let mut total = CourseCascade::default();
        for chunk in vle_course_ids.chunks(MAX_BIND_PARAMS) {
            total.absorb(delete_course_chunk(self.conn, chunk)?);
        }
        Ok(total)
    }
}

fn delete_course_chunk(conn: &Connection, ids: &[String]) -> RepoResult<CourseCascade> {
    let marks = placeholders(ids.len());
    let delete_from = |table: &str| -> RepoResult<usize> {
        let deleted = conn.execute(
            &format!("DELETE FROM {table} WHERE vle_course_id IN ({marks});"),
            params_from_iter(text_values(ids)),
        )?;
        Ok(deleted)
    };

    Ok(CourseCascade {
        courses: delete_from("course_kv_store")?,
        groups: delete_from("group_kv_store")?,
        course_members: delete_from("course_members")?,
        group_members: delete_from("group_members")?,
    })
}
