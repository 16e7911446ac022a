//! Identity store lookups.
//!
//! The `users` table is owned by the identity provider; this system only
//! resolves usernames to users.

use crate::model::user::{User, UserId};
use crate::repo::RepoResult;
use rusqlite::{Connection, OptionalExtension, Row};

/// Read-only user directory.
pub trait UserDirectory {
    /// Resolves a username, returning `None` when no such user exists.
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Loads a user by primary key.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
}

/// SQLite-backed user directory.
pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, first_name, last_name, email
                 FROM users
                 WHERE username = ?1;",
                [username],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, first_name, last_name, email
                 FROM users
                 WHERE id = ?1;",
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
    })
}
