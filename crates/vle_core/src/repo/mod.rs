//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Keep SQL for the mirrored record sets inside the persistence boundary.
//! - Provide the cascade primitives (re-key, batched delete) used by services
//!   and the reconciliation engine.
//!
//! # Invariants
//! - Repositories never open transactions. Callers wrap every top-level
//!   operation in one transaction and hand repositories the transaction's
//!   connection.
//! - Duplicate composite keys surface as `RepoError::Db`; validation ordering
//!   upstream is expected to make them unreachable.

use crate::db::DbError;
use crate::filter::group_filter::GroupFilterError;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod course_member_repo;
pub mod course_repo;
pub mod group_member_repo;
pub mod group_repo;
pub mod user_repo;

/// Bound parameters per statement for id/key list operations.
///
/// Kept well under SQLite's `SQLITE_MAX_VARIABLE_NUMBER`.
pub(crate) const MAX_BIND_PARAMS: usize = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error shared by all mirror repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Filter(GroupFilterError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Filter(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Filter(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<GroupFilterError> for RepoError {
    fn from(value: GroupFilterError) -> Self {
        Self::Filter(value)
    }
}

/// Result of a lookup-then-branch write keyed by a composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record had the key; one was inserted.
    Created,
    /// A record existed and at least one attribute changed.
    Updated,
    /// A record existed and already carried the incoming attributes.
    Unchanged,
}

/// `?, ?, ?` for `count` bind parameters.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn text_values<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<Value> {
    items
        .into_iter()
        .map(|item| Value::Text(item.clone()))
        .collect()
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
