//! Mutation use-case services and membership expansion.
//!
//! # Responsibility
//! - Validate required fields, then referenced-entity existence, then apply
//!   exactly one write (create, attribute update, rename cascade, or delete
//!   cascade).
//! - Map every client-visible failure to its fixed message.
//!
//! # Invariants
//! - No write happens before validation completes.
//! - Each operation runs in one immediate transaction; a failure rolls the
//!   whole cascade back.

use crate::repo::RepoError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod course_service;
pub mod expansion;
pub mod group_service;
pub mod requests;

pub const COURSE_CREATED: &str = "Course created successfully!";
pub const COURSE_UPDATED: &str = "Course updated successfully!";
pub const COURSE_DELETED: &str = "Course deleted successfully!";
pub const COURSE_MEMBERS_ADDED: &str = "Course members added successfully!";
pub const COURSE_MEMBERS_REMOVED: &str = "Course members removed successfully!";
pub const TUTOR_ADDED: &str = "Tutor added successfully!";
pub const TUTOR_REMOVED: &str = "Tutor removed successfully!";
pub const GROUP_CREATED: &str = "Group created successfully!";
pub const GROUP_UPDATED: &str = "Group updated successfully!";
pub const GROUP_DELETED: &str = "Group deleted successfully!";
pub const GROUP_MEMBERS_ADDED: &str = "Group members added successfully!";
pub const GROUP_MEMBERS_REMOVED: &str = "Group members removed successfully!";

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from mutation services.
///
/// Every variant except `Repo` is a client error whose `Display` output is a
/// fixed, caller-visible message.
#[derive(Debug)]
pub enum ServiceError {
    /// One or more required fields were empty. Holds the joined field names.
    MissingFields(&'static str),
    CourseAlreadyExists,
    /// Holds the identifier field name the caller supplied.
    CourseNotFound(&'static str),
    GroupAlreadyExists,
    /// Holds the identifier field names the caller supplied.
    GroupNotFound(&'static str),
    UserNotFound,
    NotCourseMember,
    /// Storage failure. Never shown verbatim to callers.
    Repo(RepoError),
}

impl ServiceError {
    /// Returns whether this error belongs to the bad-request contract.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repo(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields(fields) => write!(f, "Must specify {fields}"),
            Self::CourseAlreadyExists => {
                write!(f, "Course with given vle_course_id already exists")
            }
            Self::CourseNotFound(field) => write!(f, "Course with given {field} does not exist"),
            Self::GroupAlreadyExists => write!(
                f,
                "Group with given vle_course_id and vle_group_id already exists"
            ),
            Self::GroupNotFound(fields) => write!(f, "Group with given {fields} does not exist"),
            Self::UserNotFound => write!(f, "User does not exist"),
            Self::NotCourseMember => write!(f, "User is not a course member"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Opens the single write transaction backing one top-level operation.
pub(crate) fn begin_write(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}
