//! Membership data model mirrored from the VLE.
//!
//! # Responsibility
//! - Define the four mirrored record shapes and the identity-store user.
//! - Provide the human-readable renderings used by operators.
//!
//! # Invariants
//! - `vle_course_id`/`vle_group_id` are opaque external identifiers and may be
//!   rewritten in place; they are never surrogate keys.
//! - A group member is only meaningful alongside a course member of the same
//!   user and course. This is enforced procedurally, not by the schema.

pub mod course;
pub mod group;
pub mod membership;
pub mod user;
