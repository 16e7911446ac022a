//! Reusable record predicates.
//!
//! # Responsibility
//! - Build the `(vle_course_id, vle_group_id)` pair predicate shared by the
//!   reconciliation engine and membership expansion.
//! - Render the same predicate for in-memory checks and SQL queries.

pub mod group_filter;
