#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::collections::HashMap;
use vle_core::model::user::UserId;

pub const LANNISTERS: [&str; 4] = ["Cersei", "Jaime", "Tyrion", "Tywin"];

/// Inserts the four Lannisters and returns their ids by first name.
pub fn seed_lannisters(conn: &Connection) -> HashMap<&'static str, UserId> {
    LANNISTERS
        .iter()
        .map(|first_name| {
            let username = format!("{}.lannister", first_name.to_lowercase());
            conn.execute(
                "INSERT INTO users (username, first_name, last_name, email)
                 VALUES (?1, ?2, 'Lannister', ?3);",
                params![username, first_name, format!("{username}@into.uk.com")],
            )
            .unwrap();
            (*first_name, conn.last_insert_rowid())
        })
        .collect()
}

pub fn username(first_name: &str) -> String {
    format!("{}.lannister", first_name.to_lowercase())
}

pub fn seed_course(conn: &Connection, vle_course_id: &str, name: &str) {
    conn.execute(
        "INSERT INTO course_kv_store (vle_course_id, name) VALUES (?1, ?2);",
        params![vle_course_id, name],
    )
    .unwrap();
}

pub fn seed_group(conn: &Connection, vle_course_id: &str, vle_group_id: &str, name: &str) {
    conn.execute(
        "INSERT INTO group_kv_store (vle_course_id, vle_group_id, name) VALUES (?1, ?2, ?3);",
        params![vle_course_id, vle_group_id, name],
    )
    .unwrap();
}

pub fn seed_course_member(conn: &Connection, user_id: UserId, vle_course_id: &str, is_tutor: bool) {
    conn.execute(
        "INSERT INTO course_members (user_id, vle_course_id, is_tutor) VALUES (?1, ?2, ?3);",
        params![user_id, vle_course_id, is_tutor],
    )
    .unwrap();
}

pub fn seed_group_member(
    conn: &Connection,
    user_id: UserId,
    vle_course_id: &str,
    vle_group_id: &str,
) {
    conn.execute(
        "INSERT INTO group_members (user_id, vle_course_id, vle_group_id) VALUES (?1, ?2, ?3);",
        params![user_id, vle_course_id, vle_group_id],
    )
    .unwrap();
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn course_name(conn: &Connection, vle_course_id: &str) -> Option<String> {
    conn.query_row(
        "SELECT name FROM course_kv_store WHERE vle_course_id = ?1;",
        [vle_course_id],
        |row| row.get(0),
    )
    .ok()
}

pub fn group_name(conn: &Connection, vle_course_id: &str, vle_group_id: &str) -> Option<String> {
    conn.query_row(
        "SELECT name FROM group_kv_store WHERE vle_course_id = ?1 AND vle_group_id = ?2;",
        [vle_course_id, vle_group_id],
        |row| row.get(0),
    )
    .ok()
}

/// `Some(is_tutor)` when the membership exists.
pub fn course_membership(conn: &Connection, user_id: UserId, vle_course_id: &str) -> Option<bool> {
    conn.query_row(
        "SELECT is_tutor FROM course_members WHERE user_id = ?1 AND vle_course_id = ?2;",
        params![user_id, vle_course_id],
        |row| row.get(0),
    )
    .ok()
}

pub fn is_group_member(
    conn: &Connection,
    user_id: UserId,
    vle_course_id: &str,
    vle_group_id: &str,
) -> bool {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM group_members
            WHERE user_id = ?1 AND vle_course_id = ?2 AND vle_group_id = ?3
        );",
        params![user_id, vle_course_id, vle_group_id],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}
