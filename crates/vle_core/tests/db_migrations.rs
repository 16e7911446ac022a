use rusqlite::Connection;
use vle_core::db::migrations::latest_version;
use vle_core::db::{open_db, open_db_in_memory, DbError};

const MIRROR_TABLES: [&str; 5] = [
    "users",
    "course_kv_store",
    "group_kv_store",
    "course_members",
    "group_members",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in MIRROR_TABLES {
        assert_table_exists(&conn, table);
    }
    assert_index_exists(&conn, "idx_course_members_tutor");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror.sqlite3");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "group_members");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn composite_keys_are_unique() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (username) VALUES ('cersei.lannister');
         INSERT INTO group_kv_store (vle_course_id, vle_group_id, name) VALUES ('001', 'a', 'A');
         INSERT INTO course_members (user_id, vle_course_id) VALUES (1, '001');",
    )
    .unwrap();

    assert!(conn
        .execute(
            "INSERT INTO group_kv_store (vle_course_id, vle_group_id, name) VALUES ('001', 'a', 'B');",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO course_members (user_id, vle_course_id, is_tutor) VALUES (1, '001', 1);",
            [],
        )
        .is_err());
}

#[test]
fn memberships_require_a_known_user() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO group_members (user_id, vle_course_id, vle_group_id) VALUES (42, '001', 'a');",
        [],
    );

    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object(conn, "index", index_name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
