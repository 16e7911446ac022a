mod common;

use common::{seed_course_member, seed_group_member, seed_lannisters};
use vle_core::{expand_user_ids, open_db_in_memory, ExpandError, ExpandQuery};

fn query(user_ids: &[i64], group_ids: &[&str], course_ids: &[&str]) -> ExpandQuery {
    ExpandQuery {
        delimiter: "::".to_string(),
        user_ids: user_ids.to_vec(),
        group_ids: group_ids.iter().map(|id| id.to_string()).collect(),
        course_ids: course_ids.iter().map(|id| id.to_string()).collect(),
    }
}

#[test]
fn direct_users_only_are_returned_sorted_and_unique() {
    let conn = open_db_in_memory().unwrap();

    let ids = expand_user_ids(&conn, &query(&[9, 3, 9], &[], &[])).unwrap();

    assert_eq!(ids, vec![3, 9]);
}

#[test]
fn group_ids_resolve_to_group_members() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_group_member(&conn, users["Tywin"], "001", "a");
    seed_group_member(&conn, users["Cersei"], "001", "a");
    seed_group_member(&conn, users["Jaime"], "001", "b");
    seed_group_member(&conn, users["Tyrion"], "002", "a");

    let ids = expand_user_ids(&conn, &query(&[], &["001::a"], &[])).unwrap();

    let mut expected = vec![users["Tywin"], users["Cersei"]];
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[test]
fn union_of_users_groups_and_courses_collapses_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_group_member(&conn, users["Cersei"], "001", "a");
    seed_group_member(&conn, users["Jaime"], "001", "a");
    seed_course_member(&conn, users["Cersei"], "001", false);
    seed_course_member(&conn, users["Tyrion"], "001", true);
    seed_course_member(&conn, users["Tywin"], "002", false);

    let ids = expand_user_ids(
        &conn,
        &query(&[users["Jaime"]], &["001::a"], &["001"]),
    )
    .unwrap();

    let mut expected = vec![users["Cersei"], users["Jaime"], users["Tyrion"]];
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[test]
fn unknown_scopes_expand_to_nothing() {
    let conn = open_db_in_memory().unwrap();
    seed_lannisters(&conn);

    let ids = expand_user_ids(&conn, &query(&[], &["404::a"], &["404"])).unwrap();

    assert!(ids.is_empty());
}

#[test]
fn malformed_group_id_is_rejected() {
    let conn = open_db_in_memory().unwrap();

    let err = expand_user_ids(&conn, &query(&[], &["001a"], &[])).unwrap_err();

    assert!(matches!(err, ExpandError::MalformedGroupId(value) if value == "001a"));
}
