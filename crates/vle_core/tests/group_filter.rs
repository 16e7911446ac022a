mod common;

use common::{seed_group, seed_group_member, seed_lannisters};
use vle_core::model::group::GroupKey;
use vle_core::repo::group_member_repo::{GroupMemberRepository, SqliteGroupMemberRepository};
use vle_core::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use vle_core::{open_db_in_memory, FilterMode, GroupFilter, GroupFilterError};

fn seed_grid(conn: &rusqlite::Connection) {
    let users = seed_lannisters(conn);
    for course in ["001", "002"] {
        for group in ["a", "b", "c"] {
            seed_group(conn, course, group, &format!("{course}{group}"));
            seed_group_member(conn, users["Cersei"], course, group);
        }
    }
}

fn filter() -> GroupFilter {
    GroupFilter::new([GroupKey::new("001", "a"), GroupKey::new("002", "c")]).unwrap()
}

#[test]
fn empty_pair_list_is_rejected() {
    let err = GroupFilter::new(Vec::<GroupKey>::new()).unwrap_err();
    assert!(matches!(err, GroupFilterError::Empty));
}

#[test]
fn matching_selects_exactly_the_listed_pairs() {
    let conn = open_db_in_memory().unwrap();
    seed_grid(&conn);

    let groups = SqliteGroupRepository::new(&conn)
        .list_groups(Some((&filter(), FilterMode::Matching)))
        .unwrap();
    let keys: Vec<GroupKey> = groups.iter().map(|group| group.key()).collect();
    assert_eq!(keys, vec![GroupKey::new("001", "a"), GroupKey::new("002", "c")]);

    let members = SqliteGroupMemberRepository::new(&conn)
        .list_group_members(Some((&filter(), FilterMode::Matching)))
        .unwrap();
    assert_eq!(members.len(), 2);
}

#[test]
fn excluding_selects_the_complement() {
    let conn = open_db_in_memory().unwrap();
    seed_grid(&conn);

    let groups = SqliteGroupRepository::new(&conn)
        .list_groups(Some((&filter(), FilterMode::Excluding)))
        .unwrap();

    assert_eq!(groups.len(), 4);
    for group in &groups {
        assert!(!filter().matches(&group.vle_course_id, &group.vle_group_id));
    }
}

#[test]
fn pairs_are_matched_on_both_fields() {
    let conn = open_db_in_memory().unwrap();
    seed_grid(&conn);

    let crossed = GroupFilter::new([GroupKey::new("001", "c"), GroupKey::new("003", "a")]).unwrap();
    let groups = SqliteGroupRepository::new(&conn)
        .list_groups(Some((&crossed, FilterMode::Matching)))
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key(), GroupKey::new("001", "c"));
}

#[test]
fn batched_delete_handles_more_pairs_than_one_statement_binds() {
    let conn = open_db_in_memory().unwrap();
    let keys: Vec<GroupKey> = (0..700)
        .map(|index| GroupKey::new("001", format!("g{index:04}")))
        .collect();
    for key in &keys {
        seed_group(&conn, &key.vle_course_id, &key.vle_group_id, "bulk");
    }
    seed_group(&conn, "001", "keep", "survivor");

    let cascade = SqliteGroupRepository::new(&conn)
        .delete_groups(&GroupFilter::new(keys).unwrap())
        .unwrap();

    assert_eq!(cascade.groups, 700);
    let remaining = SqliteGroupRepository::new(&conn).list_group_keys().unwrap();
    assert_eq!(remaining, vec![GroupKey::new("001", "keep")]);
}
