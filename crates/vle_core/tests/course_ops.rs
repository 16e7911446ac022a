mod common;

use common::{
    count_rows, course_membership, course_name, group_name, is_group_member, seed_course,
    seed_course_member, seed_group, seed_group_member, seed_lannisters, username,
};
use vle_core::service::requests::{
    CourseMembersRequest, CreateCourseRequest, DeleteCourseRequest, TutorRequest,
    UpdateCourseRequest,
};
use vle_core::{open_db_in_memory, CourseService, ServiceError};

fn usernames(first_names: &[&str]) -> Vec<String> {
    first_names.iter().map(|name| username(name)).collect()
}

#[test]
fn create_course_requires_both_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(&conn);

    for request in [
        CreateCourseRequest {
            name: "Zero Zero One".to_string(),
            ..Default::default()
        },
        CreateCourseRequest {
            vle_course_id: "001".to_string(),
            ..Default::default()
        },
    ] {
        let err = service.create_course(&request).unwrap_err();
        assert_eq!(err.to_string(), "Must specify vle_course_id and name");
    }
    assert_eq!(count_rows(&conn, "course_kv_store"), 0);
}

#[test]
fn create_course_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn, "001", "foobar");

    let err = CourseService::new(&conn)
        .create_course(&CreateCourseRequest {
            vle_course_id: "001".to_string(),
            name: "Zero Zero One".to_string(),
        })
        .unwrap_err();

    assert!(matches!(err, ServiceError::CourseAlreadyExists));
    assert_eq!(
        err.to_string(),
        "Course with given vle_course_id already exists"
    );
    assert_eq!(course_name(&conn, "001").as_deref(), Some("foobar"));
}

#[test]
fn create_course_succeeds() {
    let conn = open_db_in_memory().unwrap();

    let message = CourseService::new(&conn)
        .create_course(&CreateCourseRequest {
            vle_course_id: "001".to_string(),
            name: "Zero Zero One".to_string(),
        })
        .unwrap();

    assert_eq!(message, "Course created successfully!");
    assert_eq!(course_name(&conn, "001").as_deref(), Some("Zero Zero One"));
}

#[test]
fn update_course_renames_and_preserves_children() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_course(&conn, "001", "Zero Zero One");
    seed_group(&conn, "001", "001a", "A");
    seed_group(&conn, "001", "001b", "B");
    seed_course_member(&conn, users["Cersei"], "001", true);
    seed_course_member(&conn, users["Jaime"], "001", false);
    seed_group_member(&conn, users["Cersei"], "001", "001a");
    seed_group_member(&conn, users["Jaime"], "001", "001b");
    seed_course(&conn, "002", "Untouched");
    seed_course_member(&conn, users["Tyrion"], "002", false);

    let message = CourseService::new(&conn)
        .update_course(&UpdateCourseRequest {
            old_vle_course_id: "001".to_string(),
            vle_course_id: "101".to_string(),
            name: "One Zero One".to_string(),
        })
        .unwrap();

    assert_eq!(message, "Course updated successfully!");
    assert_eq!(course_name(&conn, "001"), None);
    assert_eq!(course_name(&conn, "101").as_deref(), Some("One Zero One"));
    assert_eq!(group_name(&conn, "101", "001a").as_deref(), Some("A"));
    assert_eq!(group_name(&conn, "101", "001b").as_deref(), Some("B"));
    assert_eq!(course_membership(&conn, users["Cersei"], "101"), Some(true));
    assert_eq!(course_membership(&conn, users["Jaime"], "101"), Some(false));
    assert!(is_group_member(&conn, users["Cersei"], "101", "001a"));
    assert!(is_group_member(&conn, users["Jaime"], "101", "001b"));
    assert_eq!(count_rows(&conn, "group_kv_store"), 2);
    assert_eq!(count_rows(&conn, "course_members"), 3);
    assert_eq!(count_rows(&conn, "group_members"), 2);
    assert_eq!(course_membership(&conn, users["Tyrion"], "002"), Some(false));
}

#[test]
fn update_course_reports_missing_fields_and_unknown_course() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(&conn);

    let missing = service
        .update_course(&UpdateCourseRequest {
            old_vle_course_id: "001".to_string(),
            vle_course_id: "101".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(
        missing.to_string(),
        "Must specify old_vle_course_id, vle_course_id, name"
    );

    let unknown = service
        .update_course(&UpdateCourseRequest {
            old_vle_course_id: "001".to_string(),
            vle_course_id: "101".to_string(),
            name: "One Zero One".to_string(),
        })
        .unwrap_err();
    assert_eq!(
        unknown.to_string(),
        "Course with given old_vle_course_id does not exist"
    );
}

#[test]
fn delete_course_cascades_only_its_own_records() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_course(&conn, "001", "Doomed");
    seed_group(&conn, "001", "001a", "A");
    seed_course_member(&conn, users["Cersei"], "001", false);
    seed_group_member(&conn, users["Cersei"], "001", "001a");
    seed_course(&conn, "002", "Safe");
    seed_group(&conn, "002", "002a", "B");
    seed_course_member(&conn, users["Cersei"], "002", false);
    seed_group_member(&conn, users["Cersei"], "002", "002a");

    let message = CourseService::new(&conn)
        .delete_course(&DeleteCourseRequest {
            vle_course_id: "001".to_string(),
        })
        .unwrap();

    assert_eq!(message, "Course deleted successfully!");
    assert_eq!(course_name(&conn, "001"), None);
    assert_eq!(group_name(&conn, "001", "001a"), None);
    assert_eq!(course_membership(&conn, users["Cersei"], "001"), None);
    assert!(!is_group_member(&conn, users["Cersei"], "001", "001a"));
    assert_eq!(course_name(&conn, "002").as_deref(), Some("Safe"));
    assert!(is_group_member(&conn, users["Cersei"], "002", "002a"));
}

#[test]
fn delete_course_validates_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(&conn);

    let missing = service
        .delete_course(&DeleteCourseRequest::default())
        .unwrap_err();
    assert_eq!(missing.to_string(), "Must specify vle_course_id");

    let unknown = service
        .delete_course(&DeleteCourseRequest {
            vle_course_id: "001".to_string(),
        })
        .unwrap_err();
    assert_eq!(
        unknown.to_string(),
        "Course with given vle_course_id does not exist"
    );
}

#[test]
fn add_course_members_is_idempotent_and_skips_unknown_users() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_course(&conn, "001", "How to");
    seed_course_member(&conn, users["Cersei"], "001", true);

    let mut names = usernames(&["Cersei", "Jaime"]);
    names.push("unknown.user".to_string());
    let message = CourseService::new(&conn)
        .add_course_members(&CourseMembersRequest {
            vle_course_id: "001".to_string(),
            usernames: names,
        })
        .unwrap();

    assert_eq!(message, "Course members added successfully!");
    assert_eq!(course_membership(&conn, users["Cersei"], "001"), Some(true));
    assert_eq!(course_membership(&conn, users["Jaime"], "001"), Some(false));
    assert_eq!(count_rows(&conn, "course_members"), 2);
}

#[test]
fn add_course_members_requires_course_and_usernames() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(&conn);

    let missing = service
        .add_course_members(&CourseMembersRequest {
            vle_course_id: "001".to_string(),
            usernames: Vec::new(),
        })
        .unwrap_err();
    assert_eq!(
        missing.to_string(),
        "Must specify vle_course_id and usernames"
    );

    let unknown = service
        .add_course_members(&CourseMembersRequest {
            vle_course_id: "001".to_string(),
            usernames: usernames(&["Jaime"]),
        })
        .unwrap_err();
    assert_eq!(
        unknown.to_string(),
        "Course with given vle_course_id does not exist"
    );
}

#[test]
fn remove_course_members_also_drops_their_groups_in_that_course() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_course(&conn, "001", "How to");
    seed_course(&conn, "002", "Why to");
    seed_course_member(&conn, users["Cersei"], "001", false);
    seed_course_member(&conn, users["Cersei"], "002", false);
    seed_course_member(&conn, users["Jaime"], "001", false);
    seed_group_member(&conn, users["Cersei"], "001", "001a");
    seed_group_member(&conn, users["Cersei"], "001", "001b");
    seed_group_member(&conn, users["Cersei"], "002", "002a");
    seed_group_member(&conn, users["Jaime"], "001", "001a");

    let message = CourseService::new(&conn)
        .remove_course_members(&CourseMembersRequest {
            vle_course_id: "001".to_string(),
            usernames: usernames(&["Cersei", "Tywin"]),
        })
        .unwrap();

    assert_eq!(message, "Course members removed successfully!");
    assert_eq!(course_membership(&conn, users["Cersei"], "001"), None);
    assert!(!is_group_member(&conn, users["Cersei"], "001", "001a"));
    assert!(!is_group_member(&conn, users["Cersei"], "001", "001b"));
    assert_eq!(course_membership(&conn, users["Cersei"], "002"), Some(false));
    assert!(is_group_member(&conn, users["Cersei"], "002", "002a"));
    assert_eq!(course_membership(&conn, users["Jaime"], "001"), Some(false));
    assert!(is_group_member(&conn, users["Jaime"], "001", "001a"));
}

#[test]
fn tutor_flag_requires_existing_membership() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_course(&conn, "001", "How to");
    let service = CourseService::new(&conn);
    let request = TutorRequest {
        vle_course_id: "001".to_string(),
        username: username("Jaime"),
    };

    let err = service.add_tutor(&request).unwrap_err();
    assert!(matches!(err, ServiceError::NotCourseMember));
    assert_eq!(err.to_string(), "User is not a course member");

    service
        .add_course_members(&CourseMembersRequest {
            vle_course_id: "001".to_string(),
            usernames: vec![username("Jaime")],
        })
        .unwrap();
    assert_eq!(service.add_tutor(&request).unwrap(), "Tutor added successfully!");
    assert_eq!(course_membership(&conn, users["Jaime"], "001"), Some(true));

    assert_eq!(
        service.remove_tutor(&request).unwrap(),
        "Tutor removed successfully!"
    );
    assert_eq!(course_membership(&conn, users["Jaime"], "001"), Some(false));
}

#[test]
fn tutor_calls_report_missing_fields_and_unknown_users() {
    let conn = open_db_in_memory().unwrap();
    let service = CourseService::new(&conn);

    let missing = service
        .remove_tutor(&TutorRequest {
            vle_course_id: "001".to_string(),
            username: String::new(),
        })
        .unwrap_err();
    assert_eq!(
        missing.to_string(),
        "Must specify vle_course_id and username"
    );

    let unknown = service
        .add_tutor(&TutorRequest {
            vle_course_id: "001".to_string(),
            username: "unknown.user".to_string(),
        })
        .unwrap_err();
    assert_eq!(unknown.to_string(), "User does not exist");
}

#[test]
fn tutor_calls_do_not_check_the_course_record() {
    let conn = open_db_in_memory().unwrap();
    let users = seed_lannisters(&conn);
    seed_course_member(&conn, users["Tyrion"], "404", false);

    CourseService::new(&conn)
        .add_tutor(&TutorRequest {
            vle_course_id: "404".to_string(),
            username: username("Tyrion"),
        })
        .unwrap();

    assert_eq!(course_membership(&conn, users["Tyrion"], "404"), Some(true));
}
