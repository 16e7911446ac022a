//! JSON adapter for the VLE push API.
//!
//! # Responsibility
//! - Map the twelve endpoint paths to mutation services.
//! - Decode request bodies and encode `successMessage`/`errorMessage` replies.
//!
//! # Invariants
//! - Client errors answer 400 with their fixed message.
//! - Storage failures answer 500 with a generic message; the cause is logged,
//!   never returned.

use crate::service::course_service::CourseService;
use crate::service::group_service::GroupService;
use crate::service::{ServiceError, ServiceResult};
use log::{error, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::json;

pub mod auth;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const INVALID_BODY_MESSAGE: &str = "Request body must be a JSON object";
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Endpoints of the push API, relative to its mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    AddCourseMembers,
    RemoveCourseMembers,
    AddTutor,
    RemoveTutor,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    AddGroupMembers,
    RemoveGroupMembers,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::CreateCourse,
        Route::UpdateCourse,
        Route::DeleteCourse,
        Route::AddCourseMembers,
        Route::RemoveCourseMembers,
        Route::AddTutor,
        Route::RemoveTutor,
        Route::CreateGroup,
        Route::UpdateGroup,
        Route::DeleteGroup,
        Route::AddGroupMembers,
        Route::RemoveGroupMembers,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::CreateCourse => "create/course/",
            Self::UpdateCourse => "update/course/",
            Self::DeleteCourse => "delete/course/",
            Self::AddCourseMembers => "add/course/members/",
            Self::RemoveCourseMembers => "remove/course/members/",
            Self::AddTutor => "add/tutor/",
            Self::RemoveTutor => "remove/tutor/",
            Self::CreateGroup => "create/group/",
            Self::UpdateGroup => "update/group/",
            Self::DeleteGroup => "delete/group/",
            Self::AddGroupMembers => "add/group/members/",
            Self::RemoveGroupMembers => "remove/group/members/",
        }
    }

    /// Resolves a path; a single leading `/` is ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        Self::ALL.into_iter().find(|route| route.path() == path)
    }
}

/// Status code and JSON body text of one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn success(message: &str) -> Self {
        Self {
            status: STATUS_OK,
            body: json!({ "successMessage": message }).to_string(),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "errorMessage": message }).to_string(),
        }
    }

    /// Empty-bodied 403.
    pub fn forbidden() -> Self {
        Self {
            status: STATUS_FORBIDDEN,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Decodes `body` for `route`, runs the matching service call and encodes
/// the outcome.
pub fn handle(conn: &Connection, route: Route, body: &str) -> ApiResponse {
    let courses = CourseService::new(conn);
    let groups = GroupService::new(conn);

    let result = match route {
        Route::CreateCourse => dispatch(body, |request| courses.create_course(&request)),
        Route::UpdateCourse => dispatch(body, |request| courses.update_course(&request)),
        Route::DeleteCourse => dispatch(body, |request| courses.delete_course(&request)),
        Route::AddCourseMembers => {
            dispatch(body, |request| courses.add_course_members(&request))
        }
        Route::RemoveCourseMembers => {
            dispatch(body, |request| courses.remove_course_members(&request))
        }
        Route::AddTutor => dispatch(body, |request| courses.add_tutor(&request)),
        Route::RemoveTutor => dispatch(body, |request| courses.remove_tutor(&request)),
        Route::CreateGroup => dispatch(body, |request| groups.create_group(&request)),
        Route::UpdateGroup => dispatch(body, |request| groups.update_group(&request)),
        Route::DeleteGroup => dispatch(body, |request| groups.delete_group(&request)),
        Route::AddGroupMembers => dispatch(body, |request| groups.add_group_members(&request)),
        Route::RemoveGroupMembers => {
            dispatch(body, |request| groups.remove_group_members(&request))
        }
    };

    match result {
        Ok(message) => ApiResponse::success(message),
        Err(CallError::Body(err)) => {
            warn!(
                "event=api_call module=api status=rejected route={} reason=invalid_body error={err}",
                route.path()
            );
            ApiResponse::error(STATUS_BAD_REQUEST, INVALID_BODY_MESSAGE)
        }
        Err(CallError::Service(err)) if err.is_client_error() => {
            ApiResponse::error(STATUS_BAD_REQUEST, &err.to_string())
        }
        Err(CallError::Service(err)) => {
            error!(
                "event=api_call module=api status=error route={} error={err}",
                route.path()
            );
            ApiResponse::error(STATUS_INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

enum CallError {
    Body(serde_json::Error),
    Service(ServiceError),
}

fn dispatch<R, F>(body: &str, call: F) -> Result<&'static str, CallError>
where
    R: DeserializeOwned,
    F: FnOnce(R) -> ServiceResult<&'static str>,
{
    let request = serde_json::from_str(body).map_err(CallError::Body)?;
    call(request).map_err(CallError::Service)
}
