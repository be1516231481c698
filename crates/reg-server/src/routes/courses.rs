//! Course routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{BatchId, CourseId, Error, SubjectId, UserId};
use reg_db::models::Course;
use reg_db::queries::courses::{self, CourseChanges, CourseFilter, NewCourse};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::routes::parse_id;

/// Query parameters for listing courses. Every filter is optional.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListCoursesParams {
    pub subject_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub semester: Option<i64>,
    pub year: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseResponse {
    pub id: i64,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub description: String,
    pub semester: i64,
    pub year: i64,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl CourseResponse {
    fn from_model(c: Course) -> Self {
        Self {
            id: c.id.get(),
            subject_id: c.subject_id.map(|v| v.get()),
            teacher_id: c.teacher_id.map(|v| v.get()),
            batch_id: c.batch_id.map(|v| v.get()),
            staff_id: c.staff_id.map(|v| v.get()),
            description: c.description,
            semester: c.semester,
            year: c.year,
            remarks: c.remarks,
            created_at: c.created_at,
            modified_at: c.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub batch_id: Option<i64>,
    #[serde(default)]
    pub staff_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    pub semester: i64,
    pub year: i64,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateCourseRequest {
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub subject_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub teacher_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub batch_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub staff_id: Option<Option<i64>>,
    pub description: Option<String>,
    pub semester: Option<i64>,
    pub year: Option<i64>,
    pub remarks: Option<String>,
}

fn nested<T: From<i64>>(v: Option<Option<i64>>) -> Option<Option<T>> {
    v.map(|inner| inner.map(T::from))
}

/// GET /api/courses
#[utoipa::path(
    get,
    path = "/api/courses",
    params(ListCoursesParams),
    responses((status = 200, description = "List courses", body = Vec<CourseResponse>))
)]
pub async fn list_courses(
    State(ctx): State<AppContext>,
    ValidQuery(params): ValidQuery<ListCoursesParams>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let filter = CourseFilter {
        subject_id: params.subject_id.map(SubjectId::from),
        batch_id: params.batch_id.map(BatchId::from),
        teacher_id: params.teacher_id.map(UserId::from),
        semester: params.semester,
        year: params.year,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let rows = courses::list_courses(&conn, &filter)?;
    Ok(Json(rows.into_iter().map(CourseResponse::from_model).collect()))
}

/// POST /api/courses
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Duplicate offering"),
        (status = 404, description = "Referenced subject, batch or profile not found")
    )
)]
pub async fn create_course(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let new = NewCourse {
        subject_id: payload.subject_id.map(SubjectId::from),
        teacher_id: payload.teacher_id.map(UserId::from),
        batch_id: payload.batch_id.map(BatchId::from),
        staff_id: payload.staff_id.map(UserId::from),
        description: payload.description,
        semester: payload.semester,
        year: payload.year,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let course = courses::create_course(&conn, &new)?;
    Ok((StatusCode::CREATED, Json(CourseResponse::from_model(course))))
}

/// GET /api/courses/{id}
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course found", body = CourseResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    let id: CourseId = parse_id(&id, "course_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let course = courses::get_course(&conn, id)?.ok_or_else(|| Error::not_found("course", id))?;
    Ok(Json(CourseResponse::from_model(course)))
}

/// PUT /api/courses/{id}
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Duplicate offering"),
        (status = 404, description = "Course or referenced row not found")
    )
)]
pub async fn update_course(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    let id: CourseId = parse_id(&id, "course_id")?;
    let changes = CourseChanges {
        subject_id: nested(payload.subject_id),
        teacher_id: nested(payload.teacher_id),
        batch_id: nested(payload.batch_id),
        staff_id: nested(payload.staff_id),
        description: payload.description,
        semester: payload.semester,
        year: payload.year,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let course = courses::update_course(&conn, id, &changes)?;
    Ok(Json(CourseResponse::from_model(course)))
}

/// DELETE /api/courses/{id}
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = i64, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted with its enrollments"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CourseId = parse_id(&id, "course_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    courses::delete_course(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
