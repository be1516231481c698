//! Enrollment routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{CourseId, EnrollmentId, Error, UserId};
use reg_db::models::Enrollment;
use reg_db::queries::enrollments::{self, EnrollmentChanges, EnrollmentFilter, NewEnrollment};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::routes::parse_id;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListEnrollmentsParams {
    pub student_id: Option<i64>,
    pub course_id: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EnrollmentResponse {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub enrollment_date: Option<String>,
    pub status: String,
    pub grade: String,
    pub rank: Option<i64>,
    pub created_at: String,
    pub modified_at: String,
}

impl EnrollmentResponse {
    fn from_model(e: Enrollment) -> Self {
        Self {
            id: e.id.get(),
            student_id: e.student_id.get(),
            course_id: e.course_id.get(),
            enrollment_date: e.enrollment_date,
            status: e.status,
            grade: e.grade,
            rank: e.rank,
            created_at: e.created_at,
            modified_at: e.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateEnrollmentRequest {
    pub student_id: i64,
    pub course_id: i64,
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub rank: Option<i64>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateEnrollmentRequest {
    pub student_id: Option<i64>,
    pub course_id: Option<i64>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub enrollment_date: Option<Option<String>>,
    pub status: Option<String>,
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub rank: Option<Option<i64>>,
}

/// GET /api/enrollments
#[utoipa::path(
    get,
    path = "/api/enrollments",
    params(ListEnrollmentsParams),
    responses((status = 200, description = "List enrollments", body = Vec<EnrollmentResponse>))
)]
pub async fn list_enrollments(
    State(ctx): State<AppContext>,
    ValidQuery(params): ValidQuery<ListEnrollmentsParams>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    let filter = EnrollmentFilter {
        student_id: params.student_id.map(UserId::from),
        course_id: params.course_id.map(CourseId::from),
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let rows = enrollments::list_enrollments(&conn, &filter)?;
    Ok(Json(rows.into_iter().map(EnrollmentResponse::from_model).collect()))
}

/// POST /api/enrollments
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentResponse),
        (status = 400, description = "Invalid fields or student already enrolled"),
        (status = 404, description = "Student profile or course not found")
    )
)]
pub async fn create_enrollment(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), AppError> {
    let new = NewEnrollment {
        enrollment_date: payload.enrollment_date,
        status: payload.status,
        grade: payload.grade,
        rank: payload.rank,
        ..NewEnrollment::new(
            UserId::from(payload.student_id),
            CourseId::from(payload.course_id),
        )
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let enrollment = enrollments::create_enrollment(&conn, &new)?;
    Ok((
        StatusCode::CREATED,
        Json(EnrollmentResponse::from_model(enrollment)),
    ))
}

/// GET /api/enrollments/{id}
#[utoipa::path(
    get,
    path = "/api/enrollments/{id}",
    params(("id" = i64, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment found", body = EnrollmentResponse),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn get_enrollment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let id: EnrollmentId = parse_id(&id, "enrollment_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let enrollment = enrollments::get_enrollment(&conn, id)?
        .ok_or_else(|| Error::not_found("enrollment", id))?;
    Ok(Json(EnrollmentResponse::from_model(enrollment)))
}

/// PUT /api/enrollments/{id}
#[utoipa::path(
    put,
    path = "/api/enrollments/{id}",
    params(("id" = i64, Path, description = "Enrollment ID")),
    request_body = UpdateEnrollmentRequest,
    responses(
        (status = 200, description = "Enrollment updated", body = EnrollmentResponse),
        (status = 400, description = "Invalid fields or duplicate pair"),
        (status = 404, description = "Enrollment or referenced row not found")
    )
)]
pub async fn update_enrollment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateEnrollmentRequest>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let id: EnrollmentId = parse_id(&id, "enrollment_id")?;
    let changes = EnrollmentChanges {
        student_id: payload.student_id.map(UserId::from),
        course_id: payload.course_id.map(CourseId::from),
        enrollment_date: payload.enrollment_date,
        status: payload.status,
        grade: payload.grade,
        rank: payload.rank,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let enrollment = enrollments::update_enrollment(&conn, id, &changes)?;
    Ok(Json(EnrollmentResponse::from_model(enrollment)))
}

/// DELETE /api/enrollments/{id}
#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = i64, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment deleted with its assessments"),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn delete_enrollment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: EnrollmentId = parse_id(&id, "enrollment_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    enrollments::delete_enrollment(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
