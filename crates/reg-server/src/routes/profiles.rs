//! Student, teacher and staff profile routes, keyed by the owning user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{BatchId, Error, UserId};
use reg_db::models::{EmployeeProfile, StudentProfile};
use reg_db::queries::profiles::{
    self, EmployeeProfileChanges, NewEmployeeProfile, NewStudentProfile, ProfileKind,
    StudentProfileChanges,
};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::parse_id;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StudentProfileResponse {
    pub user_id: i64,
    pub batch_id: Option<i64>,
    pub joined_at: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl StudentProfileResponse {
    fn from_model(p: StudentProfile) -> Self {
        Self {
            user_id: p.user_id.get(),
            batch_id: p.batch_id.map(|b| b.get()),
            joined_at: p.joined_at,
            created_at: p.created_at,
            modified_at: p.modified_at,
        }
    }
}

/// Shared body for teacher and staff profiles.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EmployeeProfileResponse {
    pub user_id: i64,
    pub start_date: Option<String>,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl EmployeeProfileResponse {
    fn from_model(p: EmployeeProfile) -> Self {
        Self {
            user_id: p.user_id.get(),
            start_date: p.start_date,
            remarks: p.remarks,
            created_at: p.created_at,
            modified_at: p.modified_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct CreateStudentProfileRequest {
    pub batch_id: Option<i64>,
    pub joined_at: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateStudentProfileRequest {
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub batch_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub joined_at: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct CreateEmployeeProfileRequest {
    pub start_date: Option<String>,
    pub remarks: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateEmployeeProfileRequest {
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub start_date: Option<Option<String>>,
    pub remarks: Option<String>,
}

// ---------------------------------------------------------------------------
// student
// ---------------------------------------------------------------------------

/// GET /api/users/{id}/student-profile
#[utoipa::path(
    get,
    path = "/api/users/{id}/student-profile",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Student profile", body = StudentProfileResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_student_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let profile = profiles::get_student_profile(&conn, user_id)?
        .ok_or_else(|| Error::not_found("student profile", user_id))?;
    Ok(Json(StudentProfileResponse::from_model(profile)))
}

/// POST /api/users/{id}/student-profile
#[utoipa::path(
    post,
    path = "/api/users/{id}/student-profile",
    params(("id" = i64, Path, description = "User ID")),
    request_body = CreateStudentProfileRequest,
    responses(
        (status = 201, description = "Student profile created", body = StudentProfileResponse),
        (status = 400, description = "Profile already exists"),
        (status = 404, description = "User or batch not found")
    )
)]
pub async fn create_student_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CreateStudentProfileRequest>,
) -> Result<(StatusCode, Json<StudentProfileResponse>), AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let new = NewStudentProfile {
        batch_id: payload.batch_id.map(BatchId::from),
        joined_at: payload.joined_at,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let profile = profiles::create_student_profile(&conn, user_id, &new)?;
    Ok((
        StatusCode::CREATED,
        Json(StudentProfileResponse::from_model(profile)),
    ))
}

/// PUT /api/users/{id}/student-profile
#[utoipa::path(
    put,
    path = "/api/users/{id}/student-profile",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateStudentProfileRequest,
    responses(
        (status = 200, description = "Student profile updated", body = StudentProfileResponse),
        (status = 404, description = "Profile or batch not found")
    )
)]
pub async fn update_student_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateStudentProfileRequest>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let changes = StudentProfileChanges {
        batch_id: payload.batch_id.map(|b| b.map(BatchId::from)),
        joined_at: payload.joined_at,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let profile = profiles::update_student_profile(&conn, user_id, &changes)?;
    Ok(Json(StudentProfileResponse::from_model(profile)))
}

/// DELETE /api/users/{id}/student-profile
#[utoipa::path(
    delete,
    path = "/api/users/{id}/student-profile",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Student profile deleted"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn delete_student_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    profiles::delete_student_profile(&conn, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// teacher and staff
// ---------------------------------------------------------------------------

fn label(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::Teacher => "teacher profile",
        ProfileKind::Staff => "staff profile",
    }
}

fn get_employee(
    ctx: &AppContext,
    kind: ProfileKind,
    raw_id: &str,
) -> Result<EmployeeProfileResponse, AppError> {
    let user_id: UserId = parse_id(raw_id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let profile = profiles::get_employee_profile(&conn, kind, user_id)?
        .ok_or_else(|| Error::not_found(label(kind), user_id))?;
    Ok(EmployeeProfileResponse::from_model(profile))
}

fn create_employee(
    ctx: &AppContext,
    kind: ProfileKind,
    raw_id: &str,
    payload: CreateEmployeeProfileRequest,
) -> Result<(StatusCode, Json<EmployeeProfileResponse>), AppError> {
    let user_id: UserId = parse_id(raw_id, "user_id")?;
    let new = NewEmployeeProfile {
        start_date: payload.start_date,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let profile = profiles::create_employee_profile(&conn, kind, user_id, &new)?;
    Ok((
        StatusCode::CREATED,
        Json(EmployeeProfileResponse::from_model(profile)),
    ))
}

fn update_employee(
    ctx: &AppContext,
    kind: ProfileKind,
    raw_id: &str,
    payload: UpdateEmployeeProfileRequest,
) -> Result<Json<EmployeeProfileResponse>, AppError> {
    let user_id: UserId = parse_id(raw_id, "user_id")?;
    let changes = EmployeeProfileChanges {
        start_date: payload.start_date,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let profile = profiles::update_employee_profile(&conn, kind, user_id, &changes)?;
    Ok(Json(EmployeeProfileResponse::from_model(profile)))
}

fn delete_employee(ctx: &AppContext, kind: ProfileKind, raw_id: &str) -> Result<StatusCode, AppError> {
    let user_id: UserId = parse_id(raw_id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    profiles::delete_employee_profile(&conn, kind, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/{id}/teacher-profile
#[utoipa::path(
    get,
    path = "/api/users/{id}/teacher-profile",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Teacher profile", body = EmployeeProfileResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_teacher_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeProfileResponse>, AppError> {
    get_employee(&ctx, ProfileKind::Teacher, &id).map(Json)
}

/// POST /api/users/{id}/teacher-profile
#[utoipa::path(
    post,
    path = "/api/users/{id}/teacher-profile",
    params(("id" = i64, Path, description = "User ID")),
    request_body = CreateEmployeeProfileRequest,
    responses(
        (status = 201, description = "Teacher profile created", body = EmployeeProfileResponse),
        (status = 400, description = "Profile already exists"),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_teacher_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CreateEmployeeProfileRequest>,
) -> Result<(StatusCode, Json<EmployeeProfileResponse>), AppError> {
    create_employee(&ctx, ProfileKind::Teacher, &id, payload)
}

/// PUT /api/users/{id}/teacher-profile
#[utoipa::path(
    put,
    path = "/api/users/{id}/teacher-profile",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateEmployeeProfileRequest,
    responses(
        (status = 200, description = "Teacher profile updated", body = EmployeeProfileResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_teacher_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateEmployeeProfileRequest>,
) -> Result<Json<EmployeeProfileResponse>, AppError> {
    update_employee(&ctx, ProfileKind::Teacher, &id, payload)
}

/// DELETE /api/users/{id}/teacher-profile
#[utoipa::path(
    delete,
    path = "/api/users/{id}/teacher-profile",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Teacher profile deleted, course links cleared"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn delete_teacher_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_employee(&ctx, ProfileKind::Teacher, &id)
}

/// GET /api/users/{id}/staff-profile
#[utoipa::path(
    get,
    path = "/api/users/{id}/staff-profile",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Staff profile", body = EmployeeProfileResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_staff_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeProfileResponse>, AppError> {
    get_employee(&ctx, ProfileKind::Staff, &id).map(Json)
}

/// POST /api/users/{id}/staff-profile
#[utoipa::path(
    post,
    path = "/api/users/{id}/staff-profile",
    params(("id" = i64, Path, description = "User ID")),
    request_body = CreateEmployeeProfileRequest,
    responses(
        (status = 201, description = "Staff profile created", body = EmployeeProfileResponse),
        (status = 400, description = "Profile already exists"),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_staff_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CreateEmployeeProfileRequest>,
) -> Result<(StatusCode, Json<EmployeeProfileResponse>), AppError> {
    create_employee(&ctx, ProfileKind::Staff, &id, payload)
}

/// PUT /api/users/{id}/staff-profile
#[utoipa::path(
    put,
    path = "/api/users/{id}/staff-profile",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateEmployeeProfileRequest,
    responses(
        (status = 200, description = "Staff profile updated", body = EmployeeProfileResponse),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_staff_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateEmployeeProfileRequest>,
) -> Result<Json<EmployeeProfileResponse>, AppError> {
    update_employee(&ctx, ProfileKind::Staff, &id, payload)
}

/// DELETE /api/users/{id}/staff-profile
#[utoipa::path(
    delete,
    path = "/api/users/{id}/staff-profile",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Staff profile deleted, course links cleared"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn delete_staff_profile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_employee(&ctx, ProfileKind::Staff, &id)
}
