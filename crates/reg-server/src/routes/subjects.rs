//! Subject routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{DepartmentId, Error, SubjectId};
use reg_db::models::Subject;
use reg_db::queries::subjects::{self, NewSubject, SubjectChanges};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::routes::parse_id;

/// Query parameters for listing subjects.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListSubjectsParams {
    pub department_id: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubjectResponse {
    pub id: i64,
    pub department_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

impl SubjectResponse {
    fn from_model(s: Subject) -> Self {
        Self {
            id: s.id.get(),
            department_id: s.department_id.map(|d| d.get()),
            name: s.name,
            description: s.description,
            created_at: s.created_at,
            modified_at: s.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateSubjectRequest {
    pub name: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<i64>)]
    pub department_id: Option<Option<i64>>,
    pub description: Option<String>,
}

/// GET /api/subjects
#[utoipa::path(
    get,
    path = "/api/subjects",
    params(ListSubjectsParams),
    responses((status = 200, description = "List subjects", body = Vec<SubjectResponse>))
)]
pub async fn list_subjects(
    State(ctx): State<AppContext>,
    ValidQuery(params): ValidQuery<ListSubjectsParams>,
) -> Result<Json<Vec<SubjectResponse>>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let rows = subjects::list_subjects(&conn, params.department_id.map(DepartmentId::from))?;
    Ok(Json(rows.into_iter().map(SubjectResponse::from_model).collect()))
}

/// POST /api/subjects
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Invalid or duplicate name"),
        (status = 404, description = "Department not found")
    )
)]
pub async fn create_subject(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<SubjectResponse>), AppError> {
    let new = NewSubject {
        department_id: payload.department_id.map(DepartmentId::from),
        name: payload.name,
        description: payload.description,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let subject = subjects::create_subject(&conn, &new)?;
    Ok((StatusCode::CREATED, Json(SubjectResponse::from_model(subject))))
}

/// GET /api/subjects/{id}
#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject found", body = SubjectResponse),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn get_subject(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<SubjectResponse>, AppError> {
    let id: SubjectId = parse_id(&id, "subject_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let subject = subjects::get_subject(&conn, id)?.ok_or_else(|| Error::not_found("subject", id))?;
    Ok(Json(SubjectResponse::from_model(subject)))
}

/// PUT /api/subjects/{id}
#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 404, description = "Subject or department not found")
    )
)]
pub async fn update_subject(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateSubjectRequest>,
) -> Result<Json<SubjectResponse>, AppError> {
    let id: SubjectId = parse_id(&id, "subject_id")?;
    let changes = SubjectChanges {
        department_id: payload.department_id.map(|d| d.map(DepartmentId::from)),
        name: payload.name,
        description: payload.description,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let subject = subjects::update_subject(&conn, id, &changes)?;
    Ok(Json(SubjectResponse::from_model(subject)))
}

/// DELETE /api/subjects/{id}
#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted, courses detached"),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn delete_subject(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: SubjectId = parse_id(&id, "subject_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    subjects::delete_subject(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
