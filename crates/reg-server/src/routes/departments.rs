//! Department routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{DepartmentId, Error};
use reg_db::models::Department;
use reg_db::queries::departments::{self, DepartmentChanges};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::parse_id;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DepartmentResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

impl DepartmentResponse {
    fn from_model(d: Department) -> Self {
        Self {
            id: d.id.get(),
            name: d.name,
            description: d.description,
            created_at: d.created_at,
            modified_at: d.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateDepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// GET /api/departments
#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "List departments", body = Vec<DepartmentResponse>))
)]
pub async fn list_departments(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<DepartmentResponse>>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let rows = departments::list_departments(&conn)?;
    Ok(Json(rows.into_iter().map(DepartmentResponse::from_model).collect()))
}

/// POST /api/departments
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Invalid or duplicate name")
    )
)]
pub async fn create_department(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>), AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let dept = departments::create_department(&conn, &payload.name, &payload.description)?;
    Ok((StatusCode::CREATED, Json(DepartmentResponse::from_model(dept))))
}

/// GET /api/departments/{id}
#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = DepartmentResponse),
        (status = 404, description = "Department not found")
    )
)]
pub async fn get_department(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DepartmentResponse>, AppError> {
    let id: DepartmentId = parse_id(&id, "department_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let dept = departments::get_department(&conn, id)?
        .ok_or_else(|| Error::not_found("department", id))?;
    Ok(Json(DepartmentResponse::from_model(dept)))
}

/// PUT /api/departments/{id}
#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 404, description = "Department not found")
    )
)]
pub async fn update_department(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateDepartmentRequest>,
) -> Result<Json<DepartmentResponse>, AppError> {
    let id: DepartmentId = parse_id(&id, "department_id")?;
    let changes = DepartmentChanges {
        name: payload.name,
        description: payload.description,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let dept = departments::update_department(&conn, id, &changes)?;
    Ok(Json(DepartmentResponse::from_model(dept)))
}

/// DELETE /api/departments/{id}
#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = i64, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted, subjects detached"),
        (status = 404, description = "Department not found")
    )
)]
pub async fn delete_department(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: DepartmentId = parse_id(&id, "department_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    departments::delete_department(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
