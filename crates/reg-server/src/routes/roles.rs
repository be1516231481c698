//! Role routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{Error, RoleId};
use reg_db::models::Role;
use reg_db::queries::roles;

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::parse_id;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl RoleResponse {
    pub(crate) fn from_model(role: &Role) -> Self {
        Self {
            id: role.id.get(),
            name: role.name.clone(),
            description: role.description.clone(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    responses((status = 200, description = "List roles", body = Vec<RoleResponse>))
)]
pub async fn list_roles(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let roles = roles::list_roles(&conn)?;
    Ok(Json(roles.iter().map(RoleResponse::from_model).collect()))
}

/// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 400, description = "Invalid or duplicate name")
    )
)]
pub async fn create_role(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let role = roles::create_role(&conn, &payload.name, &payload.description)?;
    Ok((StatusCode::CREATED, Json(RoleResponse::from_model(&role))))
}

/// GET /api/roles/{id}
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = RoleResponse),
        (status = 404, description = "Role not found")
    )
)]
pub async fn get_role(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<RoleResponse>, AppError> {
    let id: RoleId = parse_id(&id, "role_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let role = roles::get_role(&conn, id)?.ok_or_else(|| Error::not_found("role", id))?;
    Ok(Json(RoleResponse::from_model(&role)))
}

/// PUT /api/roles/{id}
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(("id" = i64, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 404, description = "Role not found")
    )
)]
pub async fn update_role(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    let id: RoleId = parse_id(&id, "role_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let changes = roles::RoleChanges {
        name: payload.name,
        description: payload.description,
    };
    let role = roles::update_role(&conn, id, &changes)?;
    Ok(Json(RoleResponse::from_model(&role)))
}

/// DELETE /api/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted and unassigned"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn delete_role(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: RoleId = parse_id(&id, "role_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    roles::delete_role(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
