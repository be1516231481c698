//! User routes, including lookups by username and role assignment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{Error, RoleId, UserId};
use reg_db::models::{Role, User};
use reg_db::queries::{roles, users};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::roles::RoleResponse;
use crate::routes::{parse_id, MessageResponse};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone_number: String,
    pub is_active: bool,
    pub roles: Vec<RoleResponse>,
    pub created_at: String,
    pub modified_at: String,
}

impl UserResponse {
    fn from_model(user: User, roles: Vec<Role>) -> Self {
        Self {
            id: user.id.get(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            date_of_birth: user.date_of_birth,
            phone_number: user.phone_number,
            is_active: user.is_active,
            roles: roles.iter().map(RoleResponse::from_model).collect(),
            created_at: user.created_at,
            modified_at: user.modified_at,
        }
    }
}

/// Profile fields of a user; everything but the username.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct UserFieldsRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone_number: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(flatten)]
    pub fields: UserFieldsRequest,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// `null` clears the stored date.
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub date_of_birth: Option<Option<String>>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    fn into_changes(self) -> users::UserChanges {
        users::UserChanges {
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            phone_number: self.phone_number,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: i64,
}

fn new_user(username: String, fields: UserFieldsRequest) -> users::NewUser {
    users::NewUser {
        username,
        first_name: fields.first_name,
        last_name: fields.last_name,
        email: fields.email,
        date_of_birth: fields.date_of_birth,
        phone_number: fields.phone_number,
        is_active: fields.is_active.unwrap_or(true),
    }
}

fn with_roles(conn: &reg_db::pool::PooledConnection, user: User) -> Result<UserResponse, AppError> {
    let roles = roles::list_roles_for_user(conn, user.id)?;
    Ok(UserResponse::from_model(user, roles))
}

fn find_by_username(
    conn: &reg_db::pool::PooledConnection,
    username: &str,
) -> Result<User, AppError> {
    Ok(users::get_user_by_username(conn, username)?
        .ok_or_else(|| Error::not_found("user", username))?)
}

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List users", body = Vec<UserResponse>)
    )
)]
pub async fn list_users(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let all = users::list_users(&conn)?;
    let mut assigned = roles::roles_by_user(&conn)?;
    Ok(Json(
        all.into_iter()
            .map(|u| {
                let roles = assigned.remove(&u.id).unwrap_or_default();
                UserResponse::from_model(u, roles)
            })
            .collect(),
    ))
}

/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid or duplicate username")
    )
)]
pub async fn create_user(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = users::create_user(&conn, &new_user(payload.username, payload.fields))?;
    Ok((StatusCode::CREATED, Json(UserResponse::from_model(user, Vec::new()))))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = users::get_user(&conn, id)?.ok_or_else(|| Error::not_found("user", id))?;
    Ok(Json(with_roles(&conn, user)?))
}

/// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = users::update_user(&conn, id, &payload.into_changes())?;
    Ok(Json(with_roles(&conn, user)?))
}

/// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User and dependent records deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    users::delete_user(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// by username
// ---------------------------------------------------------------------------

/// GET /api/users/username/{username}
#[utoipa::path(
    get,
    path = "/api/users/username/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_username(
    State(ctx): State<AppContext>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = find_by_username(&conn, &username)?;
    Ok(Json(with_roles(&conn, user)?))
}

/// POST /api/users/username/{username}
#[utoipa::path(
    post,
    path = "/api/users/username/{username}",
    params(("username" = String, Path, description = "Username for the new user")),
    request_body = UserFieldsRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Duplicate username")
    )
)]
pub async fn create_user_with_username(
    State(ctx): State<AppContext>,
    Path(username): Path<String>,
    ValidJson(payload): ValidJson<UserFieldsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = users::create_user(&conn, &new_user(username, payload))?;
    Ok((StatusCode::CREATED, Json(UserResponse::from_model(user, Vec::new()))))
}

/// PUT /api/users/username/{username}
#[utoipa::path(
    put,
    path = "/api/users/username/{username}",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user_by_username(
    State(ctx): State<AppContext>,
    Path(username): Path<String>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = users::update_user_by_username(&conn, &username, &payload.into_changes())?;
    Ok(Json(with_roles(&conn, user)?))
}

/// DELETE /api/users/username/{username}
#[utoipa::path(
    delete,
    path = "/api/users/username/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user_by_username(
    State(ctx): State<AppContext>,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    users::delete_user_by_username(&conn, &username)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// roles
// ---------------------------------------------------------------------------

/// GET /api/users/{id}/roles
#[utoipa::path(
    get,
    path = "/api/users/{id}/roles",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Roles assigned to the user", body = Vec<RoleResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_roles(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    let id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    if users::get_user(&conn, id)?.is_none() {
        return Err(Error::not_found("user", id).into());
    }
    let roles = roles::list_roles_for_user(&conn, id)?;
    Ok(Json(roles.iter().map(RoleResponse::from_model).collect()))
}

fn assign(ctx: &AppContext, user_id: UserId, role_id: RoleId) -> Result<MessageResponse, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    roles::assign_role(&conn, user_id, role_id)?;
    let user = users::get_user(&conn, user_id)?.ok_or_else(|| Error::not_found("user", user_id))?;
    let role = roles::get_role(&conn, role_id)?.ok_or_else(|| Error::not_found("role", role_id))?;
    tracing::info!(user = %user.username, role = %role.name, "Role assigned");
    Ok(MessageResponse {
        message: format!("Role {} assigned to user {}", role.name, user.username),
    })
}

/// POST /api/users/{id}/roles
#[utoipa::path(
    post,
    path = "/api/users/{id}/roles",
    params(("id" = i64, Path, description = "User ID")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = MessageResponse),
        (status = 400, description = "Role already assigned"),
        (status = 404, description = "User or role not found")
    )
)]
pub async fn assign_role(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<AssignRoleRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    Ok(Json(assign(&ctx, user_id, RoleId::from(payload.role_id))?))
}

/// POST /api/users/{id}/roles/{role_id}
#[utoipa::path(
    post,
    path = "/api/users/{id}/roles/{role_id}",
    params(
        ("id" = i64, Path, description = "User ID"),
        ("role_id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role assigned", body = MessageResponse),
        (status = 400, description = "Role already assigned"),
        (status = 404, description = "User or role not found")
    )
)]
pub async fn assign_role_by_path(
    State(ctx): State<AppContext>,
    Path((id, role_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let role_id: RoleId = parse_id(&role_id, "role_id")?;
    Ok(Json(assign(&ctx, user_id, role_id)?))
}

/// DELETE /api/users/{id}/roles/{role_id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}/roles/{role_id}",
    params(
        ("id" = i64, Path, description = "User ID"),
        ("role_id" = i64, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role removed", body = MessageResponse),
        (status = 404, description = "Role not assigned to the user")
    )
)]
pub async fn remove_role(
    State(ctx): State<AppContext>,
    Path((id, role_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let role_id: RoleId = parse_id(&role_id, "role_id")?;

    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let user = users::get_user(&conn, user_id)?.ok_or_else(|| Error::not_found("user", user_id))?;
    let role = roles::get_role(&conn, role_id)?.ok_or_else(|| Error::not_found("role", role_id))?;
    roles::remove_role(&conn, user_id, role_id)?;

    Ok(Json(MessageResponse {
        message: format!("Role {} removed from user {}", role.name, user.username),
    }))
}
