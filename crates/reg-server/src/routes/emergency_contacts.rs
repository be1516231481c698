//! Emergency contact routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{EmergencyContactId, Error, UserId};
use reg_db::models::EmergencyContact;
use reg_db::queries::emergency_contacts::{self, EmergencyContactChanges, NewEmergencyContact};
use reg_db::queries::users;

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::parse_id;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EmergencyContactResponse {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl EmergencyContactResponse {
    fn from_model(c: EmergencyContact) -> Self {
        Self {
            id: c.id.get(),
            user_id: c.user_id.get(),
            first_name: c.first_name,
            last_name: c.last_name,
            relationship: c.relationship,
            phone_number: c.phone_number,
            email: c.email,
            created_at: c.created_at,
            modified_at: c.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateEmergencyContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub phone_number: String,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateEmergencyContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub relationship: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
}

/// GET /api/users/{id}/emergency-contacts
#[utoipa::path(
    get,
    path = "/api/users/{id}/emergency-contacts",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Emergency contacts of the user", body = Vec<EmergencyContactResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_for_user(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EmergencyContactResponse>>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    if users::get_user(&conn, user_id)?.is_none() {
        return Err(Error::not_found("user", user_id).into());
    }
    let contacts = emergency_contacts::list_for_user(&conn, user_id)?;
    Ok(Json(
        contacts
            .into_iter()
            .map(EmergencyContactResponse::from_model)
            .collect(),
    ))
}

/// POST /api/users/{id}/emergency-contacts
#[utoipa::path(
    post,
    path = "/api/users/{id}/emergency-contacts",
    params(("id" = i64, Path, description = "User ID")),
    request_body = CreateEmergencyContactRequest,
    responses(
        (status = 201, description = "Emergency contact created", body = EmergencyContactResponse),
        (status = 400, description = "Invalid fields or duplicate phone number"),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_emergency_contact(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CreateEmergencyContactRequest>,
) -> Result<(StatusCode, Json<EmergencyContactResponse>), AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let new = NewEmergencyContact {
        first_name: payload.first_name,
        last_name: payload.last_name,
        relationship: payload.relationship,
        phone_number: payload.phone_number,
        email: payload.email,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let contact = emergency_contacts::create_emergency_contact(&conn, user_id, &new)?;
    Ok((
        StatusCode::CREATED,
        Json(EmergencyContactResponse::from_model(contact)),
    ))
}

/// GET /api/emergency-contacts/{id}
#[utoipa::path(
    get,
    path = "/api/emergency-contacts/{id}",
    params(("id" = i64, Path, description = "Emergency contact ID")),
    responses(
        (status = 200, description = "Emergency contact found", body = EmergencyContactResponse),
        (status = 404, description = "Emergency contact not found")
    )
)]
pub async fn get_emergency_contact(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<EmergencyContactResponse>, AppError> {
    let id: EmergencyContactId = parse_id(&id, "emergency_contact_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let contact = emergency_contacts::get_emergency_contact(&conn, id)?
        .ok_or_else(|| Error::not_found("emergency contact", id))?;
    Ok(Json(EmergencyContactResponse::from_model(contact)))
}

/// PUT /api/emergency-contacts/{id}
#[utoipa::path(
    put,
    path = "/api/emergency-contacts/{id}",
    params(("id" = i64, Path, description = "Emergency contact ID")),
    request_body = UpdateEmergencyContactRequest,
    responses(
        (status = 200, description = "Emergency contact updated", body = EmergencyContactResponse),
        (status = 404, description = "Emergency contact not found")
    )
)]
pub async fn update_emergency_contact(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateEmergencyContactRequest>,
) -> Result<Json<EmergencyContactResponse>, AppError> {
    let id: EmergencyContactId = parse_id(&id, "emergency_contact_id")?;
    let changes = EmergencyContactChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        relationship: payload.relationship,
        phone_number: payload.phone_number,
        email: payload.email,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let contact = emergency_contacts::update_emergency_contact(&conn, id, &changes)?;
    Ok(Json(EmergencyContactResponse::from_model(contact)))
}

/// DELETE /api/emergency-contacts/{id}
#[utoipa::path(
    delete,
    path = "/api/emergency-contacts/{id}",
    params(("id" = i64, Path, description = "Emergency contact ID")),
    responses(
        (status = 204, description = "Emergency contact and its addresses deleted"),
        (status = 404, description = "Emergency contact not found")
    )
)]
pub async fn delete_emergency_contact(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: EmergencyContactId = parse_id(&id, "emergency_contact_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    emergency_contacts::delete_emergency_contact(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
