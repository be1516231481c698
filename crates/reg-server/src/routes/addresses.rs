//! Address routes for users and emergency contacts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{AddressId, EmergencyContactAddressId, EmergencyContactId, Error, UserId};
use reg_db::models::{Address, EmergencyContactAddress};
use reg_db::queries::addresses::{self, AddressChanges, AddressFields};
use reg_db::queries::{emergency_contacts, users};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::parse_id;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AddressResponse {
    pub id: i64,
    pub user_id: i64,
    pub street_address: String,
    pub woreda: i64,
    pub sub_city: String,
    pub city: String,
    pub country: String,
    pub created_at: String,
    pub modified_at: String,
}

impl AddressResponse {
    fn from_model(a: Address) -> Self {
        Self {
            id: a.id.get(),
            user_id: a.user_id.get(),
            street_address: a.street_address,
            woreda: a.woreda,
            sub_city: a.sub_city,
            city: a.city,
            country: a.country,
            created_at: a.created_at,
            modified_at: a.modified_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ContactAddressResponse {
    pub id: i64,
    pub emergency_contact_id: i64,
    pub street_address: String,
    pub woreda: i64,
    pub sub_city: String,
    pub city: String,
    pub country: String,
    pub created_at: String,
    pub modified_at: String,
}

impl ContactAddressResponse {
    fn from_model(a: EmergencyContactAddress) -> Self {
        Self {
            id: a.id.get(),
            emergency_contact_id: a.emergency_contact_id.get(),
            street_address: a.street_address,
            woreda: a.woreda,
            sub_city: a.sub_city,
            city: a.city,
            country: a.country,
            created_at: a.created_at,
            modified_at: a.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddressRequest {
    pub street_address: String,
    pub woreda: i64,
    pub sub_city: String,
    pub city: String,
    pub country: String,
}

impl From<AddressRequest> for AddressFields {
    fn from(r: AddressRequest) -> Self {
        Self {
            street_address: r.street_address,
            woreda: r.woreda,
            sub_city: r.sub_city,
            city: r.city,
            country: r.country,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateAddressRequest {
    pub street_address: Option<String>,
    pub woreda: Option<i64>,
    pub sub_city: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl From<UpdateAddressRequest> for AddressChanges {
    fn from(r: UpdateAddressRequest) -> Self {
        Self {
            street_address: r.street_address,
            woreda: r.woreda,
            sub_city: r.sub_city,
            city: r.city,
            country: r.country,
        }
    }
}

// ---------------------------------------------------------------------------
// user addresses
// ---------------------------------------------------------------------------

/// GET /api/users/{id}/addresses
#[utoipa::path(
    get,
    path = "/api/users/{id}/addresses",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Addresses of the user", body = Vec<AddressResponse>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_user_addresses(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AddressResponse>>, AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    if users::get_user(&conn, user_id)?.is_none() {
        return Err(Error::not_found("user", user_id).into());
    }
    let rows = addresses::list_addresses_for_user(&conn, user_id)?;
    Ok(Json(rows.into_iter().map(AddressResponse::from_model).collect()))
}

/// POST /api/users/{id}/addresses
#[utoipa::path(
    post,
    path = "/api/users/{id}/addresses",
    params(("id" = i64, Path, description = "User ID")),
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address created", body = AddressResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn create_user_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<AddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>), AppError> {
    let user_id: UserId = parse_id(&id, "user_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let address = addresses::create_address(&conn, user_id, &payload.into())?;
    Ok((StatusCode::CREATED, Json(AddressResponse::from_model(address))))
}

/// GET /api/addresses/{id}
#[utoipa::path(
    get,
    path = "/api/addresses/{id}",
    params(("id" = i64, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address found", body = AddressResponse),
        (status = 404, description = "Address not found")
    )
)]
pub async fn get_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<AddressResponse>, AppError> {
    let id: AddressId = parse_id(&id, "address_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let address =
        addresses::get_address(&conn, id)?.ok_or_else(|| Error::not_found("address", id))?;
    Ok(Json(AddressResponse::from_model(address)))
}

/// PUT /api/addresses/{id}
#[utoipa::path(
    put,
    path = "/api/addresses/{id}",
    params(("id" = i64, Path, description = "Address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = AddressResponse),
        (status = 404, description = "Address not found")
    )
)]
pub async fn update_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateAddressRequest>,
) -> Result<Json<AddressResponse>, AppError> {
    let id: AddressId = parse_id(&id, "address_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let address = addresses::update_address(&conn, id, payload.into())?;
    Ok(Json(AddressResponse::from_model(address)))
}

/// DELETE /api/addresses/{id}
#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(("id" = i64, Path, description = "Address ID")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, description = "Address not found")
    )
)]
pub async fn delete_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: AddressId = parse_id(&id, "address_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    addresses::delete_address(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// emergency contact addresses
// ---------------------------------------------------------------------------

/// GET /api/emergency-contacts/{id}/addresses
#[utoipa::path(
    get,
    path = "/api/emergency-contacts/{id}/addresses",
    params(("id" = i64, Path, description = "Emergency contact ID")),
    responses(
        (status = 200, description = "Addresses of the contact", body = Vec<ContactAddressResponse>),
        (status = 404, description = "Emergency contact not found")
    )
)]
pub async fn list_contact_addresses(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ContactAddressResponse>>, AppError> {
    let contact_id: EmergencyContactId = parse_id(&id, "emergency_contact_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    if emergency_contacts::get_emergency_contact(&conn, contact_id)?.is_none() {
        return Err(Error::not_found("emergency contact", contact_id).into());
    }
    let rows = addresses::list_contact_addresses(&conn, contact_id)?;
    Ok(Json(rows.into_iter().map(ContactAddressResponse::from_model).collect()))
}

/// POST /api/emergency-contacts/{id}/addresses
#[utoipa::path(
    post,
    path = "/api/emergency-contacts/{id}/addresses",
    params(("id" = i64, Path, description = "Emergency contact ID")),
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address created", body = ContactAddressResponse),
        (status = 404, description = "Emergency contact not found")
    )
)]
pub async fn create_contact_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<AddressRequest>,
) -> Result<(StatusCode, Json<ContactAddressResponse>), AppError> {
    let contact_id: EmergencyContactId = parse_id(&id, "emergency_contact_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let address = addresses::create_contact_address(&conn, contact_id, &payload.into())?;
    Ok((StatusCode::CREATED, Json(ContactAddressResponse::from_model(address))))
}

/// GET /api/emergency-contact-addresses/{id}
#[utoipa::path(
    get,
    path = "/api/emergency-contact-addresses/{id}",
    params(("id" = i64, Path, description = "Emergency contact address ID")),
    responses(
        (status = 200, description = "Address found", body = ContactAddressResponse),
        (status = 404, description = "Address not found")
    )
)]
pub async fn get_contact_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ContactAddressResponse>, AppError> {
    let id: EmergencyContactAddressId = parse_id(&id, "address_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let address = addresses::get_contact_address(&conn, id)?
        .ok_or_else(|| Error::not_found("emergency contact address", id))?;
    Ok(Json(ContactAddressResponse::from_model(address)))
}

/// PUT /api/emergency-contact-addresses/{id}
#[utoipa::path(
    put,
    path = "/api/emergency-contact-addresses/{id}",
    params(("id" = i64, Path, description = "Emergency contact address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = ContactAddressResponse),
        (status = 404, description = "Address not found")
    )
)]
pub async fn update_contact_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateAddressRequest>,
) -> Result<Json<ContactAddressResponse>, AppError> {
    let id: EmergencyContactAddressId = parse_id(&id, "address_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let address = addresses::update_contact_address(&conn, id, payload.into())?;
    Ok(Json(ContactAddressResponse::from_model(address)))
}

/// DELETE /api/emergency-contact-addresses/{id}
#[utoipa::path(
    delete,
    path = "/api/emergency-contact-addresses/{id}",
    params(("id" = i64, Path, description = "Emergency contact address ID")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, description = "Address not found")
    )
)]
pub async fn delete_contact_address(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: EmergencyContactAddressId = parse_id(&id, "address_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    addresses::delete_contact_address(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
