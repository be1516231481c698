//! Batch routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{BatchId, Error};
use reg_db::models::Batch;
use reg_db::queries::batches::{self, BatchChanges, NewBatch};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::ValidJson;
use crate::routes::parse_id;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BatchResponse {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub level: i64,
    pub description: String,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl BatchResponse {
    fn from_model(b: Batch) -> Self {
        Self {
            id: b.id.get(),
            name: b.name,
            start_date: b.start_date,
            end_date: b.end_date,
            level: b.level,
            description: b.description,
            remarks: b.remarks,
            created_at: b.created_at,
            modified_at: b.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateBatchRequest {
    pub name: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub level: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateBatchRequest {
    pub name: Option<String>,
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<String>>,
    pub level: Option<i64>,
    pub description: Option<String>,
    pub remarks: Option<String>,
}

/// GET /api/batches
#[utoipa::path(
    get,
    path = "/api/batches",
    responses((status = 200, description = "List batches", body = Vec<BatchResponse>))
)]
pub async fn list_batches(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<BatchResponse>>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let rows = batches::list_batches(&conn)?;
    Ok(Json(rows.into_iter().map(BatchResponse::from_model).collect()))
}

/// POST /api/batches
#[utoipa::path(
    post,
    path = "/api/batches",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = BatchResponse),
        (status = 400, description = "Invalid fields or duplicate name")
    )
)]
pub async fn create_batch(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), AppError> {
    let new = NewBatch {
        name: payload.name,
        start_date: payload.start_date,
        end_date: payload.end_date,
        level: payload.level,
        description: payload.description,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let batch = batches::create_batch(&conn, &new)?;
    Ok((StatusCode::CREATED, Json(BatchResponse::from_model(batch))))
}

/// GET /api/batches/{id}
#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    params(("id" = i64, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch found", body = BatchResponse),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn get_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<BatchResponse>, AppError> {
    let id: BatchId = parse_id(&id, "batch_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let batch = batches::get_batch(&conn, id)?.ok_or_else(|| Error::not_found("batch", id))?;
    Ok(Json(BatchResponse::from_model(batch)))
}

/// PUT /api/batches/{id}
#[utoipa::path(
    put,
    path = "/api/batches/{id}",
    params(("id" = i64, Path, description = "Batch ID")),
    request_body = UpdateBatchRequest,
    responses(
        (status = 200, description = "Batch updated", body = BatchResponse),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn update_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateBatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let id: BatchId = parse_id(&id, "batch_id")?;
    let changes = BatchChanges {
        name: payload.name,
        start_date: payload.start_date,
        end_date: payload.end_date,
        level: payload.level,
        description: payload.description,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let batch = batches::update_batch(&conn, id, &changes)?;
    Ok(Json(BatchResponse::from_model(batch)))
}

/// DELETE /api/batches/{id}
///
/// Student profiles and courses that referenced the batch keep existing with
/// their batch cleared.
#[utoipa::path(
    delete,
    path = "/api/batches/{id}",
    params(("id" = i64, Path, description = "Batch ID")),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 404, description = "Batch not found")
    )
)]
pub async fn delete_batch(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: BatchId = parse_id(&id, "batch_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    batches::delete_batch(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
