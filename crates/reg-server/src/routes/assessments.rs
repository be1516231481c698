//! Assessment routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use reg_core::{AssessmentId, EnrollmentId, Error};
use reg_db::models::Assessment;
use reg_db::queries::assessments::{self, AssessmentChanges, NewAssessment};

use crate::context::AppContext;
use crate::error::AppError;
use crate::extract::{ValidJson, ValidQuery};
use crate::routes::parse_id;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListAssessmentsParams {
    pub enrollment_id: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AssessmentResponse {
    pub id: i64,
    pub enrollment_id: i64,
    pub assessment_type: String,
    pub score: Option<f64>,
    pub total_score: Option<f64>,
    pub given_at: Option<String>,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl AssessmentResponse {
    fn from_model(a: Assessment) -> Self {
        Self {
            id: a.id.get(),
            enrollment_id: a.enrollment_id.get(),
            assessment_type: a.assessment_type,
            score: a.score,
            total_score: a.total_score,
            given_at: a.given_at,
            remarks: a.remarks,
            created_at: a.created_at,
            modified_at: a.modified_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateAssessmentRequest {
    pub enrollment_id: i64,
    pub assessment_type: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub given_at: Option<String>,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateAssessmentRequest {
    pub assessment_type: Option<String>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<f64>)]
    pub score: Option<Option<f64>>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<f64>)]
    pub total_score: Option<Option<f64>>,
    #[serde(default, deserialize_with = "reg_core::patch::double_option")]
    #[schema(value_type = Option<String>)]
    pub given_at: Option<Option<String>>,
    pub remarks: Option<String>,
}

/// GET /api/assessments
#[utoipa::path(
    get,
    path = "/api/assessments",
    params(ListAssessmentsParams),
    responses((status = 200, description = "List assessments", body = Vec<AssessmentResponse>))
)]
pub async fn list_assessments(
    State(ctx): State<AppContext>,
    ValidQuery(params): ValidQuery<ListAssessmentsParams>,
) -> Result<Json<Vec<AssessmentResponse>>, AppError> {
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let rows = assessments::list_assessments(&conn, params.enrollment_id.map(EnrollmentId::from))?;
    Ok(Json(rows.into_iter().map(AssessmentResponse::from_model).collect()))
}

/// POST /api/assessments
#[utoipa::path(
    post,
    path = "/api/assessments",
    request_body = CreateAssessmentRequest,
    responses(
        (status = 201, description = "Assessment recorded", body = AssessmentResponse),
        (status = 400, description = "Invalid scores"),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn create_assessment(
    State(ctx): State<AppContext>,
    ValidJson(payload): ValidJson<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentResponse>), AppError> {
    let new = NewAssessment {
        enrollment_id: EnrollmentId::from(payload.enrollment_id),
        assessment_type: payload.assessment_type,
        score: payload.score,
        total_score: payload.total_score,
        given_at: payload.given_at,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let assessment = assessments::create_assessment(&conn, &new)?;
    Ok((
        StatusCode::CREATED,
        Json(AssessmentResponse::from_model(assessment)),
    ))
}

/// GET /api/assessments/{id}
#[utoipa::path(
    get,
    path = "/api/assessments/{id}",
    params(("id" = i64, Path, description = "Assessment ID")),
    responses(
        (status = 200, description = "Assessment found", body = AssessmentResponse),
        (status = 404, description = "Assessment not found")
    )
)]
pub async fn get_assessment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let id: AssessmentId = parse_id(&id, "assessment_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let assessment = assessments::get_assessment(&conn, id)?
        .ok_or_else(|| Error::not_found("assessment", id))?;
    Ok(Json(AssessmentResponse::from_model(assessment)))
}

/// PUT /api/assessments/{id}
#[utoipa::path(
    put,
    path = "/api/assessments/{id}",
    params(("id" = i64, Path, description = "Assessment ID")),
    request_body = UpdateAssessmentRequest,
    responses(
        (status = 200, description = "Assessment updated", body = AssessmentResponse),
        (status = 400, description = "Invalid scores"),
        (status = 404, description = "Assessment not found")
    )
)]
pub async fn update_assessment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateAssessmentRequest>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let id: AssessmentId = parse_id(&id, "assessment_id")?;
    let changes = AssessmentChanges {
        assessment_type: payload.assessment_type,
        score: payload.score,
        total_score: payload.total_score,
        given_at: payload.given_at,
        remarks: payload.remarks,
    };
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    let assessment = assessments::update_assessment(&conn, id, &changes)?;
    Ok(Json(AssessmentResponse::from_model(assessment)))
}

/// DELETE /api/assessments/{id}
#[utoipa::path(
    delete,
    path = "/api/assessments/{id}",
    params(("id" = i64, Path, description = "Assessment ID")),
    responses(
        (status = 204, description = "Assessment deleted"),
        (status = 404, description = "Assessment not found")
    )
)]
pub async fn delete_assessment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: AssessmentId = parse_id(&id, "assessment_id")?;
    let conn = reg_db::pool::get_conn(&ctx.db)?;
    assessments::delete_assessment(&conn, id)?;
    Ok(StatusCode::NO_CONTENT)
}
