//! Axum router construction.
//!
//! Builds the full application router with every resource group, the admin
//! gate on `/api`, and the OpenAPI document served under `/api-docs`.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::context::AppContext;
use crate::middleware::admin::admin_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::get_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::users::get_user_by_username,
        routes::users::create_user_with_username,
        routes::users::update_user_by_username,
        routes::users::delete_user_by_username,
        routes::users::list_user_roles,
        routes::users::assign_role,
        routes::users::assign_role_by_path,
        routes::users::remove_role,
        routes::roles::list_roles,
        routes::roles::create_role,
        routes::roles::get_role,
        routes::roles::update_role,
        routes::roles::delete_role,
        routes::addresses::list_user_addresses,
        routes::addresses::create_user_address,
        routes::addresses::get_address,
        routes::addresses::update_address,
        routes::addresses::delete_address,
        routes::addresses::list_contact_addresses,
        routes::addresses::create_contact_address,
        routes::addresses::get_contact_address,
        routes::addresses::update_contact_address,
        routes::addresses::delete_contact_address,
        routes::emergency_contacts::list_for_user,
        routes::emergency_contacts::create_emergency_contact,
        routes::emergency_contacts::get_emergency_contact,
        routes::emergency_contacts::update_emergency_contact,
        routes::emergency_contacts::delete_emergency_contact,
        routes::profiles::get_student_profile,
        routes::profiles::create_student_profile,
        routes::profiles::update_student_profile,
        routes::profiles::delete_student_profile,
        routes::profiles::get_teacher_profile,
        routes::profiles::create_teacher_profile,
        routes::profiles::update_teacher_profile,
        routes::profiles::delete_teacher_profile,
        routes::profiles::get_staff_profile,
        routes::profiles::create_staff_profile,
        routes::profiles::update_staff_profile,
        routes::profiles::delete_staff_profile,
        routes::batches::list_batches,
        routes::batches::create_batch,
        routes::batches::get_batch,
        routes::batches::update_batch,
        routes::batches::delete_batch,
        routes::departments::list_departments,
        routes::departments::create_department,
        routes::departments::get_department,
        routes::departments::update_department,
        routes::departments::delete_department,
        routes::subjects::list_subjects,
        routes::subjects::create_subject,
        routes::subjects::get_subject,
        routes::subjects::update_subject,
        routes::subjects::delete_subject,
        routes::courses::list_courses,
        routes::courses::create_course,
        routes::courses::get_course,
        routes::courses::update_course,
        routes::courses::delete_course,
        routes::enrollments::list_enrollments,
        routes::enrollments::create_enrollment,
        routes::enrollments::get_enrollment,
        routes::enrollments::update_enrollment,
        routes::enrollments::delete_enrollment,
        routes::assessments::list_assessments,
        routes::assessments::create_assessment,
        routes::assessments::get_assessment,
        routes::assessments::update_assessment,
        routes::assessments::delete_assessment,
    ),
    components(schemas(
        routes::MessageResponse,
        routes::health::HealthResponse,
        routes::users::UserResponse,
        routes::users::UserFieldsRequest,
        routes::users::CreateUserRequest,
        routes::users::UpdateUserRequest,
        routes::users::AssignRoleRequest,
        routes::roles::RoleResponse,
        routes::roles::CreateRoleRequest,
        routes::roles::UpdateRoleRequest,
        routes::addresses::AddressResponse,
        routes::addresses::ContactAddressResponse,
        routes::addresses::AddressRequest,
        routes::addresses::UpdateAddressRequest,
        routes::emergency_contacts::EmergencyContactResponse,
        routes::emergency_contacts::CreateEmergencyContactRequest,
        routes::emergency_contacts::UpdateEmergencyContactRequest,
        routes::profiles::StudentProfileResponse,
        routes::profiles::EmployeeProfileResponse,
        routes::profiles::CreateStudentProfileRequest,
        routes::profiles::UpdateStudentProfileRequest,
        routes::profiles::CreateEmployeeProfileRequest,
        routes::profiles::UpdateEmployeeProfileRequest,
        routes::batches::BatchResponse,
        routes::batches::CreateBatchRequest,
        routes::batches::UpdateBatchRequest,
        routes::departments::DepartmentResponse,
        routes::departments::CreateDepartmentRequest,
        routes::departments::UpdateDepartmentRequest,
        routes::subjects::SubjectResponse,
        routes::subjects::CreateSubjectRequest,
        routes::subjects::UpdateSubjectRequest,
        routes::courses::CourseResponse,
        routes::courses::CreateCourseRequest,
        routes::courses::UpdateCourseRequest,
        routes::enrollments::EnrollmentResponse,
        routes::enrollments::CreateEnrollmentRequest,
        routes::enrollments::UpdateEnrollmentRequest,
        routes::assessments::AssessmentResponse,
        routes::assessments::CreateAssessmentRequest,
        routes::assessments::UpdateAssessmentRequest,
    ))
)]
struct ApiDoc;

/// The OpenAPI document for the whole API.
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Users
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/{id}",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/users/username/{username}",
            get(routes::users::get_user_by_username)
                .post(routes::users::create_user_with_username)
                .put(routes::users::update_user_by_username)
                .delete(routes::users::delete_user_by_username),
        )
        .route(
            "/users/{id}/roles",
            get(routes::users::list_user_roles).post(routes::users::assign_role),
        )
        .route(
            "/users/{id}/roles/{role_id}",
            post(routes::users::assign_role_by_path).delete(routes::users::remove_role),
        )
        // Addresses
        .route(
            "/users/{id}/addresses",
            get(routes::addresses::list_user_addresses)
                .post(routes::addresses::create_user_address),
        )
        .route(
            "/addresses/{id}",
            get(routes::addresses::get_address)
                .put(routes::addresses::update_address)
                .delete(routes::addresses::delete_address),
        )
        // Emergency contacts
        .route(
            "/users/{id}/emergency-contacts",
            get(routes::emergency_contacts::list_for_user)
                .post(routes::emergency_contacts::create_emergency_contact),
        )
        .route(
            "/emergency-contacts/{id}",
            get(routes::emergency_contacts::get_emergency_contact)
                .put(routes::emergency_contacts::update_emergency_contact)
                .delete(routes::emergency_contacts::delete_emergency_contact),
        )
        .route(
            "/emergency-contacts/{id}/addresses",
            get(routes::addresses::list_contact_addresses)
                .post(routes::addresses::create_contact_address),
        )
        .route(
            "/emergency-contact-addresses/{id}",
            get(routes::addresses::get_contact_address)
                .put(routes::addresses::update_contact_address)
                .delete(routes::addresses::delete_contact_address),
        )
        // Profiles
        .route(
            "/users/{id}/student-profile",
            get(routes::profiles::get_student_profile)
                .post(routes::profiles::create_student_profile)
                .put(routes::profiles::update_student_profile)
                .delete(routes::profiles::delete_student_profile),
        )
        .route(
            "/users/{id}/teacher-profile",
            get(routes::profiles::get_teacher_profile)
                .post(routes::profiles::create_teacher_profile)
                .put(routes::profiles::update_teacher_profile)
                .delete(routes::profiles::delete_teacher_profile),
        )
        .route(
            "/users/{id}/staff-profile",
            get(routes::profiles::get_staff_profile)
                .post(routes::profiles::create_staff_profile)
                .put(routes::profiles::update_staff_profile)
                .delete(routes::profiles::delete_staff_profile),
        )
        // Roles
        .route(
            "/roles",
            get(routes::roles::list_roles).post(routes::roles::create_role),
        )
        .route(
            "/roles/{id}",
            get(routes::roles::get_role)
                .put(routes::roles::update_role)
                .delete(routes::roles::delete_role),
        )
        // Academic organisation
        .route(
            "/batches",
            get(routes::batches::list_batches).post(routes::batches::create_batch),
        )
        .route(
            "/batches/{id}",
            get(routes::batches::get_batch)
                .put(routes::batches::update_batch)
                .delete(routes::batches::delete_batch),
        )
        .route(
            "/departments",
            get(routes::departments::list_departments)
                .post(routes::departments::create_department),
        )
        .route(
            "/departments/{id}",
            get(routes::departments::get_department)
                .put(routes::departments::update_department)
                .delete(routes::departments::delete_department),
        )
        .route(
            "/subjects",
            get(routes::subjects::list_subjects).post(routes::subjects::create_subject),
        )
        .route(
            "/subjects/{id}",
            get(routes::subjects::get_subject)
                .put(routes::subjects::update_subject)
                .delete(routes::subjects::delete_subject),
        )
        .route(
            "/courses",
            get(routes::courses::list_courses).post(routes::courses::create_course),
        )
        .route(
            "/courses/{id}",
            get(routes::courses::get_course)
                .put(routes::courses::update_course)
                .delete(routes::courses::delete_course),
        )
        // Enrollment and scoring
        .route(
            "/enrollments",
            get(routes::enrollments::list_enrollments)
                .post(routes::enrollments::create_enrollment),
        )
        .route(
            "/enrollments/{id}",
            get(routes::enrollments::get_enrollment)
                .put(routes::enrollments::update_enrollment)
                .delete(routes::enrollments::delete_enrollment),
        )
        .route(
            "/assessments",
            get(routes::assessments::list_assessments)
                .post(routes::assessments::create_assessment),
        )
        .route(
            "/assessments/{id}",
            get(routes::assessments::get_assessment)
                .put(routes::assessments::update_assessment)
                .delete(routes::assessments::delete_assessment),
        )
        .layer(middleware::from_fn_with_state(ctx.clone(), admin_middleware));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use reg_core::config::Config;
    use tower::ServiceExt;

    fn test_router(config: Config) -> Router {
        let db = reg_db::pool::init_memory_pool().unwrap();
        build_router(AppContext::new(db, config))
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = test_router(Config::default());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let json = body_json(response.into_body()).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], true);
    }

    #[tokio::test]
    async fn request_id_is_echoed_into_errors() {
        let app = test_router(Config::default());
        let response = app
            .oneshot(
                Request::get("/api/users/999")
                    .header("x-request-id", "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "trace-me");

        let json = body_json(response.into_body()).await;
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["request_id"], "trace-me");
    }

    #[tokio::test]
    async fn malformed_path_id_is_a_validation_error() {
        let app = test_router(Config::default());
        let response = app
            .oneshot(Request::get("/api/batches/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["code"], "validation_error");
    }

    #[tokio::test]
    async fn admin_gate_carries_request_id() {
        let mut config = Config::default();
        config.auth.enabled = true;
        config.auth.api_key = Some("secret".into());
        let app = test_router(config);

        let response = app
            .oneshot(
                Request::post("/api/roles")
                    .header("content-type", "application/json")
                    .header("x-request-id", "gate-1")
                    .body(Body::from(r#"{"name":"Teacher"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["request_id"], "gate-1");
    }

    #[test]
    fn openapi_lists_every_resource() {
        let doc = openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/health",
            "/api/users",
            "/api/users/{id}/roles/{role_id}",
            "/api/users/username/{username}",
            "/api/emergency-contact-addresses/{id}",
            "/api/users/{id}/staff-profile",
            "/api/courses",
            "/api/assessments/{id}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
