//! Integration tests for batches, departments, subjects, courses,
//! enrollments and assessments.

mod common;

use common::{delete, get_json, post_json, put_json, TestHarness};
use serde_json::{json, Value};
use std::net::SocketAddr;

async fn create(client: &reqwest::Client, addr: SocketAddr, path: &str, body: Value) -> i64 {
    let (status, json) = post_json(client, format!("http://{addr}/api/{path}"), body).await;
    assert_eq!(status, 201, "POST {path}: {json}");
    json["id"].as_i64().unwrap()
}

/// A student with a profile in a fresh batch, plus a course for that batch.
async fn seed_course(h: &TestHarness, addr: SocketAddr, client: &reqwest::Client) -> (i64, i64, i64) {
    let batch = create(
        client,
        addr,
        "batches",
        json!({ "name": "2024 Intake", "start_date": "2024-09-01", "level": 1 }),
    )
    .await;
    let subject = create(client, addr, "subjects", json!({ "name": "Mathematics" })).await;
    let course = create(
        client,
        addr,
        "courses",
        json!({ "subject_id": subject, "batch_id": batch, "semester": 1, "year": 2024 }),
    )
    .await;

    let student = h.create_user("student1").get();
    let (status, _) = post_json(
        client,
        format!("http://{addr}/api/users/{student}/student-profile"),
        json!({ "batch_id": batch, "joined_at": "2024-09-01" }),
    )
    .await;
    assert_eq!(status, 201);

    (batch, course, student)
}

#[tokio::test]
async fn batch_crud_and_unique_name() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let id = create(
        &client,
        addr,
        "batches",
        json!({ "name": "B1", "start_date": "2023-09-01", "level": 2, "remarks": "evening" }),
    )
    .await;

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/batches"),
        json!({ "name": "B1", "start_date": "2023-09-01", "level": 1 }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, updated) = put_json(
        &client,
        format!("http://{addr}/api/batches/{id}"),
        json!({ "end_date": "2024-06-30" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["end_date"], "2024-06-30");
    assert_eq!(updated["remarks"], "evening");

    let (status, batch) = get_json(&client, format!("http://{addr}/api/batches/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(batch["level"], 2);

    assert_eq!(delete(&client, format!("http://{addr}/api/batches/{id}")).await, 204);
    let (_, list) = get_json(&client, format!("http://{addr}/api/batches")).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn batch_with_bad_date_rejected() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/batches"),
        json!({ "name": "B", "start_date": "first of september", "level": 1 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn subjects_filtered_by_department() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let science = create(&client, addr, "departments", json!({ "name": "Science" })).await;
    let arts = create(&client, addr, "departments", json!({ "name": "Arts" })).await;
    create(&client, addr, "subjects", json!({ "name": "Physics", "department_id": science })).await;
    create(&client, addr, "subjects", json!({ "name": "Chemistry", "department_id": science })).await;
    create(&client, addr, "subjects", json!({ "name": "History", "department_id": arts })).await;

    let (status, list) = get_json(
        &client,
        format!("http://{addr}/api/subjects?department_id={science}"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (_, all) = get_json(&client, format!("http://{addr}/api/subjects")).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    // Unknown department is reported, not silently stored.
    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/subjects"),
        json!({ "name": "Music", "department_id": 999 }),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn subject_department_can_be_cleared() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let dept = create(&client, addr, "departments", json!({ "name": "Languages" })).await;
    let subject =
        create(&client, addr, "subjects", json!({ "name": "Amharic", "department_id": dept })).await;

    let (status, updated) = put_json(
        &client,
        format!("http://{addr}/api/subjects/{subject}"),
        json!({ "department_id": null }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(updated["department_id"].is_null());
}

#[tokio::test]
async fn duplicate_course_offering_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let (batch, _course, _) = seed_course(&h, addr, &client).await;

    let (_, subjects) = get_json(&client, format!("http://{addr}/api/subjects")).await;
    let subject = subjects[0]["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/courses"),
        json!({ "subject_id": subject, "batch_id": batch, "semester": 1, "year": 2024 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");

    // A different semester is a different offering.
    create(
        &client,
        addr,
        "courses",
        json!({ "subject_id": subject, "batch_id": batch, "semester": 2, "year": 2024 }),
    )
    .await;

    let (_, list) = get_json(
        &client,
        format!("http://{addr}/api/courses?batch_id={batch}&semester=2"),
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn course_teacher_must_have_profile() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let teacher = h.create_user("teacher1").get();

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/courses"),
        json!({ "teacher_id": teacher, "semester": 1, "year": 2024 }),
    )
    .await;
    assert_eq!(status, 404);

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/users/{teacher}/teacher-profile"),
        json!({ "start_date": "2020-01-01" }),
    )
    .await;
    assert_eq!(status, 201);

    let course = create(
        &client,
        addr,
        "courses",
        json!({ "teacher_id": teacher, "semester": 1, "year": 2024 }),
    )
    .await;
    let (_, list) = get_json(&client, format!("http://{addr}/api/courses?teacher_id={teacher}")).await;
    assert_eq!(list[0]["id"], course);
}

#[tokio::test]
async fn profiles_are_one_per_kind() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let user = h.create_user("multi").get();

    for kind in ["student-profile", "teacher-profile", "staff-profile"] {
        let url = format!("http://{addr}/api/users/{user}/{kind}");
        let (status, _) = post_json(&client, url.clone(), json!({})).await;
        assert_eq!(status, 201, "{kind}");
        let (status, _) = post_json(&client, url.clone(), json!({})).await;
        assert_eq!(status, 400, "{kind}");
        let (status, profile) = get_json(&client, url).await;
        assert_eq!(status, 200);
        assert_eq!(profile["user_id"], user);
    }

    let (status, updated) = put_json(
        &client,
        format!("http://{addr}/api/users/{user}/staff-profile"),
        json!({ "remarks": "registrar office" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["remarks"], "registrar office");

    assert_eq!(
        delete(&client, format!("http://{addr}/api/users/{user}/teacher-profile")).await,
        204
    );
    let (status, _) =
        get_json(&client, format!("http://{addr}/api/users/{user}/teacher-profile")).await;
    assert_eq!(status, 404);
    assert_eq!(h.count("staff_profiles"), 1);
}

#[tokio::test]
async fn enrollment_and_assessment_flow() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let (_batch, course, student) = seed_course(&h, addr, &client).await;

    let enrollment = create(
        &client,
        addr,
        "enrollments",
        json!({ "student_id": student, "course_id": course, "status": "active" }),
    )
    .await;

    // One enrollment per student and course.
    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/enrollments"),
        json!({ "student_id": student, "course_id": course }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, updated) = put_json(
        &client,
        format!("http://{addr}/api/enrollments/{enrollment}"),
        json!({ "grade": "A+", "rank": 1 }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["grade"], "A+");
    assert_eq!(updated["status"], "active");

    let (status, _) = put_json(
        &client,
        format!("http://{addr}/api/enrollments/{enrollment}"),
        json!({ "grade": "ABC" }),
    )
    .await;
    assert_eq!(status, 400);

    let assessment = create(
        &client,
        addr,
        "assessments",
        json!({
            "enrollment_id": enrollment,
            "assessment_type": "midterm",
            "score": 42.5,
            "total_score": 50.0,
        }),
    )
    .await;

    let (status, _) = put_json(
        &client,
        format!("http://{addr}/api/assessments/{assessment}"),
        json!({ "score": 60.0 }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, list) = get_json(
        &client,
        format!("http://{addr}/api/assessments?enrollment_id={enrollment}"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(list[0]["score"], 42.5);

    let (_, by_student) =
        get_json(&client, format!("http://{addr}/api/enrollments?student_id={student}")).await;
    assert_eq!(by_student.as_array().unwrap().len(), 1);

    assert_eq!(
        delete(&client, format!("http://{addr}/api/enrollments/{enrollment}")).await,
        204
    );
    assert_eq!(h.count("assessments"), 0);
}

#[tokio::test]
async fn enrollment_requires_student_profile() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let (_, course, _) = seed_course(&h, addr, &client).await;
    let outsider = h.create_user("outsider").get();

    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/enrollments"),
        json!({ "student_id": outsider, "course_id": course }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn negative_score_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let (_, course, student) = seed_course(&h, addr, &client).await;
    let enrollment = create(
        &client,
        addr,
        "enrollments",
        json!({ "student_id": student, "course_id": course }),
    )
    .await;

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/assessments"),
        json!({ "enrollment_id": enrollment, "assessment_type": "quiz", "score": -1.0 }),
    )
    .await;
    assert_eq!(status, 400);
}
