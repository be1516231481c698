//! Integration tests for user and role routes.

mod common;

use common::{delete, get_json, post_json, put_json, TestHarness};
use serde_json::json;

#[tokio::test]
async fn user_crud_round() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let (status, created) = post_json(
        &client,
        format!("http://{addr}/api/users"),
        json!({
            "username": "abebe",
            "first_name": "Abebe",
            "last_name": "Kebede",
            "email": "abebe@example.com",
            "date_of_birth": "2001-04-12",
        }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["username"], "abebe");
    assert_eq!(created["is_active"], true);
    assert_eq!(created["roles"], json!([]));
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = get_json(&client, format!("http://{addr}/api/users/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["email"], "abebe@example.com");

    let (status, updated) = put_json(
        &client,
        format!("http://{addr}/api/users/{id}"),
        json!({ "last_name": "Bekele", "date_of_birth": null }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["last_name"], "Bekele");
    assert_eq!(updated["first_name"], "Abebe");
    assert!(updated["date_of_birth"].is_null());

    let (status, list) = get_json(&client, format!("http://{addr}/api/users")).await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 1);

    assert_eq!(delete(&client, format!("http://{addr}/api/users/{id}")).await, 204);
    let (status, _) = get_json(&client, format!("http://{addr}/api/users/{id}")).await;
    assert_eq!(status, 404);
    assert_eq!(delete(&client, format!("http://{addr}/api/users/{id}")).await, 404);
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("dup");
    let client = reqwest::Client::new();

    let (status, body) =
        post_json(&client, format!("http://{addr}/api/users"), json!({ "username": "dup" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(h.count("users"), 1);
}

#[tokio::test]
async fn empty_username_rejected() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let (status, _) =
        post_json(&client, format!("http://{addr}/api/users"), json!({ "username": "  " })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn username_keyed_routes() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}/api/users/username");

    let (status, created) =
        post_json(&client, format!("{base}/selam"), json!({ "first_name": "Selam" })).await;
    assert_eq!(status, 201);
    assert_eq!(created["username"], "selam");

    let (status, fetched) = get_json(&client, format!("{base}/selam")).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["first_name"], "Selam");

    let (status, updated) =
        put_json(&client, format!("{base}/selam"), json!({ "phone_number": "0911" })).await;
    assert_eq!(status, 200);
    assert_eq!(updated["phone_number"], "0911");

    assert_eq!(delete(&client, format!("{base}/selam")).await, 204);
    let (status, _) = get_json(&client, format!("{base}/selam")).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn role_assignment_reflected_on_user() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let (status, role) = post_json(
        &client,
        format!("http://{addr}/api/roles"),
        json!({ "name": "Teacher" }),
    )
    .await;
    assert_eq!(status, 201);
    let role_id = role["id"].as_i64().unwrap();

    let (status, user) =
        post_json(&client, format!("http://{addr}/api/users"), json!({ "username": "t1" })).await;
    assert_eq!(status, 201);
    let user_id = user["id"].as_i64().unwrap();

    let (status, msg) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/roles/{role_id}"),
        json!({}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(msg["message"], "Role Teacher assigned to user t1");

    let (_, user) = get_json(&client, format!("http://{addr}/api/users/username/t1")).await;
    let names: Vec<&str> = user["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Teacher"]);

    assert_eq!(delete(&client, format!("http://{addr}/api/roles/{role_id}")).await, 204);

    let (_, user) = get_json(&client, format!("http://{addr}/api/users/username/t1")).await;
    assert_eq!(user["roles"], json!([]));
}

#[tokio::test]
async fn assign_role_by_body_and_remove() {
    let (h, addr) = TestHarness::with_server().await;
    let user_id = h.create_user("staffer").get();
    let client = reqwest::Client::new();

    let (_, role) =
        post_json(&client, format!("http://{addr}/api/roles"), json!({ "name": "Staff" })).await;
    let role_id = role["id"].as_i64().unwrap();

    let url = format!("http://{addr}/api/users/{user_id}/roles");
    let (status, _) = post_json(&client, url.clone(), json!({ "role_id": role_id })).await;
    assert_eq!(status, 200);

    // A second assignment of the same pair is rejected.
    let (status, body) = post_json(&client, url.clone(), json!({ "role_id": role_id })).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");

    let (status, roles) = get_json(&client, url.clone()).await;
    assert_eq!(status, 200);
    assert_eq!(roles.as_array().unwrap().len(), 1);

    let resp = client
        .delete(format!("{url}/{role_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let msg: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(msg["message"], "Role Staff removed from user staffer");

    // Removing again finds nothing to remove.
    assert_eq!(delete(&client, format!("{url}/{role_id}")).await, 404);
    assert_eq!(h.count("user_roles"), 0);
    assert_eq!(h.count("roles"), 1);
}

#[tokio::test]
async fn assign_missing_role_is_not_found() {
    let (h, addr) = TestHarness::with_server().await;
    let user_id = h.create_user("lonely").get();
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/roles/42"),
        json!({}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn role_names_are_unique() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/roles");

    let (status, _) = post_json(&client, url.clone(), json!({ "name": "Student" })).await;
    assert_eq!(status, 201);
    let (status, _) = post_json(&client, url.clone(), json!({ "name": "Student" })).await;
    assert_eq!(status, 400);

    let (status, list) = get_json(&client, url).await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn addresses_and_emergency_contacts() {
    let (h, addr) = TestHarness::with_server().await;
    let user_id = h.create_user("hana").get();
    let client = reqwest::Client::new();

    let address = json!({
        "street_address": "Bole Road",
        "woreda": 3,
        "sub_city": "Bole",
        "city": "Addis Ababa",
        "country": "Ethiopia",
    });

    let (status, created) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/addresses"),
        address.clone(),
    )
    .await;
    assert_eq!(status, 201);
    let address_id = created["id"].as_i64().unwrap();

    let (status, updated) = put_json(
        &client,
        format!("http://{addr}/api/addresses/{address_id}"),
        json!({ "woreda": 7 }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["woreda"], 7);
    assert_eq!(updated["city"], "Addis Ababa");

    let (status, contact) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/emergency-contacts"),
        json!({
            "first_name": "Mulu",
            "last_name": "Tadesse",
            "relationship": "Mother",
            "phone_number": "+251911000000",
        }),
    )
    .await;
    assert_eq!(status, 201);
    let contact_id = contact["id"].as_i64().unwrap();

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/emergency-contacts/{contact_id}/addresses"),
        address,
    )
    .await;
    assert_eq!(status, 201);

    // Phone numbers are unique across all contacts.
    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/emergency-contacts"),
        json!({
            "first_name": "Other",
            "last_name": "Person",
            "relationship": "Uncle",
            "phone_number": "+251911000000",
        }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, list) = get_json(
        &client,
        format!("http://{addr}/api/emergency-contacts/{contact_id}/addresses"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(list.as_array().unwrap().len(), 1);

    assert_eq!(
        delete(&client, format!("http://{addr}/api/emergency-contacts/{contact_id}")).await,
        204
    );
    assert_eq!(h.count("emergency_contact_addresses"), 0);
    assert_eq!(h.count("user_addresses"), 1);
}

#[tokio::test]
async fn listing_children_of_missing_user_is_not_found() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    for path in ["addresses", "emergency-contacts", "roles"] {
        let (status, _) = get_json(&client, format!("http://{addr}/api/users/77/{path}")).await;
        assert_eq!(status, 404, "{path}");
    }
}

#[tokio::test]
async fn missing_required_fields_are_validation_errors() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let user_id = h.create_user("partial").get();

    for (path, body) in [
        ("users".to_string(), json!({ "first_name": "x" })),
        ("roles".to_string(), json!({ "description": "no name" })),
        ("courses".to_string(), json!({ "semester": 1 })),
        ("batches".to_string(), json!({ "name": "B" })),
        (
            format!("users/{user_id}/emergency-contacts"),
            json!({ "first_name": "A", "last_name": "B", "phone_number": "0911" }),
        ),
        (format!("users/{user_id}/addresses"), json!({ "city": "Adama" })),
    ] {
        let (status, body) = post_json(&client, format!("http://{addr}/api/{path}"), body).await;
        assert_eq!(status, 400, "{path}: {body}");
        assert_eq!(body["code"], "validation_error", "{path}");
        assert!(body["error"].is_string(), "{path}");
        assert!(body["request_id"].is_string(), "{path}");
    }

    assert_eq!(h.count("users"), 1);
    assert_eq!(h.count("roles"), 0);
    assert_eq!(h.count("courses"), 0);
}

#[tokio::test]
async fn malformed_body_and_query_are_validation_errors() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/roles"))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");

    let (status, body) = put_json(
        &client,
        format!("http://{addr}/api/users/1"),
        json!({ "is_active": "yes" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");

    for query in ["courses?year=abc", "subjects?department_id=x", "enrollments?student_id=1.5"] {
        let (status, body) = get_json(&client, format!("http://{addr}/api/{query}")).await;
        assert_eq!(status, 400, "{query}");
        assert_eq!(body["code"], "validation_error", "{query}");
    }
}

#[tokio::test]
async fn blank_address_and_relationship_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let user_id = h.create_user("blank").get();
    let client = reqwest::Client::new();

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/addresses"),
        json!({
            "street_address": "",
            "woreda": 1,
            "sub_city": "Arada",
            "city": "Addis Ababa",
            "country": "Ethiopia",
        }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = post_json(
        &client,
        format!("http://{addr}/api/users/{user_id}/emergency-contacts"),
        json!({
            "first_name": "Mulu",
            "last_name": "Tadesse",
            "relationship": " ",
            "phone_number": "+251911000001",
        }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = post_json(
        &client,
        format!("http://{addr}/api/users"),
        json!({ "username": "longphone", "phone_number": "+2519110000001234" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "validation_error");

    assert_eq!(h.count("user_addresses"), 0);
    assert_eq!(h.count("emergency_contacts"), 0);
    assert_eq!(h.count("users"), 1);
}
