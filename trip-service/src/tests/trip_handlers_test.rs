use axum::http::StatusCode;
use bmg_shared::auth::create_test_request;
use bmg_shared::store::DocumentStore;
use bmg_shared::test_utils::http_test_utils::response_to_json;
use serde_json::json;
use tower::ServiceExt;

use super::{create_test_app, seed_destination, seed_user};

#[tokio::test]
async fn test_trip_lifecycle_over_http() {
    let (app, context) = create_test_app();
    let owner = seed_user(&context.stores, "owner").await;
    let destination = seed_destination(&context.stores, "Lisbon").await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/trip",
            &owner.id,
            Some(json!({ "users": [owner.id], "destination": destination.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    let trip_id = json_resp["newTrip"]["id"].as_str().unwrap().to_string();
    assert_eq!(json_resp["newTrip"]["users"], json!([owner.id]));

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/trip/{}/planning", trip_id),
            &owner.id,
            Some(json!({ "days": { "day": "2024-06-01", "title": "Arrival" } })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["destination"]["name"], "Lisbon");
    // The caller is recorded as editor when none is given
    assert_eq!(json_resp["planning"]["updatedBy"], json!(owner.id));
    let day_id = json_resp["planning"]["days"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/trip/{}/day/step", day_id),
            &owner.id,
            Some(json!({ "title": "Check-in", "datetime": "2024-06-01T15:00:00Z" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["steps"][0]["title"], "Check-in");

    let response = app
        .clone()
        .oneshot(create_test_request(
            "GET",
            &format!("/trip/steps/{}", trip_id),
            &owner.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(
        json_resp["planning"]["days"][0]["steps"][0]["title"],
        "Check-in"
    );

    let response = app
        .clone()
        .oneshot(create_test_request(
            "DELETE",
            &format!("/trip/{}", trip_id),
            &owner.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["message"], "Trip deleted successfully");
    assert!(context.stores.steps.is_empty().await);
    assert!(context.stores.days.is_empty().await);

    let response = app
        .oneshot(create_test_request(
            "GET",
            &format!("/trip/{}", trip_id),
            &owner.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json_resp = response_to_json(response).await;
    assert!(json_resp["error"].as_str().unwrap().ends_with("not found"));
}

#[tokio::test]
async fn test_create_trip_without_user_is_rejected() {
    let (app, context) = create_test_app();
    let owner = seed_user(&context.stores, "owner").await;
    let destination = seed_destination(&context.stores, "Lisbon").await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/trip",
            &owner.id,
            Some(json!({ "users": [null], "destination": destination.id })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["error"], "User is required");
}

#[tokio::test]
async fn test_missing_required_fields_are_bad_request() {
    let (app, context) = create_test_app();
    let owner = seed_user(&context.stores, "owner").await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/trip",
            &owner.id,
            Some(json!({ "users": [owner.id] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_resp = response_to_json(response).await;
    assert!(json_resp["error"].as_str().unwrap().contains("destination"));
    assert!(context.stores.trips.is_empty().await);

    let day_id = uuid::Uuid::new_v4().to_string();
    let response = app
        .oneshot(create_test_request(
            "POST",
            &format!("/trip/{}/day/step", day_id),
            &owner.id,
            Some(json!({ "title": "Check-in" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_resp = response_to_json(response).await;
    assert!(json_resp["error"].as_str().unwrap().contains("datetime"));
    assert!(context.stores.steps.is_empty().await);
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let (app, context) = create_test_app();
    let owner = seed_user(&context.stores, "owner").await;

    let response = app
        .oneshot(create_test_request("GET", "/trip/day/12345", &owner.id, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["error"], "Incorrect day id format");
}

#[tokio::test]
async fn test_invitation_flow_over_http() {
    let (app, context) = create_test_app();
    let owner = seed_user(&context.stores, "owner").await;
    let invitee = seed_user(&context.stores, "a").await;
    let destination = seed_destination(&context.stores, "Lisbon").await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/trip",
            &owner.id,
            Some(json!({ "users": [owner.id], "destination": destination.id })),
        ))
        .await
        .unwrap();
    let trip_id = response_to_json(response).await["newTrip"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PUT",
            &format!("/trip/{}/users", trip_id),
            &owner.id,
            Some(json!({
                "users": [{ "_id": owner.id, "email": owner.email }, { "email": "a@x.com" }],
                "inviteFrom": "owner"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["invitedUsers"], json!(["a@x.com"]));
    assert_eq!(json_resp["users"][0]["username"], "owner");
    assert_eq!(context.notifier.recipients().await, vec!["a@x.com".to_string()]);

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PUT",
            &format!("/trip/{}/invitation", trip_id),
            &invitee.id,
            Some(json!({ "userId": invitee.id, "accepted": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["invitedUsers"], json!([]));

    let response = app
        .clone()
        .oneshot(create_test_request(
            "DELETE",
            &format!("/trip/{}/users/{}", trip_id, invitee.id),
            &owner.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stored = context.stores.trips.find_by_id(&trip_id).await.unwrap().unwrap();
    assert!(!stored.has_member(&invitee.id));

    let response = app
        .oneshot(create_test_request(
            "GET",
            &format!("/trip/user/{}", owner.id),
            &owner.id,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["trip"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            http::Request::builder()
                .uri("/trip")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, context) = create_test_app();
    let owner = seed_user(&context.stores, "owner").await;

    let response = app
        .oneshot(create_test_request("GET", "/boxes", &owner.id, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
