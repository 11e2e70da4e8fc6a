use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockDbRows, TestConfig, TestUser};

fn create_test_app(config: AppConfig) -> Router {
    appointment_routes(Arc::new(config))
}

fn booking_body() -> String {
    json!({
        "doctorId": 5,
        "appointmentDate": "2024-06-01",
        "appointmentTime": "09:00:00",
        "reason": "checkup"
    })
    .to_string()
}

#[tokio::test]
async fn booking_requires_authentication() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/book")
        .header("content-type", "application/json")
        .body(Body::from(booking_body()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone());

    let user = TestUser::patient(1, "patient@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let request = Request::builder()
        .method("GET")
        .uri("/user")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booked_slot_rejects_an_identical_booking() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::doctor_row(5, "doctor@example.com", "Gregory", "House", "Diagnostics")
        ])))
        .mount(&mock_server)
        .await;

    // First pre-check sees a free slot; after the insert the same query
    // reports it occupied.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "appointment_time": "09:00:00" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDbRows::appointment_row(101, 1, 5, "2024-06-01", "09:00:00", "pending")
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient(1, "patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    // First booking succeeds with 201 and an appointment id.
    let request = Request::builder()
        .method("POST")
        .uri("/book")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(booking_body()))
        .unwrap();

    let response = create_test_app(config.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["appointmentId"], 101);

    // The identical repeat is turned away with a conflict.
    let request = Request::builder()
        .method("POST")
        .uri("/book")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(booking_body()))
        .unwrap();

    let response = create_test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["error"], "This time slot is already booked");
}

#[tokio::test]
async fn booking_then_listing_shows_pending_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::doctor_row(5, "doctor@example.com", "Gregory", "House", "Diagnostics")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDbRows::appointment_row(101, 1, 5, "2024-06-01", "09:00:00", "pending")
        ])))
        .mount(&mock_server)
        .await;

    // Listing fetch mirrors what the booking created.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDbRows::appointment_row(101, 1, 5, "2024-06-01", "09:00:00", "pending")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "in.(5)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 5, "first_name": "Gregory", "last_name": "House", "specialization": "Diagnostics" }
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient(1, "patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let request = Request::builder()
        .method("POST")
        .uri("/book")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(booking_body()))
        .unwrap();

    let response = create_test_app(config.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .method("GET")
        .uri("/user")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let appointments = json_response["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["id"], 101);
    assert_eq!(appointments[0]["status"], "pending");
}

#[tokio::test]
async fn available_slots_route_returns_complement() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "appointment_time": "09:00:00" }
        ])))
        .mount(&mock_server)
        .await;

    let user = TestUser::patient(1, "patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let request = Request::builder()
        .method("GET")
        .uri("/available-slots?doctorId=5&date=2024-06-01")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["busySlots"], json!(["09:00:00"]));
    let available = json_response["availableSlots"].as_array().unwrap();
    assert_eq!(available.len(), 15);
    assert!(!available.contains(&json!("09:00:00")));
}
