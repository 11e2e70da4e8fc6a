use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::handlers;
use shared_utils::test_utils::{TestConfig, TestUser};

#[tokio::test]
async fn doctor_directory_lists_public_fields() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 5,
                "first_name": "Gregory",
                "last_name": "House",
                "specialization": "Diagnostics",
                "experience": 20,
                "qualifications": "MD"
            },
            {
                "id": 6,
                "first_name": "James",
                "last_name": "Wilson",
                "specialization": "Oncology",
                "experience": 15,
                "qualifications": "MD"
            }
        ])))
        .mount(&mock_server)
        .await;

    let Json(body) = handlers::get_all_doctors(State(Arc::new(config))).await.unwrap();

    let doctors = body["doctors"].as_array().unwrap();
    assert_eq!(doctors.len(), 2);
    assert_eq!(doctors[0]["firstName"], "Gregory");
    assert_eq!(doctors[0]["specialization"], "Diagnostics");
    assert!(doctors[0].get("email").is_none());
    assert!(doctors[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn my_patients_requires_doctor_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    let patient = TestUser::patient(1, "patient@example.com").to_auth_user();

    let err = handlers::get_my_patients(State(Arc::new(config)), Extension(patient))
        .await
        .unwrap_err();

    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn my_patients_aggregates_visit_counts() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "patient_id": 1, "appointment_date": "2024-05-01",
                "appointment_time": "09:00:00", "reason": "checkup", "status": "completed"
            },
            {
                "id": 2, "patient_id": 1, "appointment_date": "2024-06-01",
                "appointment_time": "10:00:00", "reason": "follow-up", "status": "completed"
            },
            {
                "id": 3, "patient_id": 2, "appointment_date": "2024-04-20",
                "appointment_time": "11:30:00", "reason": "consultation", "status": "completed"
            }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "email": "jane@example.com", "first_name": "Jane",
                "last_name": "Doe", "date_of_birth": "1990-01-15", "phone": "555-0100"
            },
            {
                "id": 2, "email": "john@example.com", "first_name": "John",
                "last_name": "Smith", "date_of_birth": "1985-03-02", "phone": null
            }
        ])))
        .mount(&mock_server)
        .await;

    let doctor = TestUser::doctor(5, "doctor@example.com").to_auth_user();

    let Json(body) = handlers::get_my_patients(State(Arc::new(config)), Extension(doctor))
        .await
        .unwrap();

    let patients = body["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 2);

    // Jane has the most recent visit, so she sorts first.
    assert_eq!(patients[0]["firstName"], "Jane");
    assert_eq!(patients[0]["appointmentCount"], 2);
    assert_eq!(patients[0]["lastVisit"], "2024-06-01");
    assert_eq!(patients[1]["firstName"], "John");
    assert_eq!(patients[1]["appointmentCount"], 1);
}

#[tokio::test]
async fn patient_history_links_prescriptions() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.5"))
        .and(query_param("patient_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 2, "patient_id": 1, "appointment_date": "2024-06-01",
                "appointment_time": "10:00:00", "reason": "follow-up", "status": "completed"
            },
            {
                "id": 1, "patient_id": 1, "appointment_date": "2024-05-01",
                "appointment_time": "09:00:00", "reason": "checkup", "status": "cancelled"
            }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "appointment_id": 2, "diagnosis": "Seasonal allergy" }
        ])))
        .mount(&mock_server)
        .await;

    let doctor = TestUser::doctor(5, "doctor@example.com").to_auth_user();

    let Json(body) = handlers::get_patient_history(
        State(Arc::new(config)),
        Extension(doctor),
        Path(1),
    )
    .await
    .unwrap();

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);

    assert_eq!(history[0]["id"], 2);
    assert_eq!(history[0]["hasPrescription"], true);
    assert_eq!(history[0]["prescriptionId"], 7);
    assert_eq!(history[0]["diagnosis"], "Seasonal allergy");

    assert_eq!(history[1]["id"], 1);
    assert_eq!(history[1]["hasPrescription"], false);
    assert_eq!(history[1]["prescriptionId"], serde_json::Value::Null);
}

#[tokio::test]
async fn patient_history_requires_doctor_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri());

    let patient = TestUser::patient(1, "patient@example.com").to_auth_user();

    let err = handlers::get_patient_history(
        State(Arc::new(config)),
        Extension(patient),
        Path(2),
    )
    .await
    .unwrap_err();

    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
}
