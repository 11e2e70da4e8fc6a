use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::ApiError;

use crate::models::{CreatePrescriptionRequest, PrescriptionError};
use crate::services::prescription::PrescriptionService;

fn map_prescription_error(err: PrescriptionError) -> ApiError {
    match err {
        PrescriptionError::NotFound => ApiError::NotFound("Prescription not found".to_string()),
        PrescriptionError::AppointmentNotFound => ApiError::NotFound(
            "Appointment not found or you do not have permission to prescribe for it".to_string(),
        ),
        PrescriptionError::AlreadyIssued => ApiError::Conflict(
            "A prescription already exists for this appointment".to_string(),
        ),
        PrescriptionError::AppointmentNotCompleted => ApiError::BadRequest(
            "Prescriptions can only be issued for completed appointments".to_string(),
        ),
        PrescriptionError::ValidationError(msg) => ApiError::BadRequest(msg),
        PrescriptionError::DatabaseError(msg) => ApiError::Database(msg),
    }
}

/// Issue a prescription. Doctor-only.
#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !user.is_doctor() {
        return Err(ApiError::Forbidden(
            "Only doctors can create prescriptions".to_string(),
        ));
    }

    let service = PrescriptionService::new(&state);

    let prescription = service
        .create_prescription(&user, request)
        .await
        .map_err(map_prescription_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Prescription created successfully",
            "prescriptionId": prescription.id
        })),
    ))
}

/// Prescriptions issued by the authenticated doctor.
#[axum::debug_handler]
pub async fn get_doctor_prescriptions(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_doctor() {
        return Err(ApiError::Forbidden("Unauthorized access".to_string()));
    }

    let service = PrescriptionService::new(&state);

    let prescriptions = service
        .prescriptions_for_doctor(user.id)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!({ "prescriptions": prescriptions })))
}

/// Prescriptions received by the authenticated patient.
#[axum::debug_handler]
pub async fn get_patient_prescriptions(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_patient() {
        return Err(ApiError::Forbidden("Unauthorized access".to_string()));
    }

    let service = PrescriptionService::new(&state);

    let prescriptions = service
        .prescriptions_for_patient(user.id)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!({ "prescriptions": prescriptions })))
}

/// Public share link: a single prescription by id, no authentication.
/// Pharmacies receive these links from patients.
#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppConfig>>,
    Path(prescription_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = PrescriptionService::new(&state);

    let prescription = service
        .get_prescription(prescription_id)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!({ "prescription": prescription })))
}
