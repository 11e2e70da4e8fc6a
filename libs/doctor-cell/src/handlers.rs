use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::ApiError;

use crate::services::doctor::DoctorDirectoryService;

/// Public directory of all doctors. No authentication required.
#[axum::debug_handler]
pub async fn get_all_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, ApiError> {
    let service = DoctorDirectoryService::new(&state);

    let doctors = service
        .list_doctors()
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok(Json(json!({ "doctors": doctors })))
}

/// Patients seen by the authenticated doctor.
#[axum::debug_handler]
pub async fn get_my_patients(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_doctor() {
        return Err(ApiError::Forbidden("Unauthorized access".to_string()));
    }

    let service = DoctorDirectoryService::new(&state);

    let patients = service
        .patients_for_doctor(user.id)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok(Json(json!({ "patients": patients })))
}

/// Appointment history for one of the doctor's patients.
#[axum::debug_handler]
pub async fn get_patient_history(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_doctor() {
        return Err(ApiError::Forbidden("Unauthorized access".to_string()));
    }

    let service = DoctorDirectoryService::new(&state);

    let history = service
        .patient_history(user.id, patient_id)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok(Json(json!({ "history": history })))
}
