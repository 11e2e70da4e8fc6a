// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::ApiError;

use crate::models::{
    AppointmentError, AppointmentView, AvailableSlotsQuery, BookAppointmentRequest,
    UpdateStatusRequest,
};
use crate::services::booking::BookingService;

fn map_appointment_error(err: AppointmentError) -> ApiError {
    match err {
        AppointmentError::NotFound => ApiError::NotFound(
            "Appointment not found or you do not have permission to update it".to_string(),
        ),
        AppointmentError::SlotTaken => {
            ApiError::Conflict("This time slot is already booked".to_string())
        }
        AppointmentError::DoctorNotFound => ApiError::NotFound("Doctor not found".to_string()),
        AppointmentError::InvalidTime(msg) => ApiError::BadRequest(msg),
        AppointmentError::InvalidStatusTransition { current, requested } => ApiError::BadRequest(
            format!("Cannot transition from status {} to {}", current, requested),
        ),
        AppointmentError::PatientCancelOnly => {
            ApiError::Forbidden("Patients can only cancel appointments".to_string())
        }
        AppointmentError::ValidationError(msg) => ApiError::BadRequest(msg),
        AppointmentError::DatabaseError(msg) => ApiError::Database(msg),
    }
}

/// Appointments belonging to the authenticated patient or doctor.
#[axum::debug_handler]
pub async fn get_user_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let booking_service = BookingService::new(&state);

    let appointments = booking_service
        .appointments_for_user(&user)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// Book a new appointment. Patient-only.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !user.is_patient() {
        return Err(ApiError::Forbidden(
            "Only patients can book appointments".to_string(),
        ));
    }

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .book_appointment(&user, request)
        .await
        .map_err(map_appointment_error)?;

    let appointment_id = appointment.id;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment booked successfully",
            "appointmentId": appointment_id,
            "appointment": AppointmentView::from_row(appointment)
        })),
    ))
}

/// Occupied and free slots for a doctor on a given date.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<AuthUser>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, ApiError> {
    let booking_service = BookingService::new(&state);

    let availability = booking_service
        .availability(query.doctor_id, query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(availability)))
}

/// Transition an appointment's status (doctor confirm/cancel/complete,
/// patient cancel-only).
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_status(&user, appointment_id, request.status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment status updated successfully",
        "appointment": AppointmentView::from_row(appointment)
    })))
}
