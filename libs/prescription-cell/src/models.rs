use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// REQUEST MODELS (camelCase wire format)
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_id: i64,
    pub appointment_id: i64,
    pub diagnosis: String,
    pub medications: Vec<MedicationInput>,
    pub instructions: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInput {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationView {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

/// Prescription shaped for the frontend, with the counterparty's name and
/// the appointment it was issued for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
    pub id: i64,
    pub diagnosis: String,
    pub instructions: Option<String>,
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_specialization: Option<String>,
    pub medications: Vec<MedicationView>,
}

// ==============================================================================
// DATABASE ROWS (snake_case columns)
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRow {
    pub id: i64,
    pub appointment_id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub diagnosis: String,
    pub instructions: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicationRow {
    pub id: i64,
    pub prescription_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

impl MedicationRow {
    pub fn into_view(self) -> MedicationView {
        MedicationView {
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            duration: self.duration,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSlotRow {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: appointment_cell::models::AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorNameRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientNameRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum PrescriptionError {
    #[error("Prescription not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("A prescription already exists for this appointment")]
    AlreadyIssued,

    #[error("Prescriptions can only be issued for completed appointments")]
    AppointmentNotCompleted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
