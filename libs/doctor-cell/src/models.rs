use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use appointment_cell::models::AppointmentStatus;

// ==============================================================================
// WIRE MODELS (camelCase)
// ==============================================================================

/// Public directory entry. No contact or credential fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub qualifications: Option<String>,
}

/// A patient who has had at least one appointment with the doctor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub appointment_count: i64,
    pub last_visit: Option<NaiveDate>,
}

/// One line of a patient's appointment history with prescription linkage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientHistoryEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub prescription_id: Option<i64>,
    pub diagnosis: Option<String>,
    pub has_prescription: bool,
}

// ==============================================================================
// DATABASE ROWS (snake_case columns)
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorProfileRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub qualifications: Option<String>,
}

impl DoctorProfileRow {
    pub fn into_view(self) -> DoctorView {
        DoctorView {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            specialization: self.specialization,
            experience: self.experience,
            qualifications: self.qualifications,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientContactRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorAppointmentRow {
    pub id: i64,
    pub patient_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionLinkRow {
    pub id: i64,
    pub appointment_id: i64,
    pub diagnosis: String,
}
