// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::postgrest::{DbError, PostgrestClient};
use shared_models::auth::{AuthUser, UserRole};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentView, BookAppointmentRequest,
    DoctorNameRow, PatientNameRow, SlotAvailability,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::slots::SlotAvailabilityService;

pub struct BookingService {
    db: Arc<PostgrestClient>,
    slot_service: SlotAvailabilityService,
    lifecycle_service: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let db = Arc::new(PostgrestClient::new(config));
        let slot_service = SlotAvailabilityService::new(Arc::clone(&db));
        let lifecycle_service = AppointmentLifecycleService::new();

        Self {
            slot_service,
            lifecycle_service,
            db,
        }
    }

    /// Book a slot for the authenticated patient.
    ///
    /// The occupied-slot pre-check only exists to answer most conflicts
    /// without burning an insert; the partial unique index on
    /// (doctor_id, appointment_date, appointment_time) for non-cancelled
    /// rows is what actually serializes concurrent bookings.
    pub async fn book_appointment(
        &self,
        patient: &AuthUser,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {} at {}",
            patient.id, request.doctor_id, request.appointment_date, request.appointment_time
        );

        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "All fields are required".to_string(),
            ));
        }

        if !SlotAvailabilityService::is_bookable_time(request.appointment_time) {
            return Err(AppointmentError::InvalidTime(
                "Appointments run 09:00-17:00 in 30-minute slots".to_string(),
            ));
        }

        self.verify_doctor_exists(request.doctor_id).await?;

        let occupied = self
            .slot_service
            .occupied_times(request.doctor_id, request.appointment_date)
            .await?;

        if occupied.contains(&request.appointment_time) {
            warn!(
                "Slot conflict for doctor {} on {} at {}",
                request.doctor_id, request.appointment_date, request.appointment_time
            );
            return Err(AppointmentError::SlotTaken);
        }

        let row = json!({
            "patient_id": patient.id,
            "doctor_id": request.doctor_id,
            "appointment_date": request.appointment_date,
            "appointment_time": request.appointment_time,
            "reason": request.reason,
            "status": AppointmentStatus::Pending,
        });

        let created: Vec<Appointment> = self
            .db
            .insert_returning("/rest/v1/appointments", row)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation(_) => AppointmentError::SlotTaken,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let appointment = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Insert returned no row".to_string()))?;

        info!("Appointment {} booked successfully", appointment.id);
        Ok(appointment)
    }

    /// Occupied and bookable times for a doctor/date.
    pub async fn availability(
        &self,
        doctor_id: i64,
        date: chrono::NaiveDate,
    ) -> Result<SlotAvailability, AppointmentError> {
        self.slot_service.availability(doctor_id, date).await
    }

    /// The caller's appointments, newest first, enriched with the
    /// counterparty's display name.
    pub async fn appointments_for_user(
        &self,
        user: &AuthUser,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        debug!("Fetching appointments for {} {}", user.user_type, user.id);

        let owner_column = match user.user_type {
            UserRole::Patient => "patient_id",
            UserRole::Doctor => "doctor_id",
        };

        let path = format!(
            "/rest/v1/appointments?{}=eq.{}&order=appointment_date.desc,appointment_time.desc",
            owner_column, user.id
        );

        let rows: Vec<Appointment> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut views: Vec<AppointmentView> = rows.into_iter().map(AppointmentView::from_row).collect();

        match user.user_type {
            UserRole::Patient => self.attach_doctor_names(&mut views).await?,
            UserRole::Doctor => self.attach_patient_names(&mut views).await?,
        }

        Ok(views)
    }

    /// Transition an appointment's status on behalf of the caller.
    ///
    /// The row lookup is scoped to the caller's own column, so an
    /// appointment owned by someone else looks exactly like a missing one.
    pub async fn update_status(
        &self,
        user: &AuthUser,
        appointment_id: i64,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Updating appointment {} to {} for {} {}",
            appointment_id, new_status, user.user_type, user.id
        );

        self.lifecycle_service
            .validate_role_transition(user.user_type, new_status)?;

        let owner_column = match user.user_type {
            UserRole::Patient => "patient_id",
            UserRole::Doctor => "doctor_id",
        };

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&{}=eq.{}",
            appointment_id, owner_column, user.id
        );

        let rows: Vec<Appointment> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let current = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;

        self.lifecycle_service
            .validate_status_transition(current.status, new_status)?;

        let patch = json!({
            "status": new_status,
            "updated_at": Utc::now(),
        });

        let updated: Vec<Appointment> = self
            .db
            .update_returning(&format!("/rest/v1/appointments?id=eq.{}", appointment_id), patch)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = updated.into_iter().next().ok_or(AppointmentError::NotFound)?;

        info!(
            "Appointment {} status updated to {}",
            appointment.id, appointment.status
        );
        Ok(appointment)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn verify_doctor_exists(&self, doctor_id: i64) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id,first_name,last_name,specialization", doctor_id);

        let rows: Vec<DoctorNameRow> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppointmentError::DoctorNotFound);
        }

        Ok(())
    }

    async fn attach_doctor_names(&self, views: &mut [AppointmentView]) -> Result<(), AppointmentError> {
        let ids = Self::distinct_ids(views.iter().map(|v| v.doctor_id));
        if ids.is_empty() {
            return Ok(());
        }

        let path = format!(
            "/rest/v1/doctors?id=in.({})&select=id,first_name,last_name,specialization",
            ids
        );

        let rows: Vec<DoctorNameRow> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let by_id: HashMap<i64, DoctorNameRow> = rows.into_iter().map(|d| (d.id, d)).collect();

        for view in views.iter_mut() {
            if let Some(doctor) = by_id.get(&view.doctor_id) {
                view.doctor_name = Some(format!("Dr. {} {}", doctor.first_name, doctor.last_name));
                view.doctor_specialization = doctor.specialization.clone();
            }
        }

        Ok(())
    }

    async fn attach_patient_names(&self, views: &mut [AppointmentView]) -> Result<(), AppointmentError> {
        let ids = Self::distinct_ids(views.iter().map(|v| v.patient_id));
        if ids.is_empty() {
            return Ok(());
        }

        let path = format!(
            "/rest/v1/patients?id=in.({})&select=id,first_name,last_name",
            ids
        );

        let rows: Vec<PatientNameRow> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let by_id: HashMap<i64, PatientNameRow> = rows.into_iter().map(|p| (p.id, p)).collect();

        for view in views.iter_mut() {
            if let Some(patient) = by_id.get(&view.patient_id) {
                view.patient_name = Some(format!("{} {}", patient.first_name, patient.last_name));
            }
        }

        Ok(())
    }

    fn distinct_ids(ids: impl Iterator<Item = i64>) -> String {
        let mut seen: Vec<i64> = Vec::new();
        for id in ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }

        seen.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
