use std::collections::HashMap;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use appointment_cell::models::AppointmentStatus;
use shared_config::AppConfig;
use shared_database::postgrest::{DbError, PostgrestClient};
use shared_models::auth::AuthUser;

use crate::models::{
    AppointmentSlotRow, CreatePrescriptionRequest, DoctorNameRow, MedicationRow, PatientNameRow,
    PrescriptionError, PrescriptionRow, PrescriptionView,
};

pub struct PrescriptionService {
    db: PostgrestClient,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Issue a prescription for one of the doctor's completed appointments.
    ///
    /// The prescription row and its medication rows are two separate inserts;
    /// a failure between them leaves a prescription without medications and
    /// surfaces as a database error. The unique appointment_id column keeps
    /// the operation single-shot per appointment.
    pub async fn create_prescription(
        &self,
        doctor: &AuthUser,
        request: CreatePrescriptionRequest,
    ) -> Result<PrescriptionRow, PrescriptionError> {
        info!(
            "Creating prescription for appointment {} by doctor {}",
            request.appointment_id, doctor.id
        );

        if request.diagnosis.trim().is_empty() {
            return Err(PrescriptionError::ValidationError(
                "Missing required prescription data".to_string(),
            ));
        }

        let appointment = self
            .get_owned_appointment(doctor.id, request.appointment_id)
            .await?;

        if appointment.patient_id != request.patient_id {
            return Err(PrescriptionError::ValidationError(
                "Patient does not match the appointment".to_string(),
            ));
        }

        if appointment.status != AppointmentStatus::Completed {
            return Err(PrescriptionError::AppointmentNotCompleted);
        }

        let row = json!({
            "appointment_id": request.appointment_id,
            "doctor_id": doctor.id,
            "patient_id": request.patient_id,
            "diagnosis": request.diagnosis,
            "instructions": request.instructions.unwrap_or_default(),
            "notes": request.notes.unwrap_or_default(),
        });

        let created: Vec<PrescriptionRow> = self
            .db
            .insert_returning("/rest/v1/prescriptions", row)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation(_) => PrescriptionError::AlreadyIssued,
                other => PrescriptionError::DatabaseError(other.to_string()),
            })?;

        let prescription = created.into_iter().next().ok_or_else(|| {
            PrescriptionError::DatabaseError("Insert returned no row".to_string())
        })?;

        if !request.medications.is_empty() {
            let medication_rows: Vec<serde_json::Value> = request
                .medications
                .iter()
                .map(|med| {
                    json!({
                        "prescription_id": prescription.id,
                        "name": med.name,
                        "dosage": med.dosage.clone().unwrap_or_default(),
                        "frequency": med.frequency.clone().unwrap_or_default(),
                        "duration": med.duration.clone().unwrap_or_default(),
                    })
                })
                .collect();

            let inserted: Result<Vec<MedicationRow>, _> = self
                .db
                .insert_returning("/rest/v1/prescription_medications", json!(medication_rows))
                .await;

            if let Err(e) = inserted {
                warn!(
                    "Medication insert failed for prescription {}: {}",
                    prescription.id, e
                );
                return Err(PrescriptionError::DatabaseError(
                    "Failed to add medications to prescription".to_string(),
                ));
            }
        }

        info!("Prescription {} created", prescription.id);
        Ok(prescription)
    }

    /// Prescriptions issued by a doctor, newest first, with patient names.
    pub async fn prescriptions_for_doctor(
        &self,
        doctor_id: i64,
    ) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        debug!("Fetching prescriptions issued by doctor {}", doctor_id);

        let path = format!(
            "/rest/v1/prescriptions?doctor_id=eq.{}&order=created_at.desc",
            doctor_id
        );
        let prescriptions: Vec<PrescriptionRow> = self.db_get(&path).await?;

        if prescriptions.is_empty() {
            return Ok(vec![]);
        }

        let mut views = self.base_views(&prescriptions).await?;

        // Patient names for the doctor's listing.
        let patient_ids = Self::join_ids(prescriptions.iter().map(|p| p.patient_id));
        let path = format!(
            "/rest/v1/patients?id=in.({})&select=id,first_name,last_name",
            patient_ids
        );
        let patients: Vec<PatientNameRow> = self.db_get(&path).await?;
        let patients_by_id: HashMap<i64, PatientNameRow> =
            patients.into_iter().map(|p| (p.id, p)).collect();

        for (view, row) in views.iter_mut().zip(prescriptions.iter()) {
            if let Some(patient) = patients_by_id.get(&row.patient_id) {
                view.patient_name = Some(format!("{} {}", patient.first_name, patient.last_name));
            }
        }

        Ok(views)
    }

    /// Prescriptions received by a patient, newest first, with doctor names.
    pub async fn prescriptions_for_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        debug!("Fetching prescriptions for patient {}", patient_id);

        let path = format!(
            "/rest/v1/prescriptions?patient_id=eq.{}&order=created_at.desc",
            patient_id
        );
        let prescriptions: Vec<PrescriptionRow> = self.db_get(&path).await?;

        if prescriptions.is_empty() {
            return Ok(vec![]);
        }

        let mut views = self.base_views(&prescriptions).await?;

        let doctor_ids = Self::join_ids(prescriptions.iter().map(|p| p.doctor_id));
        let path = format!(
            "/rest/v1/doctors?id=in.({})&select=id,first_name,last_name,specialization",
            doctor_ids
        );
        let doctors: Vec<DoctorNameRow> = self.db_get(&path).await?;
        let doctors_by_id: HashMap<i64, DoctorNameRow> =
            doctors.into_iter().map(|d| (d.id, d)).collect();

        for (view, row) in views.iter_mut().zip(prescriptions.iter()) {
            if let Some(doctor) = doctors_by_id.get(&row.doctor_id) {
                view.doctor_name = Some(format!("Dr. {} {}", doctor.first_name, doctor.last_name));
                view.doctor_specialization = doctor.specialization.clone();
            }
        }

        Ok(views)
    }

    /// Single prescription by id, fully resolved. Serves the public
    /// share/lookup route.
    pub async fn get_prescription(&self, id: i64) -> Result<PrescriptionView, PrescriptionError> {
        debug!("Fetching prescription {}", id);

        let path = format!("/rest/v1/prescriptions?id=eq.{}", id);
        let prescriptions: Vec<PrescriptionRow> = self.db_get(&path).await?;

        let prescription = prescriptions
            .into_iter()
            .next()
            .ok_or(PrescriptionError::NotFound)?;

        let rows = vec![prescription.clone()];
        let mut views = self.base_views(&rows).await?;
        let mut view = views.remove(0);

        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=id,first_name,last_name,specialization",
            prescription.doctor_id
        );
        let doctors: Vec<DoctorNameRow> = self.db_get(&path).await?;
        if let Some(doctor) = doctors.into_iter().next() {
            view.doctor_name = Some(format!("Dr. {} {}", doctor.first_name, doctor.last_name));
            view.doctor_specialization = doctor.specialization;
        }

        let path = format!(
            "/rest/v1/patients?id=eq.{}&select=id,first_name,last_name",
            prescription.patient_id
        );
        let patients: Vec<PatientNameRow> = self.db_get(&path).await?;
        if let Some(patient) = patients.into_iter().next() {
            view.patient_name = Some(format!("{} {}", patient.first_name, patient.last_name));
        }

        Ok(view)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn db_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, PrescriptionError> {
        self.db
            .request(Method::GET, path, None)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))
    }

    async fn get_owned_appointment(
        &self,
        doctor_id: i64,
        appointment_id: i64,
    ) -> Result<AppointmentSlotRow, PrescriptionError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&doctor_id=eq.{}&select=id,doctor_id,patient_id,appointment_date,appointment_time,status",
            appointment_id, doctor_id
        );
        let rows: Vec<AppointmentSlotRow> = self.db_get(&path).await?;

        rows.into_iter()
            .next()
            .ok_or(PrescriptionError::AppointmentNotFound)
    }

    /// Views with appointment date/time and medications attached; name
    /// enrichment is left to the caller.
    async fn base_views(
        &self,
        prescriptions: &[PrescriptionRow],
    ) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        let appointment_ids = Self::join_ids(prescriptions.iter().map(|p| p.appointment_id));
        let path = format!(
            "/rest/v1/appointments?id=in.({})&select=id,doctor_id,patient_id,appointment_date,appointment_time,status",
            appointment_ids
        );
        let appointments: Vec<AppointmentSlotRow> = self.db_get(&path).await?;
        let appointments_by_id: HashMap<i64, AppointmentSlotRow> =
            appointments.into_iter().map(|a| (a.id, a)).collect();

        let prescription_ids = Self::join_ids(prescriptions.iter().map(|p| p.id));
        let path = format!(
            "/rest/v1/prescription_medications?prescription_id=in.({})",
            prescription_ids
        );
        let medications: Vec<MedicationRow> = self.db_get(&path).await?;

        let mut medications_by_prescription: HashMap<i64, Vec<MedicationRow>> = HashMap::new();
        for medication in medications {
            medications_by_prescription
                .entry(medication.prescription_id)
                .or_default()
                .push(medication);
        }

        let views = prescriptions
            .iter()
            .map(|row| {
                let appointment = appointments_by_id.get(&row.appointment_id);
                PrescriptionView {
                    id: row.id,
                    diagnosis: row.diagnosis.clone(),
                    instructions: row.instructions.clone(),
                    notes: row.notes.clone(),
                    date: row.created_at,
                    appointment_date: appointment.map(|a| a.appointment_date),
                    appointment_time: appointment.map(|a| a.appointment_time),
                    patient_name: None,
                    doctor_name: None,
                    doctor_specialization: None,
                    medications: medications_by_prescription
                        .remove(&row.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(MedicationRow::into_view)
                        .collect(),
                }
            })
            .collect();

        Ok(views)
    }

    fn join_ids(ids: impl Iterator<Item = i64>) -> String {
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
