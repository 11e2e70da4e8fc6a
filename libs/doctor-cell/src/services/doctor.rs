use std::collections::HashMap;

use anyhow::Result;
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{
    DoctorAppointmentRow, DoctorProfileRow, DoctorView, PatientContactRow, PatientHistoryEntry,
    PatientSummary, PrescriptionLinkRow,
};

pub struct DoctorDirectoryService {
    db: PostgrestClient,
}

impl DoctorDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Every registered doctor, public profile fields only.
    pub async fn list_doctors(&self) -> Result<Vec<DoctorView>> {
        debug!("Fetching doctor directory");

        let path = "/rest/v1/doctors?select=id,first_name,last_name,specialization,experience,qualifications&order=last_name.asc";

        let rows: Vec<DoctorProfileRow> = self.db.request(Method::GET, path, None).await?;
        Ok(rows.into_iter().map(DoctorProfileRow::into_view).collect())
    }

    /// Distinct patients who have appointments with this doctor, with visit
    /// counts and the most recent visit date, newest first.
    pub async fn patients_for_doctor(&self, doctor_id: i64) -> Result<Vec<PatientSummary>> {
        debug!("Fetching patient roster for doctor {}", doctor_id);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&select=id,patient_id,appointment_date,appointment_time,reason,status",
            doctor_id
        );
        let appointments: Vec<DoctorAppointmentRow> = self.db.request(Method::GET, &path, None).await?;

        if appointments.is_empty() {
            return Ok(vec![]);
        }

        // Aggregate per patient: appointment count and latest visit date.
        let mut count_by_patient: HashMap<i64, i64> = HashMap::new();
        let mut last_visit_by_patient: HashMap<i64, chrono::NaiveDate> = HashMap::new();

        for appointment in &appointments {
            *count_by_patient.entry(appointment.patient_id).or_insert(0) += 1;

            let entry = last_visit_by_patient
                .entry(appointment.patient_id)
                .or_insert(appointment.appointment_date);
            if appointment.appointment_date > *entry {
                *entry = appointment.appointment_date;
            }
        }

        let ids = count_by_patient
            .keys()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!(
            "/rest/v1/patients?id=in.({})&select=id,email,first_name,last_name,date_of_birth,phone",
            ids
        );
        let patients: Vec<PatientContactRow> = self.db.request(Method::GET, &path, None).await?;

        let mut summaries: Vec<PatientSummary> = patients
            .into_iter()
            .map(|patient| PatientSummary {
                appointment_count: count_by_patient.get(&patient.id).copied().unwrap_or(0),
                last_visit: last_visit_by_patient.get(&patient.id).copied(),
                id: patient.id,
                first_name: patient.first_name,
                last_name: patient.last_name,
                email: patient.email,
                phone: patient.phone,
                date_of_birth: patient.date_of_birth,
            })
            .collect();

        summaries.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));

        Ok(summaries)
    }

    /// A patient's appointment history with this doctor, joined against any
    /// issued prescriptions, newest first.
    pub async fn patient_history(
        &self,
        doctor_id: i64,
        patient_id: i64,
    ) -> Result<Vec<PatientHistoryEntry>> {
        debug!(
            "Fetching history for patient {} with doctor {}",
            patient_id, doctor_id
        );

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&patient_id=eq.{}&select=id,patient_id,appointment_date,appointment_time,reason,status&order=appointment_date.desc,appointment_time.desc",
            doctor_id, patient_id
        );
        let appointments: Vec<DoctorAppointmentRow> = self.db.request(Method::GET, &path, None).await?;

        if appointments.is_empty() {
            return Ok(vec![]);
        }

        let appointment_ids = appointments
            .iter()
            .map(|a| a.id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!(
            "/rest/v1/prescriptions?appointment_id=in.({})&select=id,appointment_id,diagnosis",
            appointment_ids
        );
        let prescriptions: Vec<PrescriptionLinkRow> = self.db.request(Method::GET, &path, None).await?;

        let by_appointment: HashMap<i64, PrescriptionLinkRow> = prescriptions
            .into_iter()
            .map(|p| (p.appointment_id, p))
            .collect();

        let history = appointments
            .into_iter()
            .map(|appointment| {
                let prescription = by_appointment.get(&appointment.id);
                PatientHistoryEntry {
                    id: appointment.id,
                    date: appointment.appointment_date,
                    time: appointment.appointment_time,
                    reason: appointment.reason,
                    status: appointment.status,
                    prescription_id: prescription.map(|p| p.id),
                    diagnosis: prescription.map(|p| p.diagnosis.clone()),
                    has_prescription: prescription.is_some(),
                }
            })
            .collect();

        Ok(history)
    }
}
