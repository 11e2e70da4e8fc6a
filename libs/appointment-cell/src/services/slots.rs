use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use tracing::debug;

use shared_database::postgrest::PostgrestClient;

use crate::models::{AppointmentError, BusySlotRow, SlotAvailability};

/// Working day bounds for bookable slots.
pub const WORKING_DAY_START: (u32, u32) = (9, 0);
pub const WORKING_DAY_END: (u32, u32) = (17, 0);
pub const SLOT_MINUTES: u32 = 30;

pub struct SlotAvailabilityService {
    db: Arc<PostgrestClient>,
}

impl SlotAvailabilityService {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self { db }
    }

    /// Every bookable start time: 09:00 through 16:30 in half-hour steps.
    pub fn slot_grid() -> Vec<NaiveTime> {
        let mut slots = Vec::new();
        let start = WORKING_DAY_START.0 * 60 + WORKING_DAY_START.1;
        let end = WORKING_DAY_END.0 * 60 + WORKING_DAY_END.1;

        let mut minutes = start;
        while minutes < end {
            slots.push(
                NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
                    .expect("grid time is always valid"),
            );
            minutes += SLOT_MINUTES;
        }

        slots
    }

    /// Whether a requested time lands exactly on the bookable grid.
    pub fn is_bookable_time(time: NaiveTime) -> bool {
        Self::slot_grid().contains(&time)
    }

    /// Times already held on a doctor/date by any non-cancelled appointment.
    pub async fn occupied_times(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AppointmentError> {
        debug!("Fetching occupied slots for doctor {} on {}", doctor_id, date);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=neq.cancelled&select=appointment_time",
            doctor_id, date
        );

        let rows: Vec<BusySlotRow> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.appointment_time).collect())
    }

    /// Occupied times plus the bookable complement of the grid.
    pub async fn availability(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<SlotAvailability, AppointmentError> {
        let busy_slots = self.occupied_times(doctor_id, date).await?;

        let available_slots = Self::slot_grid()
            .into_iter()
            .filter(|slot| !busy_slots.contains(slot))
            .collect();

        Ok(SlotAvailability {
            busy_slots,
            available_slots,
        })
    }
}
