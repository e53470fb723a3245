use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{DayOfWeek, DoctorSummary, ScheduleDayMatch, ScheduleError};
use crate::services::store::ScheduleStore;

/// Maps a calendar date to the doctors who have a schedule on that date.
pub struct AvailabilityResolver<S> {
    store: S,
    doctor_role: String,
}

impl<S: ScheduleStore> AvailabilityResolver<S> {
    pub fn new(store: S, doctor_role: impl Into<String>) -> Self {
        Self {
            store,
            doctor_role: doctor_role.into(),
        }
    }

    /// Doctors holding the configured role with at least one entry applying on `date`.
    ///
    /// An empty result means nobody is scheduled; store failures are returned
    /// as errors and never collapse into an empty list.
    pub async fn resolve_available_doctors(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<DoctorSummary>, ScheduleError> {
        let day_of_week = DayOfWeek::of(date);
        debug!("Resolving available doctors for {} ({})", date, day_of_week);

        let rows = self.store.find_by_date_or_weekday(date, day_of_week).await?;
        let doctor_ids = scheduled_doctor_ids(&rows, date);

        if doctor_ids.is_empty() {
            debug!("No schedules apply on {}", date);
            return Ok(Vec::new());
        }

        let mut doctors = self
            .store
            .find_doctors_by_role(&doctor_ids, &self.doctor_role)
            .await?;

        doctors.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        doctors.dedup_by_key(|doctor| doctor.id);

        debug!("{} doctor(s) available on {}", doctors.len(), date);
        Ok(doctors)
    }
}

/// Distinct owners of the rows that apply on `date`.
///
/// A row with no owner cannot make anyone available, so it is skipped.
pub fn scheduled_doctor_ids(rows: &[ScheduleDayMatch], date: NaiveDate) -> Vec<Uuid> {
    rows.iter()
        .filter(|row| row.applies_on(date))
        .filter_map(|row| {
            if row.doctor_id.is_none() {
                warn!("Skipping schedule on {} with no doctor assigned", date);
            }
            row.doctor_id
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
