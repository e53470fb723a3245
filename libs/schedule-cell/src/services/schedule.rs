use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{ScheduleDraft, ScheduleEntry, ScheduleError};
use crate::services::overlap::OverlapChecker;
use crate::services::store::ScheduleStore;

/// Schedule management for one doctor at a time, enforcing the no-overlap rule.
///
/// The check runs against a fresh read of the doctor's entries; two concurrent
/// writers can still both pass it, nothing re-validates inside the store.
pub struct ScheduleService<S> {
    store: S,
    checker: OverlapChecker,
}

impl<S: ScheduleStore> ScheduleService<S> {
    pub fn new(store: S, checker: OverlapChecker) -> Self {
        Self { store, checker }
    }

    pub async fn list(&self, doctor_id: Uuid) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        self.store.list_for_doctor(doctor_id).await
    }

    /// Dry run: would saving `draft` for `doctor_id` clash with an existing entry?
    pub async fn check(&self, doctor_id: Uuid, draft: ScheduleDraft) -> Result<bool, ScheduleError> {
        let id = draft.id;
        let candidate = draft.into_entry(doctor_id, id)?;
        let existing = self.store.list_for_doctor(doctor_id).await?;
        Ok(self.checker.has_conflict(&candidate, &existing))
    }

    /// Any `id` on the draft is ignored; the candidate is compared as a new entry.
    pub async fn create(&self, doctor_id: Uuid, draft: ScheduleDraft) -> Result<ScheduleEntry, ScheduleError> {
        debug!("Creating schedule for doctor: {}", doctor_id);

        let candidate = draft.into_entry(doctor_id, None)?;
        self.ensure_no_conflict(&candidate).await?;

        self.store.insert(&candidate).await
    }

    pub async fn update(&self, schedule_id: Uuid, draft: ScheduleDraft) -> Result<ScheduleEntry, ScheduleError> {
        debug!("Updating schedule: {}", schedule_id);

        let current = self
            .store
            .get(schedule_id)
            .await?
            .ok_or(ScheduleError::NotFound(schedule_id))?;

        // Schedules stay with the doctor they were created for.
        let candidate = draft.into_entry(current.doctor_id, Some(schedule_id))?;
        self.ensure_no_conflict(&candidate).await?;

        self.store.update(&candidate).await
    }

    pub async fn delete(&self, schedule_id: Uuid) -> Result<(), ScheduleError> {
        debug!("Deleting schedule: {}", schedule_id);
        self.store.delete(schedule_id).await
    }

    async fn ensure_no_conflict(&self, candidate: &ScheduleEntry) -> Result<(), ScheduleError> {
        let existing = self.store.list_for_doctor(candidate.doctor_id).await?;

        if let Some(clash) = self.checker.find_conflict(candidate, &existing) {
            warn!(
                "Rejected schedule {} {} for doctor {}: clashes with {:?} ({} {})",
                candidate.kind, candidate.window, candidate.doctor_id, clash.id, clash.kind, clash.window
            );
            return Err(ScheduleError::Overlap);
        }

        Ok(())
    }
}
