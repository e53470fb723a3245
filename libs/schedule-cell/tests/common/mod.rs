#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use schedule_cell::models::{DayOfWeek, DoctorSummary, ScheduleDayMatch, ScheduleEntry, ScheduleError, TimeWindow};
use schedule_cell::services::ScheduleStore;

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn window(start: &str, end: &str) -> TimeWindow {
    TimeWindow::parse(start, end).unwrap()
}

pub fn weekly(doctor: Uuid, day: i32, start: &str, end: &str) -> ScheduleEntry {
    ScheduleEntry::recurring(doctor, DayOfWeek::new(day).unwrap(), window(start, end)).with_id(Uuid::new_v4())
}

pub fn one_off(doctor: Uuid, on: &str, start: &str, end: &str) -> ScheduleEntry {
    ScheduleEntry::specific(doctor, date(on), window(start, end)).with_id(Uuid::new_v4())
}

#[derive(Clone)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub full_name: String,
    pub role: String,
}

/// In-process stand-in for the hosted database, cloneable so tests can inspect it afterwards.
#[derive(Clone, Default)]
pub struct InMemoryScheduleStore {
    pub entries: Arc<Mutex<Vec<ScheduleEntry>>>,
    pub directory: Arc<Mutex<Vec<DirectoryUser>>>,
    /// Rows the availability lookup sees but no typed entry can represent.
    pub unowned: Arc<Mutex<Vec<ScheduleDayMatch>>>,
    pub unreachable: bool,
}

impl InMemoryScheduleStore {
    pub fn with_entries(entries: Vec<ScheduleEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn add_user(&self, id: Uuid, full_name: &str, role: &str) {
        self.directory.lock().unwrap().push(DirectoryUser {
            id,
            full_name: full_name.to_string(),
            role: role.to_string(),
        });
    }

    pub fn add_unowned(&self, day_of_week: Option<i32>, date: Option<NaiveDate>) {
        self.unowned.lock().unwrap().push(ScheduleDayMatch {
            doctor_id: None,
            day_of_week,
            date,
        });
    }

    pub fn snapshot(&self) -> Vec<ScheduleEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn guard(&self) -> Result<(), ScheduleError> {
        if self.unreachable {
            Err(ScheduleError::Upstream("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        self.guard()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|e| e.doctor_id == doctor_id)
            .collect())
    }

    async fn find_by_date_or_weekday(
        &self,
        date: NaiveDate,
        day_of_week: DayOfWeek,
    ) -> Result<Vec<ScheduleDayMatch>, ScheduleError> {
        self.guard()?;
        let unowned = self.unowned.lock().unwrap().clone();
        Ok(self
            .snapshot()
            .iter()
            .map(ScheduleDayMatch::from)
            .chain(unowned)
            .filter(|row| row.date == Some(date) || row.day_of_week == Some(day_of_week.number()))
            .collect())
    }

    async fn get(&self, schedule_id: Uuid) -> Result<Option<ScheduleEntry>, ScheduleError> {
        self.guard()?;
        Ok(self.snapshot().into_iter().find(|e| e.id == Some(schedule_id)))
    }

    async fn insert(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError> {
        self.guard()?;
        let stored = entry.clone().with_id(Uuid::new_v4());
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError> {
        self.guard()?;
        let mut entries = self.entries.lock().unwrap();
        let slot = entries
            .iter_mut()
            .find(|e| e.id.is_some() && e.id == entry.id)
            .ok_or_else(|| ScheduleError::Upstream("row vanished".to_string()))?;
        *slot = entry.clone();
        Ok(entry.clone())
    }

    async fn delete(&self, schedule_id: Uuid) -> Result<(), ScheduleError> {
        self.guard()?;
        self.entries.lock().unwrap().retain(|e| e.id != Some(schedule_id));
        Ok(())
    }

    async fn find_doctors_by_role(&self, ids: &[Uuid], role: &str) -> Result<Vec<DoctorSummary>, ScheduleError> {
        self.guard()?;
        Ok(self
            .directory
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id) && u.role == role)
            .map(|u| DoctorSummary {
                id: u.id,
                full_name: Some(u.full_name.clone()),
            })
            .collect())
    }
}
