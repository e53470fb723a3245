use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{DayOfWeek, DoctorSummary, ScheduleDayMatch, ScheduleEntry, ScheduleError, ScheduleRow};

const SCHEDULES_PATH: &str = "/rest/v1/doctor_schedules";
const USERS_PATH: &str = "/rest/v1/users";

/// Persistence seam for schedule entries and the doctor directory.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Every entry owned by one doctor, ordered by date then start time.
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleEntry>, ScheduleError>;

    /// Day columns of every row whose `date` equals `date` OR whose
    /// `day_of_week` equals `day_of_week`. Rows are returned unvalidated.
    async fn find_by_date_or_weekday(
        &self,
        date: NaiveDate,
        day_of_week: DayOfWeek,
    ) -> Result<Vec<ScheduleDayMatch>, ScheduleError>;

    async fn get(&self, schedule_id: Uuid) -> Result<Option<ScheduleEntry>, ScheduleError>;

    async fn insert(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError>;

    async fn update(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError>;

    async fn delete(&self, schedule_id: Uuid) -> Result<(), ScheduleError>;

    /// Directory users among `ids` holding `role`.
    async fn find_doctors_by_role(
        &self,
        ids: &[Uuid],
        role: &str,
    ) -> Result<Vec<DoctorSummary>, ScheduleError>;
}

/// [`ScheduleStore`] backed by the hosted database's REST interface.
///
/// Requests carry the caller's access token so row-level policies apply.
pub struct SupabaseScheduleStore {
    supabase: SupabaseClient,
    auth_token: Option<String>,
}

impl SupabaseScheduleStore {
    pub fn new(config: &AppConfig, auth_token: Option<&str>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token: auth_token.map(String::from),
        }
    }

    async fn fetch_rows(&self, path: &str) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let rows: Vec<ScheduleRow> = self
            .supabase
            .request(Method::GET, path, self.auth_token.as_deref(), None)
            .await
            .map_err(upstream)?;

        into_entries(rows)
    }

    async fn write_row(
        &self,
        method: Method,
        path: &str,
        entry: &ScheduleEntry,
    ) -> Result<ScheduleEntry, ScheduleError> {
        let body = serde_json::to_value(ScheduleRow::from(entry))
            .map_err(|e| ScheduleError::Validation(e.to_string()))?;

        let rows: Vec<ScheduleRow> = self
            .supabase
            .request_with_headers(
                method,
                path,
                self.auth_token.as_deref(),
                Some(body),
                Some(return_representation()),
            )
            .await
            .map_err(upstream)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Upstream("Schedule write returned no rows".to_string()))?;

        into_entry(row)
    }
}

#[async_trait]
impl ScheduleStore for SupabaseScheduleStore {
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        debug!("Fetching schedules for doctor: {}", doctor_id);
        let path = format!(
            "{}?doctor_id=eq.{}&order=date.asc,start_time.asc",
            SCHEDULES_PATH, doctor_id
        );
        self.fetch_rows(&path).await
    }

    async fn find_by_date_or_weekday(
        &self,
        date: NaiveDate,
        day_of_week: DayOfWeek,
    ) -> Result<Vec<ScheduleDayMatch>, ScheduleError> {
        debug!("Fetching schedules on {} or every {}", date, day_of_week);
        let path = format!(
            "{}?select=doctor_id,day_of_week,date&or=(date.eq.{},day_of_week.eq.{})",
            SCHEDULES_PATH,
            date.format("%Y-%m-%d"),
            day_of_week.number()
        );

        self.supabase
            .request(Method::GET, &path, self.auth_token.as_deref(), None)
            .await
            .map_err(upstream)
    }

    async fn get(&self, schedule_id: Uuid) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let path = format!("{}?id=eq.{}", SCHEDULES_PATH, schedule_id);
        Ok(self.fetch_rows(&path).await?.into_iter().next())
    }

    async fn insert(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError> {
        let created = self.write_row(Method::POST, SCHEDULES_PATH, entry).await?;
        debug!("Schedule created with ID: {:?}", created.id);
        Ok(created)
    }

    async fn update(&self, entry: &ScheduleEntry) -> Result<ScheduleEntry, ScheduleError> {
        let id = entry
            .id
            .ok_or_else(|| ScheduleError::Validation("Cannot update a schedule without an id".to_string()))?;
        let path = format!("{}?id=eq.{}", SCHEDULES_PATH, id);
        self.write_row(Method::PATCH, &path, entry).await
    }

    async fn delete(&self, schedule_id: Uuid) -> Result<(), ScheduleError> {
        let path = format!("{}?id=eq.{}", SCHEDULES_PATH, schedule_id);
        self.supabase
            .execute(Method::DELETE, &path, self.auth_token.as_deref())
            .await
            .map_err(upstream)
    }

    async fn find_doctors_by_role(
        &self,
        ids: &[Uuid],
        role: &str,
    ) -> Result<Vec<DoctorSummary>, ScheduleError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let path = format!(
            "{}?select=id,full_name&id=in.({})&role_name=eq.{}",
            USERS_PATH,
            id_list,
            urlencoding::encode(role)
        );

        self.supabase
            .request(Method::GET, &path, self.auth_token.as_deref(), None)
            .await
            .map_err(upstream)
    }
}

fn into_entries(rows: Vec<ScheduleRow>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
    rows.into_iter().map(into_entry).collect()
}

/// A stored row that fails the structural invariant is a server-side data
/// problem, never the caller's input.
fn into_entry(row: ScheduleRow) -> Result<ScheduleEntry, ScheduleError> {
    let id = row.id.map_or_else(|| "<no id>".to_string(), |id| id.to_string());
    ScheduleEntry::try_from(row).map_err(|e| {
        error!("Stored schedule {} violates the schedule invariant: {}", id, e);
        ScheduleError::InvalidStoredRecord {
            id,
            reason: e.to_string(),
        }
    })
}

fn upstream(err: anyhow::Error) -> ScheduleError {
    ScheduleError::Upstream(err.to_string())
}
