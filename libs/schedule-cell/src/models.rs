use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

pub const DEFAULT_SLOT_DURATION_MINUTES: i32 = 30;
pub const DEFAULT_MAX_APPOINTMENTS_PER_SLOT: i32 = 1;

const TIME_FORMAT: &str = "%H:%M:%S";

// ==============================================================================
// TIME OF DAY
// ==============================================================================

/// Parses `HH:MM` (form input) or `HH:MM:SS` (database output).
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ScheduleError::Validation(format!("'{}' is not a valid time of day", raw)))
}

pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// A non-empty window within one day, compared as the half-open range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Touching windows (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

// ==============================================================================
// WEEKDAY
// ==============================================================================

/// ISO weekday number: 1 = Monday … 7 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const MONDAY: DayOfWeek = DayOfWeek(1);
    pub const TUESDAY: DayOfWeek = DayOfWeek(2);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(3);
    pub const THURSDAY: DayOfWeek = DayOfWeek(4);
    pub const FRIDAY: DayOfWeek = DayOfWeek(5);
    pub const SATURDAY: DayOfWeek = DayOfWeek(6);
    pub const SUNDAY: DayOfWeek = DayOfWeek(7);

    pub fn new(number: i32) -> Result<Self, ScheduleError> {
        match number {
            1..=7 => Ok(Self(number as u8)),
            other => Err(ScheduleError::InvalidDayOfWeek(other)),
        }
    }

    /// The only place calendar dates are mapped onto schedule weekdays.
    pub fn of(date: NaiveDate) -> Self {
        Self(date.weekday().number_from_monday() as u8)
    }

    pub fn number(self) -> i32 {
        self.0 as i32
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            6 => "Saturday",
            _ => "Sunday",
        }
    }
}

impl TryFrom<i32> for DayOfWeek {
    type Error = ScheduleError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayOfWeek> for i32 {
    fn from(day: DayOfWeek) -> Self {
        day.number()
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==============================================================================
// SCHEDULE ENTRY
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    /// Repeats every week on the given weekday.
    Recurring { day_of_week: DayOfWeek },
    /// Applies on one calendar date only.
    Specific { date: NaiveDate },
}

impl ScheduleKind {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match *self {
            ScheduleKind::Recurring { day_of_week } => DayOfWeek::of(date) == day_of_week,
            ScheduleKind::Specific { date: own } => own == date,
        }
    }

    /// Whether two entries can ever fall on the same concrete calendar day.
    pub fn shares_day_with(&self, other: &ScheduleKind) -> bool {
        match (*self, *other) {
            (ScheduleKind::Recurring { day_of_week: a }, ScheduleKind::Recurring { day_of_week: b }) => a == b,
            (ScheduleKind::Specific { date: a }, ScheduleKind::Specific { date: b }) => a == b,
            (ScheduleKind::Recurring { day_of_week }, ScheduleKind::Specific { date })
            | (ScheduleKind::Specific { date }, ScheduleKind::Recurring { day_of_week }) => {
                DayOfWeek::of(date) == day_of_week
            }
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleKind::Recurring { day_of_week } => write!(f, "every {}", day_of_week),
            ScheduleKind::Specific { date } => write!(f, "on {}", date),
        }
    }
}

/// Carried through unchanged; only `is_available` is ever consulted, and only by policy.
///
/// Stored rows are read as-is. [`ScheduleMetadata::validate`] runs on the write path only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleMetadata {
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub slot_duration_minutes: i32,
    pub max_appointments_per_slot: i32,
    pub is_available: bool,
    pub notes: Option<String>,
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            break_start: None,
            break_end: None,
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            max_appointments_per_slot: DEFAULT_MAX_APPOINTMENTS_PER_SLOT,
            is_available: true,
            notes: None,
        }
    }
}

impl ScheduleMetadata {
    /// Rules for metadata submitted by staff; the break must sit inside `window`.
    pub fn validate(&self, window: &TimeWindow) -> Result<(), ScheduleError> {
        match (self.break_start, self.break_end) {
            (None, None) => {}
            (Some(start), Some(end)) => {
                let brk = TimeWindow::new(start, end)?;
                if !window.contains(&brk) {
                    return Err(ScheduleError::Validation(format!(
                        "Break {} must lie within working hours {}",
                        brk, window
                    )));
                }
            }
            _ => {
                return Err(ScheduleError::Validation(
                    "Break start and end must be given together".to_string(),
                ))
            }
        }

        if self.slot_duration_minutes <= 0 {
            return Err(ScheduleError::Validation("Slot duration must be positive".to_string()));
        }
        if self.max_appointments_per_slot <= 0 {
            return Err(ScheduleError::Validation(
                "Max appointments per slot must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// `None` until the entry has been persisted.
    pub id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub kind: ScheduleKind,
    pub window: TimeWindow,
    pub metadata: ScheduleMetadata,
}

impl ScheduleEntry {
    pub fn recurring(doctor_id: Uuid, day_of_week: DayOfWeek, window: TimeWindow) -> Self {
        Self {
            id: None,
            doctor_id,
            kind: ScheduleKind::Recurring { day_of_week },
            window,
            metadata: ScheduleMetadata::default(),
        }
    }

    pub fn specific(doctor_id: Uuid, date: NaiveDate, window: TimeWindow) -> Self {
        Self {
            id: None,
            doctor_id,
            kind: ScheduleKind::Specific { date },
            window,
            metadata: ScheduleMetadata::default(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_metadata(mut self, metadata: ScheduleMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.kind.applies_on(date)
    }
}

// ==============================================================================
// WIRE SHAPES
// ==============================================================================

/// Row shape of the hosted `doctor_schedules` table, where the variant is
/// implied by which of `day_of_week` / `date` is non-null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub doctor_id: Option<Uuid>,
    #[serde(default)]
    pub day_of_week: Option<i32>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub break_start_time: Option<String>,
    #[serde(default)]
    pub break_end_time: Option<String>,
    #[serde(default)]
    pub slot_duration_minutes: Option<i32>,
    #[serde(default)]
    pub max_appointments_per_slot: Option<i32>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Checks the structural invariant only: an owner, exactly one of
/// `day_of_week` / `date`, and a non-empty working window.
impl TryFrom<ScheduleRow> for ScheduleEntry {
    type Error = ScheduleError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        let doctor_id = row
            .doctor_id
            .ok_or_else(|| ScheduleError::Validation("Schedule is not assigned to a doctor".to_string()))?;

        let kind = match (row.day_of_week, row.date) {
            (Some(_), Some(_)) => return Err(ScheduleError::AmbiguousKind),
            (None, None) => return Err(ScheduleError::MissingKind),
            (Some(day), None) => ScheduleKind::Recurring { day_of_week: DayOfWeek::new(day)? },
            (None, Some(date)) => ScheduleKind::Specific { date },
        };

        let window = TimeWindow::parse(&row.start_time, &row.end_time)?;

        Ok(ScheduleEntry {
            id: row.id,
            doctor_id,
            kind,
            window,
            metadata: ScheduleMetadata {
                break_start: row.break_start_time.as_deref().map(parse_time_of_day).transpose()?,
                break_end: row.break_end_time.as_deref().map(parse_time_of_day).transpose()?,
                slot_duration_minutes: row.slot_duration_minutes.unwrap_or(DEFAULT_SLOT_DURATION_MINUTES),
                max_appointments_per_slot: row
                    .max_appointments_per_slot
                    .unwrap_or(DEFAULT_MAX_APPOINTMENTS_PER_SLOT),
                is_available: row.is_available.unwrap_or(true),
                notes: row.notes,
            },
        })
    }
}

impl From<&ScheduleEntry> for ScheduleRow {
    fn from(entry: &ScheduleEntry) -> Self {
        let (day_of_week, date) = match entry.kind {
            ScheduleKind::Recurring { day_of_week } => (Some(day_of_week.number()), None),
            ScheduleKind::Specific { date } => (None, Some(date)),
        };

        Self {
            id: entry.id,
            doctor_id: Some(entry.doctor_id),
            day_of_week,
            date,
            start_time: format_time_of_day(entry.window.start()),
            end_time: format_time_of_day(entry.window.end()),
            break_start_time: entry.metadata.break_start.map(format_time_of_day),
            break_end_time: entry.metadata.break_end.map(format_time_of_day),
            slot_duration_minutes: Some(entry.metadata.slot_duration_minutes),
            max_appointments_per_slot: Some(entry.metadata.max_appointments_per_slot),
            is_available: Some(entry.metadata.is_available),
            notes: entry.metadata.notes.clone(),
        }
    }
}

/// Body posted by the schedule form for create, update and dry-run checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleDraft {
    /// Present when editing; lets a dry-run check skip the entry being edited.
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub day_of_week: Option<i32>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub break_start_time: Option<String>,
    #[serde(default)]
    pub break_end_time: Option<String>,
    #[serde(default)]
    pub slot_duration_minutes: Option<i32>,
    #[serde(default)]
    pub max_appointments_per_slot: Option<i32>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ScheduleDraft {
    /// Validated factory for submitted schedules, metadata rules included.
    pub fn into_entry(self, doctor_id: Uuid, id: Option<Uuid>) -> Result<ScheduleEntry, ScheduleError> {
        let entry = ScheduleEntry::try_from(ScheduleRow {
            id,
            doctor_id: Some(doctor_id),
            day_of_week: self.day_of_week,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            break_start_time: self.break_start_time,
            break_end_time: self.break_end_time,
            slot_duration_minutes: self.slot_duration_minutes,
            max_appointments_per_slot: self.max_appointments_per_slot,
            is_available: self.is_available,
            notes: self.notes,
        })?;

        entry.metadata.validate(&entry.window)?;
        Ok(entry)
    }
}

/// The columns that decide which day a stored schedule applies to.
///
/// Availability only needs these, so a row with broken times or metadata
/// still counts, and a row without an owner is skipped rather than fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDayMatch {
    #[serde(default)]
    pub doctor_id: Option<Uuid>,
    #[serde(default)]
    pub day_of_week: Option<i32>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ScheduleDayMatch {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.date == Some(date) || self.day_of_week == Some(DayOfWeek::of(date).number())
    }
}

impl From<&ScheduleEntry> for ScheduleDayMatch {
    fn from(entry: &ScheduleEntry) -> Self {
        let row = ScheduleRow::from(entry);
        Self {
            doctor_id: row.doctor_id,
            day_of_week: row.day_of_week,
            date: row.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapCheckResponse {
    pub conflict: bool,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeWindow { start: NaiveTime, end: NaiveTime },

    #[error("Day of week must be between 1 (Monday) and 7 (Sunday), got {0}")]
    InvalidDayOfWeek(i32),

    #[error("A schedule must set either day_of_week or date, not both")]
    AmbiguousKind,

    #[error("A schedule must set either day_of_week or date")]
    MissingKind,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schedule times conflict with an existing entry")]
    Overlap,

    #[error("Schedule not found: {0}")]
    NotFound(Uuid),

    #[error("Schedule store request failed: {0}")]
    Upstream(String),

    #[error("Stored schedule {id} is invalid: {reason}")]
    InvalidStoredRecord { id: String, reason: String },
}

impl ScheduleError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ScheduleError::InvalidTimeWindow { .. }
                | ScheduleError::InvalidDayOfWeek(_)
                | ScheduleError::AmbiguousKind
                | ScheduleError::MissingKind
                | ScheduleError::Validation(_)
        )
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        if err.is_invalid_input() {
            return AppError::ValidationError(err.to_string());
        }

        match err {
            ScheduleError::Overlap => AppError::Conflict(err.to_string()),
            ScheduleError::NotFound(_) => AppError::NotFound(err.to_string()),
            ScheduleError::Upstream(msg) => AppError::ExternalService(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
