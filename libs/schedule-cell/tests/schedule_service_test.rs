mod common;

use assert_matches::assert_matches;
use uuid::Uuid;

use schedule_cell::models::{ScheduleDraft, ScheduleError, ScheduleKind};
use schedule_cell::services::{OverlapChecker, OverlapPolicy, ScheduleService};

use common::{date, one_off, weekly, InMemoryScheduleStore};

fn draft(day_of_week: Option<i32>, on: Option<&str>, start: &str, end: &str) -> ScheduleDraft {
    ScheduleDraft {
        day_of_week,
        date: on.map(date),
        start_time: start.to_string(),
        end_time: end.to_string(),
        ..ScheduleDraft::default()
    }
}

fn service(store: &InMemoryScheduleStore) -> ScheduleService<InMemoryScheduleStore> {
    ScheduleService::new(store.clone(), OverlapChecker::default())
}

#[tokio::test]
async fn create_rejects_a_one_off_clashing_with_a_standing_weekday() {
    let doctor = Uuid::new_v4();
    let store = InMemoryScheduleStore::with_entries(vec![weekly(doctor, 1, "09:00", "13:00")]);

    // 2025-06-23 is a Monday.
    let result = service(&store)
        .create(doctor, draft(None, Some("2025-06-23"), "12:00", "14:00"))
        .await;
    assert_matches!(result, Err(ScheduleError::Overlap));
    assert_eq!(store.snapshot().len(), 1);

    let created = service(&store)
        .create(doctor, draft(None, Some("2025-06-23"), "14:00", "16:00"))
        .await
        .unwrap();
    assert!(created.id.is_some());
    assert_eq!(created.kind, ScheduleKind::Specific { date: date("2025-06-23") });
    assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn other_doctors_schedules_do_not_block() {
    let busy = Uuid::new_v4();
    let free = Uuid::new_v4();
    let store = InMemoryScheduleStore::with_entries(vec![weekly(busy, 4, "09:00", "17:00")]);

    let created = service(&store)
        .create(free, draft(Some(4), None, "09:00", "17:00"))
        .await
        .unwrap();
    assert_eq!(created.doctor_id, free);
}

#[tokio::test]
async fn create_rejects_malformed_drafts_before_touching_the_store() {
    let store = InMemoryScheduleStore::unreachable();
    let doctor = Uuid::new_v4();

    assert_matches!(
        service(&store).create(doctor, draft(Some(1), Some("2025-06-23"), "09:00", "10:00")).await,
        Err(ScheduleError::AmbiguousKind)
    );
    assert_matches!(
        service(&store).create(doctor, draft(None, None, "09:00", "10:00")).await,
        Err(ScheduleError::MissingKind)
    );
    assert_matches!(
        service(&store).create(doctor, draft(Some(1), None, "10:00", "09:00")).await,
        Err(ScheduleError::InvalidTimeWindow { .. })
    );
    assert_matches!(
        service(&store).create(doctor, draft(Some(0), None, "09:00", "10:00")).await,
        Err(ScheduleError::InvalidDayOfWeek(0))
    );
}

#[tokio::test]
async fn update_excludes_the_edited_entry_but_not_its_siblings() {
    let doctor = Uuid::new_v4();
    let morning = weekly(doctor, 3, "09:00", "11:00");
    let afternoon = weekly(doctor, 3, "13:00", "15:00");
    let morning_id = morning.id.unwrap();
    let store = InMemoryScheduleStore::with_entries(vec![morning, afternoon]);

    let stretched = service(&store)
        .update(morning_id, draft(Some(3), None, "08:00", "12:00"))
        .await
        .unwrap();
    assert_eq!(stretched.id, Some(morning_id));
    assert_eq!(stretched.window.start().to_string(), "08:00:00");

    let result = service(&store)
        .update(morning_id, draft(Some(3), None, "08:00", "14:00"))
        .await;
    assert_matches!(result, Err(ScheduleError::Overlap));
}

#[tokio::test]
async fn update_keeps_the_owning_doctor() {
    let doctor = Uuid::new_v4();
    let entry = one_off(doctor, "2025-06-18", "09:00", "10:00");
    let id = entry.id.unwrap();
    let store = InMemoryScheduleStore::with_entries(vec![entry]);

    let updated = service(&store)
        .update(id, draft(Some(5), None, "09:00", "10:00"))
        .await
        .unwrap();

    assert_eq!(updated.doctor_id, doctor);
    assert_eq!(store.snapshot()[0].kind, updated.kind);
}

#[tokio::test]
async fn update_of_missing_schedule_is_not_found() {
    let store = InMemoryScheduleStore::default();
    let id = Uuid::new_v4();

    let result = service(&store).update(id, draft(Some(1), None, "09:00", "10:00")).await;
    assert_matches!(result, Err(ScheduleError::NotFound(missing)) if missing == id);
}

#[tokio::test]
async fn dry_run_check_reports_without_writing() {
    let doctor = Uuid::new_v4();
    let existing = one_off(doctor, "2025-06-18", "09:00", "11:00");
    let existing_id = existing.id;
    let store = InMemoryScheduleStore::with_entries(vec![existing]);

    assert!(service(&store).check(doctor, draft(Some(3), None, "10:00", "12:00")).await.unwrap());
    assert!(!service(&store).check(doctor, draft(Some(3), None, "11:00", "12:00")).await.unwrap());

    let mut editing = draft(None, Some("2025-06-18"), "09:30", "10:30");
    editing.id = existing_id;
    assert!(!service(&store).check(doctor, editing).await.unwrap());

    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn unavailable_entries_block_unless_configured_otherwise() {
    let doctor = Uuid::new_v4();
    let mut paused = weekly(doctor, 2, "09:00", "12:00");
    paused.metadata.is_available = false;
    let store = InMemoryScheduleStore::with_entries(vec![paused]);

    assert_matches!(
        service(&store).create(doctor, draft(Some(2), None, "10:00", "11:00")).await,
        Err(ScheduleError::Overlap)
    );

    let lenient = ScheduleService::new(
        store.clone(),
        OverlapChecker::new(OverlapPolicy { include_unavailable: false }),
    );
    assert!(lenient.create(doctor, draft(Some(2), None, "10:00", "11:00")).await.is_ok());
}

#[tokio::test]
async fn delete_removes_the_entry() {
    let doctor = Uuid::new_v4();
    let entry = weekly(doctor, 6, "09:00", "12:00");
    let id = entry.id.unwrap();
    let store = InMemoryScheduleStore::with_entries(vec![entry]);

    service(&store).delete(id).await.unwrap();
    assert!(service(&store).list(doctor).await.unwrap().is_empty());
}

#[tokio::test]
async fn metadata_is_carried_through_create() {
    let doctor = Uuid::new_v4();
    let store = InMemoryScheduleStore::default();

    let mut rich = draft(Some(1), None, "08:00", "16:00");
    rich.break_start_time = Some("12:00".into());
    rich.break_end_time = Some("13:00".into());
    rich.slot_duration_minutes = Some(45);
    rich.max_appointments_per_slot = Some(2);
    rich.notes = Some("Orthodontics only".into());

    let created = service(&store).create(doctor, rich).await.unwrap();
    assert_eq!(created.metadata.slot_duration_minutes, 45);
    assert_eq!(created.metadata.max_appointments_per_slot, 2);
    assert_eq!(created.metadata.notes.as_deref(), Some("Orthodontics only"));
    assert_eq!(created.metadata.break_start.map(|t| t.to_string()).as_deref(), Some("12:00:00"));
    assert_eq!(created.metadata.break_end.map(|t| t.to_string()).as_deref(), Some("13:00:00"));
}

#[tokio::test]
async fn create_ignores_an_id_borrowed_from_a_stored_entry() {
    let doctor = Uuid::new_v4();
    let stored = weekly(doctor, 4, "09:00", "12:00");
    let store = InMemoryScheduleStore::with_entries(vec![stored.clone()]);

    let mut copy = draft(Some(4), None, "10:00", "11:00");
    copy.id = stored.id;

    assert!(!service(&store).check(doctor, copy.clone()).await.unwrap());

    let result = service(&store).create(doctor, copy).await;
    assert_matches!(result, Err(ScheduleError::Overlap));
    assert_eq!(store.snapshot().len(), 1);
}
