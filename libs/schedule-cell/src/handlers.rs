use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_staff;

use crate::models::{DayOfWeek, OverlapCheckResponse, ScheduleDraft, ScheduleRow};
use crate::services::{AvailabilityResolver, OverlapChecker, ScheduleService, SupabaseScheduleStore};

#[derive(Debug, Deserialize)]
pub struct AvailableDoctorsQuery {
    pub date: Option<NaiveDate>,
}

fn schedule_service(state: &AppConfig, token: &str) -> ScheduleService<SupabaseScheduleStore> {
    ScheduleService::new(
        SupabaseScheduleStore::new(state, Some(token)),
        OverlapChecker::from_config(state),
    )
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailableDoctorsQuery>,
) -> Result<Json<Value>, AppError> {
    // No date selected yet is not the same as nobody available.
    let date = query
        .date
        .ok_or_else(|| AppError::BadRequest("date is required".to_string()))?;

    let resolver = AvailabilityResolver::new(
        SupabaseScheduleStore::new(&state, Some(auth.token())),
        state.doctor_role_name.clone(),
    );

    let doctors = resolver.resolve_available_doctors(date).await?;

    Ok(Json(json!({
        "date": date,
        "day_of_week": DayOfWeek::of(date).number(),
        "doctors": doctors,
        "total": doctors.len()
    })))
}

// ==============================================================================
// SCHEDULE MANAGEMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let schedules = schedule_service(&state, auth.token()).list(doctor_id).await?;
    let rows: Vec<ScheduleRow> = schedules.iter().map(ScheduleRow::from).collect();

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "schedules": rows,
        "total": rows.len()
    })))
}

#[axum::debug_handler]
pub async fn check_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(draft): Json<ScheduleDraft>,
) -> Result<Json<OverlapCheckResponse>, AppError> {
    let conflict = schedule_service(&state, auth.token()).check(doctor_id, draft).await?;
    Ok(Json(OverlapCheckResponse { conflict }))
}

#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(draft): Json<ScheduleDraft>,
) -> Result<(StatusCode, Json<ScheduleRow>), AppError> {
    require_staff(&user)?;

    let created = schedule_service(&state, auth.token()).create(doctor_id, draft).await?;
    Ok((StatusCode::CREATED, Json(ScheduleRow::from(&created))))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(draft): Json<ScheduleDraft>,
) -> Result<Json<ScheduleRow>, AppError> {
    require_staff(&user)?;

    let updated = schedule_service(&state, auth.token()).update(schedule_id, draft).await?;
    Ok(Json(ScheduleRow::from(&updated)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(schedule_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_staff(&user)?;

    schedule_service(&state, auth.token()).delete(schedule_id).await?;
    Ok(Json(json!({ "success": true })))
}
