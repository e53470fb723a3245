use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/available-doctors", get(handlers::get_available_doctors))
        .route(
            "/doctors/{doctor_id}",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route("/doctors/{doctor_id}/check", post(handlers::check_schedule))
        .route(
            "/{schedule_id}",
            put(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
