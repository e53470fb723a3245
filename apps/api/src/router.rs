use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use schedule_cell::router::schedule_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental clinic schedule API is running!" }))
        .nest("/schedules", schedule_routes(state))
}
