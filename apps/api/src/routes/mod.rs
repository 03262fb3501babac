pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::discovery::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/sessions/:session_id/search",
            post(handlers::handle_search),
        )
        .route(
            "/api/v1/sessions/:session_id/view",
            post(handlers::handle_view),
        )
        .route(
            "/api/v1/sessions/:session_id/jobs/:job_id/select",
            post(handlers::handle_select_job),
        )
        .route(
            "/api/v1/sessions/:session_id/detail/close",
            post(handlers::handle_close_detail),
        )
        .route(
            "/api/v1/sessions/:session_id/jobs/:job_id/save",
            post(handlers::handle_toggle_save),
        )
        .route(
            "/api/v1/sessions/:session_id/saved",
            get(handlers::handle_saved_jobs),
        )
        .with_state(state)
}
