pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dashboard::handlers as dashboard;
use crate::interviews::handlers as interviews;
use crate::practice::handlers as practice;
use crate::screening::handlers as screening;
use crate::state::AppState;
use crate::webhook::handlers as webhook;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Screening
        .route("/api/screening/runs", post(screening::handle_create_run))
        .route("/api/screening/runs/:id", get(screening::handle_get_run))
        // Scheduling webhook
        .route(
            "/api/webhooks/scheduling",
            post(webhook::handle_scheduling_webhook),
        )
        // Interviews
        .route(
            "/api/interviews/:id/run",
            post(interviews::handle_run_interview),
        )
        .route("/api/voice/events", post(interviews::handle_voice_event))
        // Practice
        .route(
            "/api/practice/interviews",
            post(practice::handle_create_practice).get(practice::handle_list_practice),
        )
        .route(
            "/api/practice/interviews/:id/feedback",
            post(practice::handle_create_feedback).get(practice::handle_get_feedback),
        )
        // Dashboard
        .route("/api/dashboard", get(dashboard::handle_dashboard))
        .route("/api/dashboard/stats", get(dashboard::handle_statistics))
        .with_state(state)
}
