use std::time::Duration;

use axum::{
    http::{
        header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use axum::extract::State;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::jwt::jwt_middleware;
use crate::routes::{enrollments, finalization, leaderboard, rankings, results, schedule, tournaments};
use crate::state::AppState;

/// Builds the academy tournament engine's REST surface (spec.md §6.1).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tournaments", post(tournaments::create).get(tournaments::list))
        .route(
            "/tournaments/{id}",
            get(tournaments::get).patch(tournaments::patch).delete(tournaments::delete),
        )
        .route("/tournaments/{id}/status", patch(tournaments::change_status))
        .route("/tournaments/{id}/status-history", get(tournaments::status_history_list))
        .route("/tournaments/{id}/summary", get(tournaments::summary))
        .route("/tournaments/{id}/enroll", post(enrollments::enroll))
        .route("/tournaments/{id}/unenroll", delete(enrollments::unenroll))
        .route("/tournaments/{id}/enrollments", get(enrollments::list))
        .route("/tournaments/{id}/admin/batch-enroll", post(enrollments::batch_approve))
        .route("/tournaments/{id}/generate-sessions", post(schedule::generate))
        .route("/tournaments/{id}/preview-sessions", get(schedule::preview))
        .route(
            "/tournaments/{id}/sessions",
            get(schedule::list).delete(schedule::delete_all),
        )
        .route(
            "/tournaments/{id}/campus-schedules",
            put(schedule::upsert_campus_schedule).get(schedule::list_campus_schedules),
        )
        .route(
            "/tournaments/{id}/campus-schedules/{campus_id}",
            delete(schedule::delete_campus_schedule),
        )
        .route(
            "/tournaments/{id}/schedule-config",
            patch(schedule::patch_schedule_config).get(schedule::get_schedule_config),
        )
        .route(
            "/tournaments/{id}/sessions/{sid}/submit-results",
            post(results::submit_head_to_head),
        )
        .route(
            "/tournaments/{id}/sessions/{sid}/results",
            patch(results::legacy_update_results),
        )
        .route(
            "/tournaments/{id}/sessions/{sid}/rounds/{r}/submit-results",
            post(results::submit_round),
        )
        .route("/tournaments/{id}/sessions/{sid}/rounds", get(results::get_rounds))
        .route("/tournaments/{id}/sessions/{sid}/finalize", post(finalization::finalize_session))
        .route("/tournaments/{id}/finalize-group-stage", post(finalization::finalize_group_stage))
        .route("/tournaments/{id}/finalize-tournament", post(finalization::finalize_tournament))
        .route("/tournaments/{id}/rankings", get(rankings::list))
        .route("/tournaments/{id}/calculate-rankings", post(rankings::calculate_rankings))
        .route("/tournaments/{id}/distribute-rewards", post(rankings::distribute_rewards))
        .route("/tournaments/{id}/distributed-rewards", get(rankings::get_distributed_rewards))
        .route("/leaderboard", get(leaderboard::get))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer({
            let allowed_origins = std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string());

            let origins: Vec<HeaderValue> = allowed_origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true)
        })
}

/// Liveness + quick DB probe.
async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&state.db).await?;
    Ok("ok")
}
