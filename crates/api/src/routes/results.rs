use axum::extract::{Path, State};
use axum::Json;
use infra::engine::result_processor::RawResult;
use infra::models::{SessionRow, TournamentEnrollmentRow};
use infra::repos::tournaments::TournamentRepo;
use infra::repos::{EnrollmentRepo, SessionRepo};
use serde::Deserialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::permissions::{require_role, Role};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::result_service;
use crate::state::AppState;

async fn load_context(
    state: &AppState,
    session_id: Uuid,
) -> Result<(SessionRow, infra::models::TournamentRow, Vec<TournamentEnrollmentRow>), AppError> {
    let session_repo = SessionRepo::new(state.db.clone());
    let tournament_repo = TournamentRepo::new(state.db.clone());
    let enrollment_repo = EnrollmentRepo::new(state.db.clone());

    let session = session_repo
        .get(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    let tournament = tournament_repo
        .get(session.tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {}", session.tournament_id)))?;
    let enrollments = enrollment_repo.list_for_tournament(session.tournament_id).await?;

    Ok((session, tournament, enrollments))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitResultsRequest {
    pub results: Vec<RawResult>,
}

pub async fn submit_head_to_head(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((_tournament_id, session_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitResultsRequest>,
) -> Result<Json<infra::engine::types::HeadToHeadGameResults>, AppError> {
    let claims = require_role(claims.as_ref(), Role::Instructor)?;

    let (session, tournament, enrollments) = load_context(&state, session_id).await?;
    let submitted_user_ids: Vec<Uuid> = req.results.iter().map(|r| r.user_id).collect();
    result_service::validate_submission(&tournament, &session, &enrollments, &submitted_user_ids)?;

    let session_repo = SessionRepo::new(state.db.clone());
    let results = result_service::submit_head_to_head_results(
        &state.db,
        &session_repo,
        session_id,
        &session.match_format,
        req.results,
    )
    .await?;

    let tournament_repo = TournamentRepo::new(state.db.clone());
    let changed_by = Uuid::parse_str(&claims.sub).ok();
    result_service::advance_to_in_progress_on_first_result(&state.db, &tournament_repo, &tournament, changed_by)
        .await?;

    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRoundRequest {
    pub values: BTreeMap<Uuid, String>,
}

pub async fn submit_round(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((_tournament_id, session_id, round_number)): Path<(Uuid, Uuid, i32)>,
    Json(req): Json<SubmitRoundRequest>,
) -> Result<Json<infra::engine::types::RoundsData>, AppError> {
    let claims = require_role(claims.as_ref(), Role::Instructor)?;

    let (session, tournament, enrollments) = load_context(&state, session_id).await?;
    let submitted_user_ids: Vec<Uuid> = req.values.keys().copied().collect();
    result_service::validate_submission(&tournament, &session, &enrollments, &submitted_user_ids)?;

    let session_repo = SessionRepo::new(state.db.clone());
    let rounds = result_service::submit_round_results(&session_repo, &session, round_number, req.values).await?;

    let tournament_repo = TournamentRepo::new(state.db.clone());
    let changed_by = Uuid::parse_str(&claims.sub).ok();
    result_service::advance_to_in_progress_on_first_result(&state.db, &tournament_repo, &tournament, changed_by)
        .await?;

    Ok(Json(rounds))
}

pub async fn get_rounds(
    State(state): State<AppState>,
    Path((_tournament_id, session_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Option<infra::engine::types::RoundsData>>, AppError> {
    let session_repo = SessionRepo::new(state.db.clone());
    let session = session_repo
        .get(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(session.rounds()))
}

/// Legacy direct write (spec.md §6.1's `PATCH .../results`): overwrites
/// `game_results` verbatim, skipping the roster/shape validation the
/// structured submission path runs. Kept for callers migrating data
/// out of the previous ad-hoc write path; new integrations should use
/// `submit_head_to_head`/`submit_round`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyResultsRequest {
    pub game_results: serde_json::Value,
}

pub async fn legacy_update_results(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((_tournament_id, session_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<LegacyResultsRequest>,
) -> Result<Json<SessionRow>, AppError> {
    require_role(claims.as_ref(), Role::Instructor)?;

    let session_repo = SessionRepo::new(state.db.clone());
    session_repo
        .get(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    let mut tx = state.db.begin().await?;
    session_repo.write_game_results(&mut tx, session_id, req.game_results).await?;
    tx.commit().await?;

    let updated = session_repo
        .get(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(updated))
}
