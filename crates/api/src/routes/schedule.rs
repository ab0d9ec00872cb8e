use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use infra::engine::schedule::SessionDraft;
use infra::models::SessionRow;
use infra::repos::tournaments::TournamentRepo;
use infra::repos::{CampusScheduleConfigRepo, EnrollmentRepo, SessionRepo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::permissions::{require_role, Role};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::schedule_service::{self, GenerateSessionsRequest};
use crate::state::AppState;

async fn get_tournament_or_404(
    state: &AppState,
    tournament_id: Uuid,
) -> Result<infra::models::TournamentRow, AppError> {
    TournamentRepo::new(state.db.clone())
        .get(tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {tournament_id}")))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub title: String,
    pub date_start: chrono::NaiveDateTime,
    pub date_end: chrono::NaiveDateTime,
    pub campus_id: Option<Uuid>,
    pub tournament_phase: String,
    pub tournament_round: i32,
    pub group_identifier: Option<String>,
    pub match_format: String,
    pub participant_user_ids: Vec<Uuid>,
    pub is_finalized: bool,
}

impl From<SessionRow> for SessionResponse {
    fn from(row: SessionRow) -> Self {
        let is_finalized = row.is_finalized();
        Self {
            id: row.id,
            tournament_id: row.tournament_id,
            title: row.title,
            date_start: row.date_start,
            date_end: row.date_end,
            campus_id: row.campus_id,
            tournament_phase: row.tournament_phase,
            tournament_round: row.tournament_round,
            group_identifier: row.group_identifier,
            match_format: row.match_format.clone(),
            is_finalized,
            participant_user_ids: row.participant_user_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDraftResponse {
    pub title: String,
    pub date_start: chrono::NaiveDateTime,
    pub date_end: chrono::NaiveDateTime,
    pub campus_id: Option<Uuid>,
    pub tournament_round: i32,
    pub group_identifier: Option<String>,
    pub participant_user_ids: Vec<Uuid>,
}

impl From<SessionDraft> for SessionDraftResponse {
    fn from(d: SessionDraft) -> Self {
        Self {
            title: d.title,
            date_start: d.date_start,
            date_end: d.date_end,
            campus_id: d.campus_id,
            tournament_round: d.tournament_round,
            group_identifier: d.group_identifier,
            participant_user_ids: d.participant_user_ids,
        }
    }
}

async fn resolve_campus(
    state: &AppState,
    tournament_id: Uuid,
    campus_id: Option<Uuid>,
) -> Result<Option<infra::models::CampusScheduleConfigRow>, AppError> {
    let Some(campus_id) = campus_id else { return Ok(None) };
    let repo = CampusScheduleConfigRepo::new(state.db.clone());
    Ok(repo.get(tournament_id, campus_id).await?)
}

pub async fn preview(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
    Query(req): Query<GenerateSessionsRequest>,
) -> Result<Json<Vec<SessionDraftResponse>>, AppError> {
    let tournament = get_tournament_or_404(&state, tournament_id).await?;
    let enrollment_repo = EnrollmentRepo::new(state.db.clone());
    let campus = resolve_campus(&state, tournament_id, req.campus_id).await?;

    let drafts = schedule_service::build_drafts(&enrollment_repo, &tournament, campus.as_ref(), &req).await?;
    Ok(Json(drafts.into_iter().map(Into::into).collect()))
}

pub async fn generate(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
    Json(req): Json<GenerateSessionsRequest>,
) -> Result<(StatusCode, Json<Vec<SessionResponse>>), AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let tournament = get_tournament_or_404(&state, tournament_id).await?;
    let enrollment_repo = EnrollmentRepo::new(state.db.clone());
    let session_repo = SessionRepo::new(state.db.clone());
    let campus = resolve_campus(&state, tournament_id, req.campus_id).await?;

    let drafts = schedule_service::build_drafts(&enrollment_repo, &tournament, campus.as_ref(), &req).await?;
    let rows = schedule_service::generate_and_persist(&state.db, &session_repo, &tournament, drafts).await?;

    Ok((StatusCode::CREATED, Json(rows.into_iter().map(Into::into).collect())))
}

pub async fn list(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let repo = SessionRepo::new(state.db.clone());
    let rows = repo.list_for_tournament(tournament_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn delete_all(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;
    let repo = SessionRepo::new(state.db.clone());
    repo.delete_for_tournament(tournament_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampusScheduleRequest {
    pub campus_id: Uuid,
    pub match_duration_minutes: Option<i32>,
    pub break_duration_minutes: Option<i32>,
    pub parallel_fields: Option<i32>,
    pub venue_label: Option<String>,
}

pub async fn upsert_campus_schedule(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
    Json(req): Json<CampusScheduleRequest>,
) -> Result<Json<infra::models::CampusScheduleConfigRow>, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;
    let repo = CampusScheduleConfigRepo::new(state.db.clone());
    let row = repo
        .upsert(
            tournament_id,
            req.campus_id,
            req.match_duration_minutes,
            req.break_duration_minutes,
            req.parallel_fields,
            req.venue_label,
        )
        .await?;
    Ok(Json(row))
}

pub async fn list_campus_schedules(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<infra::models::CampusScheduleConfigRow>>, AppError> {
    let repo = CampusScheduleConfigRepo::new(state.db.clone());
    Ok(Json(repo.list_for_tournament(tournament_id).await?))
}

/// Tournament-level scheduling defaults, as opposed to the per-campus
/// overrides in `campus_schedule_configs`.
#[derive(Debug, Serialize)]
pub struct ScheduleConfigResponse {
    pub tournament_id: Uuid,
    pub match_duration_minutes: i32,
    pub break_duration_minutes: i32,
    pub parallel_fields: i32,
}

impl From<infra::models::TournamentRow> for ScheduleConfigResponse {
    fn from(row: infra::models::TournamentRow) -> Self {
        Self {
            tournament_id: row.id,
            match_duration_minutes: row.match_duration_minutes,
            break_duration_minutes: row.break_duration_minutes,
            parallel_fields: row.parallel_fields,
        }
    }
}

pub async fn get_schedule_config(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<ScheduleConfigResponse>, AppError> {
    let tournament = get_tournament_or_404(&state, tournament_id).await?;
    Ok(Json(tournament.into()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchScheduleConfigRequest {
    pub match_duration_minutes: Option<i32>,
    pub break_duration_minutes: Option<i32>,
    pub parallel_fields: Option<i32>,
}

pub async fn patch_schedule_config(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
    Json(req): Json<PatchScheduleConfigRequest>,
) -> Result<Json<ScheduleConfigResponse>, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let row = sqlx::query_as::<_, infra::models::TournamentRow>(
        r#"
        UPDATE tournaments SET
            match_duration_minutes = COALESCE($2, match_duration_minutes),
            break_duration_minutes = COALESCE($3, break_duration_minutes),
            parallel_fields = COALESCE($4, parallel_fields),
            updated_at = NOW()
        WHERE id = $1
        RETURNING
            id, display_name, short_code, specialization_family, age_group,
            start_date, end_date, tournament_format, tournament_type_code,
            scoring_type, ranking_direction, measurement_unit,
            match_duration_minutes, break_duration_minutes, parallel_fields,
            tournament_status, master_instructor_id, enrollment_snapshot,
            tournament_config, created_at, updated_at
        "#,
    )
    .bind(tournament_id)
    .bind(req.match_duration_minutes)
    .bind(req.break_duration_minutes)
    .bind(req.parallel_fields)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("tournament {tournament_id}")))?;

    Ok(Json(row.into()))
}

pub async fn delete_campus_schedule(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((tournament_id, campus_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;
    let repo = CampusScheduleConfigRepo::new(state.db.clone());
    repo.delete(tournament_id, campus_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
