use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use infra::engine::lifecycle::{self, TournamentStatus, TransitionActor};
use infra::models::TournamentRow;
use infra::pagination::LimitOffset;
use infra::repos::tournaments::{TournamentFilter, TournamentRepo};
use infra::repos::status_history;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::permissions::{require_role, Role};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTournamentRequest {
    pub display_name: String,
    pub short_code: String,
    pub specialization_family: Option<String>,
    pub age_group: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tournament_format: String,
    pub tournament_type_code: Option<String>,
    pub scoring_type: Option<String>,
    pub ranking_direction: Option<String>,
    pub measurement_unit: Option<String>,
    pub match_duration_minutes: Option<i32>,
    pub break_duration_minutes: Option<i32>,
    pub parallel_fields: Option<i32>,
    pub master_instructor_id: Option<Uuid>,
    pub tournament_config: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TournamentResponse {
    pub id: Uuid,
    pub display_name: String,
    pub short_code: String,
    pub specialization_family: Option<String>,
    pub age_group: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tournament_format: String,
    pub tournament_type_code: Option<String>,
    pub scoring_type: Option<String>,
    pub ranking_direction: String,
    pub measurement_unit: Option<String>,
    pub tournament_status: String,
    pub master_instructor_id: Option<Uuid>,
}

impl From<TournamentRow> for TournamentResponse {
    fn from(row: TournamentRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            short_code: row.short_code,
            specialization_family: row.specialization_family,
            age_group: row.age_group,
            start_date: row.start_date,
            end_date: row.end_date,
            tournament_format: row.tournament_format,
            tournament_type_code: row.tournament_type_code,
            scoring_type: row.scoring_type,
            ranking_direction: row.ranking_direction,
            measurement_unit: row.measurement_unit,
            tournament_status: row.tournament_status,
            master_instructor_id: row.master_instructor_id,
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(req): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<TournamentResponse>), AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let row = sqlx::query_as::<_, TournamentRow>(
        r#"
        INSERT INTO tournaments (
            id, display_name, short_code, specialization_family, age_group,
            start_date, end_date, tournament_format, tournament_type_code,
            scoring_type, ranking_direction, measurement_unit,
            match_duration_minutes, break_duration_minutes, parallel_fields,
            tournament_status, master_instructor_id, tournament_config,
            created_at, updated_at
        )
        VALUES (
            gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, 'DRAFT', $15, $16, NOW(), NOW()
        )
        RETURNING
            id, display_name, short_code, specialization_family, age_group,
            start_date, end_date, tournament_format, tournament_type_code,
            scoring_type, ranking_direction, measurement_unit,
            match_duration_minutes, break_duration_minutes, parallel_fields,
            tournament_status, master_instructor_id, enrollment_snapshot,
            tournament_config, created_at, updated_at
        "#,
    )
    .bind(req.display_name)
    .bind(req.short_code)
    .bind(req.specialization_family)
    .bind(req.age_group)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.tournament_format)
    .bind(req.tournament_type_code)
    .bind(req.scoring_type)
    .bind(req.ranking_direction.unwrap_or_else(|| "ASC".to_string()))
    .bind(req.measurement_unit)
    .bind(req.match_duration_minutes.unwrap_or(30))
    .bind(req.break_duration_minutes.unwrap_or(10))
    .bind(req.parallel_fields.unwrap_or(1))
    .bind(req.master_instructor_id)
    .bind(req.tournament_config)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TournamentResponse>, AppError> {
    let repo = TournamentRepo::new(state.db.clone());
    let row = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {id}")))?;
    Ok(Json(row.into()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListQuery {
    pub tournament_status: Option<String>,
    pub specialization_family: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<TournamentResponse>>, AppError> {
    let repo = TournamentRepo::new(state.db.clone());
    let filter = TournamentFilter {
        tournament_status: q.tournament_status,
        specialization_family: q.specialization_family,
        from: q.from,
        to: q.to,
    };
    let page = LimitOffset::new(q.limit.unwrap_or(50), q.offset.unwrap_or(0));
    let rows = repo.list(filter, Some(page)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchTournamentRequest {
    pub display_name: Option<String>,
    pub age_group: Option<String>,
    pub match_duration_minutes: Option<i32>,
    pub break_duration_minutes: Option<i32>,
    pub parallel_fields: Option<i32>,
    pub master_instructor_id: Option<Uuid>,
    pub tournament_config: Option<serde_json::Value>,
}

pub async fn patch(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PatchTournamentRequest>,
) -> Result<Json<TournamentResponse>, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let row = sqlx::query_as::<_, TournamentRow>(
        r#"
        UPDATE tournaments SET
            display_name = COALESCE($2, display_name),
            age_group = COALESCE($3, age_group),
            match_duration_minutes = COALESCE($4, match_duration_minutes),
            break_duration_minutes = COALESCE($5, break_duration_minutes),
            parallel_fields = COALESCE($6, parallel_fields),
            master_instructor_id = COALESCE($7, master_instructor_id),
            tournament_config = COALESCE($8, tournament_config),
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
    .bind(id)
    .bind(req.display_name)
    .bind(req.age_group)
    .bind(req.match_duration_minutes)
    .bind(req.break_duration_minutes)
    .bind(req.parallel_fields)
    .bind(req.master_instructor_id)
    .bind(req.tournament_config)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("tournament {id}")))?;

    Ok(Json(row.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;
    let repo = TournamentRepo::new(state.db.clone());
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChangeRequest {
    pub status: String,
    pub reason: Option<String>,
}

pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<TournamentResponse>, AppError> {
    let claims = require_role(claims.as_ref(), Role::Admin)?;
    let changed_by = Uuid::parse_str(&claims.sub).ok();

    let repo = TournamentRepo::new(state.db.clone());
    let mut tx = state.db.begin().await?;
    let tournament = repo
        .get_for_update(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {id}")))?;

    let current = TournamentStatus::from_str(&tournament.tournament_status)?;
    let requested = TournamentStatus::from_str(&req.status)?;
    lifecycle::transition(current, requested, TransitionActor::Admin)?;

    let updated = repo
        .update_status(&mut tx, id, requested.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {id}")))?;

    status_history::append(
        &mut *tx,
        id,
        current.as_str(),
        requested.as_str(),
        changed_by,
        req.reason.as_deref(),
        None,
    )
    .await?;

    tx.commit().await?;

    Ok(Json(updated.into()))
}

#[derive(Debug, Serialize)]
pub struct StatusHistoryEntry {
    pub old_status: String,
    pub new_status: String,
    pub changed_by: Option<Uuid>,
    pub reason: Option<String>,
    pub changed_at: chrono::NaiveDateTime,
}

pub async fn status_history_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusHistoryEntry>>, AppError> {
    let rows = status_history::list_for_tournament(&state.db, id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| StatusHistoryEntry {
                old_status: r.old_status,
                new_status: r.new_status,
                changed_by: r.changed_by,
                reason: r.reason,
                changed_at: r.changed_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct TournamentSummary {
    pub tournament: TournamentResponse,
    pub enrolled_count: i64,
    pub session_count: i64,
    pub ranked_count: i64,
}

pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TournamentSummary>, AppError> {
    let repo = TournamentRepo::new(state.db.clone());
    let tournament = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {id}")))?;

    let enrolled_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tournament_enrollments WHERE tournament_id = $1 AND is_active = true")
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    let session_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE tournament_id = $1")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    let ranked_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tournament_rankings WHERE tournament_id = $1")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(TournamentSummary {
        tournament: tournament.into(),
        enrolled_count,
        session_count,
        ranked_count,
    }))
}
