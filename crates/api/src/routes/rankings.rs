use axum::extract::{Path, State};
use axum::Json;
use infra::models::TournamentRankingRow;
use infra::repos::{rankings, reward_distributions};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::permissions::{require_role, Role};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::ranking_service;
use crate::services::reward_orchestrator::{self, RewardLineItem, RewardSummary};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub participant_type: String,
    pub points: Decimal,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub rank: Option<i32>,
}

impl From<TournamentRankingRow> for RankingResponse {
    fn from(row: TournamentRankingRow) -> Self {
        Self {
            user_id: row.user_id,
            team_id: row.team_id,
            participant_type: row.participant_type,
            points: row.points,
            wins: row.wins,
            losses: row.losses,
            draws: row.draws,
            rank: row.rank,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<RankingResponse>>, AppError> {
    let rows = rankings::list_by_tournament(&state.db, tournament_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Admin-triggered recompute of `tournament_rankings`, distinct from
/// finalization: does not touch tournament status or rewards.
pub async fn calculate_rankings(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<RankingResponse>>, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let session_repo = infra::repos::SessionRepo::new(state.db.clone());
    let tournament_repo = infra::repos::tournaments::TournamentRepo::new(state.db.clone());
    let rows =
        ranking_service::recalculate_rankings(&state.db, &session_repo, &tournament_repo, tournament_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn distribute_rewards(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<RewardSummary>, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let tournament_repo = infra::repos::tournaments::TournamentRepo::new(state.db.clone());
    let summary = reward_orchestrator::distribute_rewards_for_tournament(
        &state.db,
        &tournament_repo,
        state.credit_ledger.as_ref(),
        state.audit_log.as_ref(),
        tournament_id,
    )
    .await?;

    Ok(Json(summary))
}

pub async fn get_distributed_rewards(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Option<RewardSummary>>, AppError> {
    let Some(existing) = reward_distributions::get_by_tournament(&state.db, tournament_id).await? else {
        return Ok(Json(None));
    };

    let line_items: Vec<RewardLineItem> = serde_json::from_value(existing.line_items).unwrap_or_default();
    Ok(Json(Some(RewardSummary {
        tournament_id,
        total_credits: existing.total_credits,
        total_xp: existing.total_xp,
        line_items,
    })))
}
