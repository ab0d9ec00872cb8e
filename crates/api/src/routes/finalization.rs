use axum::extract::{Path, State};
use axum::Json;
use infra::engine::types::EnrollmentSnapshot;
use infra::repos::tournaments::TournamentRepo;
use infra::repos::SessionRepo;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::permissions::{require_role, Role};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::group_stage_finalizer::{self, GroupStageOutcome};
use crate::services::reward_orchestrator::RewardSummary;
use crate::services::session_finalizer;
use crate::services::tournament_finalizer::{self, TournamentFinalizeOutcome};
use crate::state::AppState;

pub async fn finalize_session(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path((_tournament_id, session_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<infra::engine::types::IndividualGameResults>, AppError> {
    let claims = require_role(claims.as_ref(), Role::Instructor)?;
    let recorded_by_id =
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized("invalid subject claim".into()))?;

    let session_repo = SessionRepo::new(state.db.clone());
    let tournament_repo = TournamentRepo::new(state.db.clone());

    let results = session_finalizer::finalize_session(
        &state.db,
        &session_repo,
        &tournament_repo,
        session_id,
        recorded_by_id,
        claims.email.clone(),
    )
    .await?;

    Ok(Json(results))
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
pub enum GroupStageResponse {
    Completed(EnrollmentSnapshot),
    AlreadyComplete(EnrollmentSnapshot),
    Incomplete { incomplete_session_ids: Vec<Uuid> },
}

impl From<GroupStageOutcome> for GroupStageResponse {
    fn from(outcome: GroupStageOutcome) -> Self {
        match outcome {
            GroupStageOutcome::Completed(s) => GroupStageResponse::Completed(s),
            GroupStageOutcome::AlreadyComplete(s) => GroupStageResponse::AlreadyComplete(s),
            GroupStageOutcome::Incomplete { incomplete_session_ids } => {
                GroupStageResponse::Incomplete { incomplete_session_ids }
            }
        }
    }
}

pub async fn finalize_group_stage(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<GroupStageResponse>, AppError> {
    require_role(claims.as_ref(), Role::Instructor)?;

    let session_repo = SessionRepo::new(state.db.clone());
    let tournament_repo = TournamentRepo::new(state.db.clone());

    let outcome = group_stage_finalizer::finalize_group_stage(
        &state.db,
        &session_repo,
        &tournament_repo,
        state.user_directory.as_ref(),
        tournament_id,
    )
    .await?;

    Ok(Json(outcome.into()))
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
pub enum FinalizeTournamentResponse {
    Completed(RewardSummary),
    AlreadyCompleted(RewardSummary),
}

impl From<TournamentFinalizeOutcome> for FinalizeTournamentResponse {
    fn from(outcome: TournamentFinalizeOutcome) -> Self {
        match outcome {
            TournamentFinalizeOutcome::Completed(s) => FinalizeTournamentResponse::Completed(s),
            TournamentFinalizeOutcome::AlreadyCompleted(s) => FinalizeTournamentResponse::AlreadyCompleted(s),
        }
    }
}

pub async fn finalize_tournament(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<FinalizeTournamentResponse>, AppError> {
    let claims = require_role(claims.as_ref(), Role::Admin)?;
    let changed_by = Uuid::parse_str(&claims.sub).ok();

    let session_repo = SessionRepo::new(state.db.clone());
    let tournament_repo = TournamentRepo::new(state.db.clone());

    let outcome = tournament_finalizer::finalize_tournament(
        &state.db,
        &session_repo,
        &tournament_repo,
        state.credit_ledger.as_ref(),
        state.audit_log.as_ref(),
        tournament_id,
        changed_by,
    )
    .await?;

    Ok(Json(outcome.into()))
}
