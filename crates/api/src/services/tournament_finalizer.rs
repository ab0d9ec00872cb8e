use infra::engine::head_to_head::{self, CompletedMatch};
use infra::engine::lifecycle::{self, TournamentStatus, TransitionActor};
use infra::engine::types::{GameResults, TournamentFormat};
use infra::repos::{rankings, status_history, tournaments::TournamentRepo, SessionRepo};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::collaborators::{AuditLog, CreditLedger};
use crate::error::AppError;
use crate::services::reward_orchestrator::{self, RewardSummary};

pub enum TournamentFinalizeOutcome {
    Completed(RewardSummary),
    AlreadyCompleted(RewardSummary),
}

/// Closes out a tournament and triggers reward distribution exactly once
/// (spec.md §4.8's TournamentFinalizer + §4.10's Reward Orchestrator).
#[allow(clippy::too_many_arguments)]
pub async fn finalize_tournament(
    db: &PgPool,
    session_repo: &SessionRepo,
    tournament_repo: &TournamentRepo,
    credit_ledger: &dyn CreditLedger,
    audit_log: &dyn AuditLog,
    tournament_id: Uuid,
    changed_by: Option<Uuid>,
) -> Result<TournamentFinalizeOutcome, AppError> {
    let mut tx = db.begin().await?;

    let tournament = tournament_repo
        .get_for_update(&mut tx, tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {tournament_id}")))?;

    let current = TournamentStatus::from_str(&tournament.tournament_status)?;

    if current == TournamentStatus::Completed {
        tx.commit().await?;
        let summary = reward_orchestrator::distribute_rewards_for_tournament(
            db,
            tournament_repo,
            credit_ledger,
            audit_log,
            tournament_id,
        )
        .await?;
        return Ok(TournamentFinalizeOutcome::AlreadyCompleted(summary));
    }

    lifecycle::transition(current, TournamentStatus::Completed, TransitionActor::TournamentFinalizer)?;

    let sessions = session_repo.list_for_tournament(tournament_id).await?;
    let is_ir = matches!(tournament.format()?, TournamentFormat::IndividualRanking);
    let rankings_exist = rankings::exists_for_tournament(&mut *tx, tournament_id).await?;

    let incomplete: Vec<Uuid> = sessions
        .iter()
        .filter(|s| {
            if s.is_finalized() {
                return false;
            }
            if is_ir {
                let rounds_done = s.rounds().map(|r| r.is_complete()).unwrap_or(false);
                !(rounds_done && rankings_exist)
            } else {
                true
            }
        })
        .map(|s| s.id)
        .collect();

    if !incomplete.is_empty() {
        return Err(infra::EngineError::IncompleteStage {
            incomplete_count: incomplete.len(),
            incomplete_session_ids: incomplete,
        }
        .into());
    }

    if !rankings_exist && !is_ir {
        let knockout_matches: Vec<CompletedMatch> = sessions
            .iter()
            .filter(|s| s.tournament_phase == "knockout")
            .filter_map(|s| match s.results() {
                Some(GameResults::HeadToHead(results)) => Some(CompletedMatch {
                    group_identifier: s.group_identifier.clone(),
                    round_number: Some(s.tournament_round),
                    results,
                }),
                _ => None,
            })
            .collect();

        let standings = head_to_head::knockout_standings(&knockout_matches);
        for entry in &standings {
            rankings::get_or_create(&mut *tx, tournament_id, entry.user_id).await?;
            let points = Decimal::from_f64(entry.elimination_score.unwrap_or(0.0)).unwrap_or_default();
            rankings::set_points_and_rank(&mut *tx, tournament_id, entry.user_id, points, entry.rank).await?;
        }
    }

    tournament_repo
        .update_status(&mut tx, tournament_id, TournamentStatus::Completed.as_str())
        .await?;

    status_history::append(
        &mut *tx,
        tournament_id,
        current.as_str(),
        TournamentStatus::Completed.as_str(),
        changed_by,
        Some("tournament finalized"),
        None,
    )
    .await?;

    tx.commit().await?;

    let summary = reward_orchestrator::distribute_rewards_for_tournament(
        db,
        tournament_repo,
        credit_ledger,
        audit_log,
        tournament_id,
    )
    .await?;
    Ok(TournamentFinalizeOutcome::Completed(summary))
}
