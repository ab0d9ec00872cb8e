use infra::engine::lifecycle::{self, TournamentStatus, TransitionActor};
use infra::engine::result_processor::{process_results, RawResult};
use infra::engine::types::{HeadToHeadGameResults, HeadToHeadOutcome, HeadToHeadParticipant};
use infra::models::{SessionRow, TournamentEnrollmentRow, TournamentRow};
use infra::repos::{status_history, tournaments::TournamentRepo, SessionRepo};
use infra::EngineError;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// ONGOING -> IN_PROGRESS on first match result (spec §4.9). Idempotent:
/// once the tournament has left ONGOING, later submissions are no-ops here.
pub async fn advance_to_in_progress_on_first_result(
    db: &PgPool,
    tournament_repo: &TournamentRepo,
    tournament: &TournamentRow,
    changed_by: Option<Uuid>,
) -> Result<(), AppError> {
    let current = TournamentStatus::from_str(&tournament.tournament_status)?;
    if current != TournamentStatus::Ongoing {
        return Ok(());
    }
    if lifecycle::transition(current, TournamentStatus::InProgress, TransitionActor::FirstMatchResult).is_err() {
        return Ok(());
    }

    let mut tx = db.begin().await?;
    tournament_repo
        .update_status(&mut tx, tournament.id, TournamentStatus::InProgress.as_str())
        .await?;
    status_history::append(
        &mut *tx,
        tournament.id,
        current.as_str(),
        TournamentStatus::InProgress.as_str(),
        changed_by,
        Some("first match result recorded"),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Result Validator (spec.md §4.7), checked before any result write.
pub fn validate_submission(
    tournament: &TournamentRow,
    session: &SessionRow,
    enrollments: &[TournamentEnrollmentRow],
    submitted_user_ids: &[Uuid],
) -> Result<(), AppError> {
    if session.is_finalized() {
        return Err(EngineError::AlreadyFinalized.into());
    }

    if !matches!(tournament.tournament_status.as_str(), "ONGOING" | "IN_PROGRESS") {
        return Err(EngineError::invalid_result(format!(
            "tournament status {} does not accept results",
            tournament.tournament_status
        ))
        .into());
    }

    let eligible: std::collections::HashSet<Uuid> = enrollments
        .iter()
        .filter(|e| e.is_eligible())
        .map(|e| e.user_id)
        .collect();

    let offending: Vec<Uuid> = submitted_user_ids
        .iter()
        .filter(|u| !eligible.contains(u))
        .copied()
        .collect();

    if !offending.is_empty() {
        return Err(EngineError::invalid_result_users(
            "every submitted user must have an active approved enrollment",
            offending,
        )
        .into());
    }

    Ok(())
}

/// Structured submission for HEAD_TO_HEAD sessions: runs the result
/// processor for `match_format`, then writes `game_results` directly
/// (head-to-head sessions finalize on submission, unlike INDIVIDUAL_RANKING
/// which goes through `SessionFinalizer`).
pub async fn submit_head_to_head_results(
    db: &PgPool,
    session_repo: &SessionRepo,
    session_id: Uuid,
    match_format: &str,
    raw_results: Vec<RawResult>,
) -> Result<HeadToHeadGameResults, AppError> {
    let derived = process_results(match_format, &raw_results, None)?;

    let participants: Vec<HeadToHeadParticipant> = raw_results
        .iter()
        .map(|raw| {
            let rank = derived
                .iter()
                .find(|d| d.user_id == raw.user_id)
                .ok_or_else(|| {
                    EngineError::invalid_result_users(
                        "result processor produced no rank for participant",
                        vec![raw.user_id],
                    )
                })?;
            Ok(HeadToHeadParticipant {
                user_id: raw.user_id,
                score: raw.score.or(raw.team_score).unwrap_or(0.0),
                result: outcome_for_rank(rank.rank),
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    let raw_participants: Vec<HeadToHeadParticipant> = raw_results
        .iter()
        .map(|raw| HeadToHeadParticipant {
            user_id: raw.user_id,
            score: raw.score.or(raw.team_score).unwrap_or(0.0),
            result: HeadToHeadOutcome::Draw,
        })
        .collect();

    let results = HeadToHeadGameResults {
        match_format: match_format.to_string(),
        round_number: None,
        participants,
        raw_results: raw_participants,
    };

    let payload = serde_json::to_value(infra::engine::types::GameResults::HeadToHead(results.clone()))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let mut tx = db.begin().await?;
    session_repo.write_game_results(&mut tx, session_id, payload).await?;
    tx.commit().await?;

    Ok(results)
}

fn outcome_for_rank(rank: i32) -> HeadToHeadOutcome {
    match rank {
        1 => HeadToHeadOutcome::Win,
        _ => HeadToHeadOutcome::Loss,
    }
}

/// Single-round IR submission: merges one round's `user_id -> value`
/// map into `rounds_data.round_results` and bumps `completed_rounds`.
pub async fn submit_round_results(
    session_repo: &SessionRepo,
    session: &SessionRow,
    round_number: i32,
    values: std::collections::BTreeMap<Uuid, String>,
) -> Result<infra::engine::types::RoundsData, AppError> {
    let mut rounds = session
        .rounds()
        .ok_or_else(|| EngineError::invalid_result("session has no rounds_data"))?;

    if round_number < 1 || round_number > rounds.total_rounds {
        return Err(EngineError::invalid_result(format!(
            "round {round_number} is out of range (1..={})",
            rounds.total_rounds
        ))
        .into());
    }

    let key = round_number.to_string();
    let already_recorded = rounds.round_results.contains_key(&key);
    let entry = rounds
        .round_results
        .entry(key)
        .or_default();
    for (user_id, value) in values {
        entry.insert(user_id.to_string(), value);
    }
    if !already_recorded {
        rounds.completed_rounds += 1;
    }

    let payload = serde_json::to_value(&rounds).map_err(|e| AppError::Internal(e.to_string()))?;
    session_repo.update_rounds_data(session.id, payload).await?;

    Ok(rounds)
}
