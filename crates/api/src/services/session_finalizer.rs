use chrono::Utc;
use infra::engine::ranking;
use infra::engine::types::{DerivedRanking, GameResults, IndividualGameResults, TournamentFormat};
use infra::error::EngineError;
use infra::models::{SessionRow, TournamentRow};
use infra::repos::{rankings, tournaments::TournamentRepo, SessionRepo};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// Finalizes a single INDIVIDUAL_RANKING session, writing `game_results`
/// and the per-tournament `TournamentRanking` rows. Never triggers reward
/// distribution — that is `TournamentFinalizer`'s job alone (spec.md
/// §4.8's strict invariant), grounded on the teacher's `results/service.rs`
/// pattern of one finalizer per write boundary.
pub async fn finalize_session(
    db: &PgPool,
    session_repo: &SessionRepo,
    tournament_repo: &TournamentRepo,
    session_id: Uuid,
    recorded_by_id: Uuid,
    recorded_by_name: String,
) -> Result<IndividualGameResults, AppError> {
    let mut tx = db.begin().await?;

    let session = session_repo
        .get_for_update(&mut tx, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    if session.is_finalized() {
        return Err(EngineError::AlreadyFinalized.into());
    }

    if rankings::exists_for_tournament(&mut *tx, session.tournament_id).await? {
        return Err(EngineError::AlreadyFinalized.into());
    }

    let tournament = tournament_repo
        .get(session.tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {}", session.tournament_id)))?;

    validate_session_shape(&session, &tournament)?;

    let rounds = session
        .rounds()
        .ok_or_else(|| EngineError::invalid_result("session has no rounds_data"))?;

    if !rounds.is_complete() {
        return Err(EngineError::IncompleteStage {
            incomplete_count: (rounds.total_rounds - rounds.completed_rounds).max(0) as usize,
            incomplete_session_ids: vec![session_id],
        }
        .into());
    }

    let scoring_type = tournament
        .scoring()
        .ok_or_else(|| EngineError::UnknownScoringType("tournament has no scoring_type".into()))?;
    let direction = tournament.direction()?;
    let measurement_unit = tournament.measurement_unit.clone().unwrap_or_default();

    let parsed = rounds.parsed_round_results();
    let rank_groups =
        ranking::calculate_rankings(scoring_type, &parsed, &session.participant_user_ids, Some(direction))?;

    let derived: Vec<DerivedRanking> = rank_groups
        .iter()
        .flat_map(|group| {
            let measurement_unit = &measurement_unit;
            group.participants.iter().map(move |user_id| DerivedRanking {
                user_id: *user_id,
                rank: group.rank,
                final_value: group.final_value,
                measurement_unit: measurement_unit.clone(),
                is_tied: group.is_tied(),
            })
        })
        .collect();

    let aggregation_method = ranking::aggregation_label(scoring_type, direction);

    let game_results = IndividualGameResults {
        recorded_at: Utc::now(),
        recorded_by_id,
        recorded_by_name,
        tournament_format: TournamentFormat::IndividualRanking,
        scoring_type,
        measurement_unit,
        ranking_direction: direction,
        total_rounds: rounds.total_rounds,
        aggregation_method,
        rounds_data: rounds,
        derived_rankings: derived.clone(),
        performance_rankings: derived.clone(),
        wins_rankings: derived.clone(),
    };

    let payload = serde_json::to_value(GameResults::Individual(game_results.clone()))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    session_repo.write_game_results(&mut tx, session_id, payload).await?;

    for entry in &derived {
        rankings::get_or_create(&mut *tx, session.tournament_id, entry.user_id).await?;
        let points = Decimal::from_f64(entry.final_value).unwrap_or_default();
        rankings::set_points_and_rank(&mut *tx, session.tournament_id, entry.user_id, points, entry.rank).await?;
    }

    tx.commit().await?;

    Ok(game_results)
}

fn validate_session_shape(session: &SessionRow, tournament: &TournamentRow) -> Result<(), AppError> {
    let match_format_is_ir = session.match_format == "INDIVIDUAL_RANKING";
    let tournament_format_is_ir = matches!(tournament.format()?, TournamentFormat::IndividualRanking);

    if !match_format_is_ir || !tournament_format_is_ir {
        return Err(EngineError::invalid_result(
            "session finalization requires an INDIVIDUAL_RANKING session in an INDIVIDUAL_RANKING tournament",
        )
        .into());
    }
    Ok(())
}
