use infra::engine::head_to_head::{self, CompletedMatch};
use infra::engine::types::{GameResults, TournamentFormat};
use infra::models::TournamentRankingRow;
use infra::repos::{rankings, tournaments::TournamentRepo, SessionRepo};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// Manual "recompute" trigger (spec.md §6.1's `calculate-rankings`):
/// re-derives `TournamentRanking` rows from whatever session results
/// already exist, without touching the tournament's lifecycle status.
/// For HEAD_TO_HEAD tournaments this re-runs `knockout_standings` over
/// the currently-finalized matches; for INDIVIDUAL_RANKING it is a
/// no-op beyond re-reading what `SessionFinalizer` already wrote, since
/// IR rankings accumulate per-session rather than from a single pass.
pub async fn recalculate_rankings(
    db: &PgPool,
    session_repo: &SessionRepo,
    tournament_repo: &TournamentRepo,
    tournament_id: Uuid,
) -> Result<Vec<TournamentRankingRow>, AppError> {
    let tournament = tournament_repo
        .get(tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {tournament_id}")))?;

    if matches!(tournament.format()?, TournamentFormat::HeadToHead) {
        let sessions = session_repo.list_for_tournament(tournament_id).await?;
        let matches: Vec<CompletedMatch> = sessions
            .iter()
            .filter_map(|s| match s.results() {
                Some(GameResults::HeadToHead(results)) => Some(CompletedMatch {
                    group_identifier: s.group_identifier.clone(),
                    round_number: Some(s.tournament_round),
                    results,
                }),
                _ => None,
            })
            .collect();

        let standings = head_to_head::knockout_standings(&matches);
        let mut tx = db.begin().await?;
        for entry in &standings {
            rankings::get_or_create(&mut *tx, tournament_id, entry.user_id).await?;
            let points = Decimal::from_f64(entry.elimination_score.unwrap_or(0.0)).unwrap_or_default();
            rankings::set_points_and_rank(&mut *tx, tournament_id, entry.user_id, points, entry.rank).await?;
        }
        tx.commit().await?;
    }

    Ok(rankings::list_by_tournament(db, tournament_id).await?)
}
