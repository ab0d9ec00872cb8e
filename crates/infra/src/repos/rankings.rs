use rust_decimal::Decimal;
use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::TournamentRankingRow;

const COLUMNS: &str = "id, tournament_id, user_id, team_id, participant_type, points, wins, losses, draws, rank";

/// `TournamentRanking` rows are mutated only through get-or-create then
/// accumulate, inside the caller's transaction (spec §5).
pub async fn get_or_create<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    user_id: Uuid,
) -> Result<TournamentRankingRow> {
    sqlx::query_as::<_, TournamentRankingRow>(&format!(
        r#"
        INSERT INTO tournament_rankings (id, tournament_id, user_id, participant_type, points, wins, losses, draws)
        VALUES (gen_random_uuid(), $1, $2, 'INDIVIDUAL', 0, 0, 0, 0)
        ON CONFLICT (tournament_id, user_id) DO UPDATE SET tournament_id = EXCLUDED.tournament_id
        RETURNING {COLUMNS}
        "#
    ))
    .bind(tournament_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn set_points_and_rank<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    user_id: Uuid,
    points: Decimal,
    rank: i32,
) -> Result<()> {
    sqlx::query(
        "UPDATE tournament_rankings SET points = $3, rank = $4 WHERE tournament_id = $1 AND user_id = $2",
    )
    .bind(tournament_id)
    .bind(user_id)
    .bind(points)
    .bind(rank)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn exists_for_tournament<'e>(executor: impl PgExecutor<'e>, tournament_id: Uuid) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tournament_rankings WHERE tournament_id = $1")
        .bind(tournament_id)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}

pub async fn list_by_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
) -> Result<Vec<TournamentRankingRow>> {
    sqlx::query_as::<_, TournamentRankingRow>(&format!(
        "SELECT {COLUMNS} FROM tournament_rankings WHERE tournament_id = $1 ORDER BY rank ASC NULLS LAST"
    ))
    .bind(tournament_id)
    .fetch_all(executor)
    .await
}

/// Cross-tournament leaderboard (SUPPLEMENT, see SPEC_FULL.md):
/// points totals, in-the-money count and average final rank per user.
#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub total_points: Decimal,
    pub tournaments_played: i64,
    pub itm_count: i64,
    pub average_rank: f64,
}

pub async fn get_leaderboard<'e>(executor: impl PgExecutor<'e>, limit: i64) -> Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT
            user_id,
            SUM(points) AS total_points,
            COUNT(*) AS tournaments_played,
            COUNT(*) FILTER (WHERE rank IS NOT NULL AND rank <= 3) AS itm_count,
            AVG(rank) AS average_rank
        FROM tournament_rankings
        WHERE user_id IS NOT NULL
        GROUP BY user_id
        ORDER BY total_points DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;

    use sqlx::Row;
    Ok(rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            user_id: row.get("user_id"),
            total_points: row.get("total_points"),
            tournaments_played: row.get("tournaments_played"),
            itm_count: row.get("itm_count"),
            average_rank: row.try_get::<f64, _>("average_rank").unwrap_or(0.0),
        })
        .collect())
}
