use axum::extract::{Query, State};
use axum::Json;
use infra::repos::rankings::{self, LeaderboardEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub total_points: Decimal,
    pub tournaments_played: i64,
    pub itm_count: i64,
    pub average_rank: f64,
}

impl From<LeaderboardEntry> for LeaderboardRow {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            user_id: e.user_id,
            total_points: e.total_points,
            tournaments_played: e.tournaments_played,
            itm_count: e.itm_count,
            average_rank: e.average_rank,
        }
    }
}

/// Cross-tournament leaderboard (SUPPLEMENT, see SPEC_FULL.md).
pub async fn get(
    State(state): State<AppState>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardRow>>, AppError> {
    let limit = q.limit.unwrap_or(50).clamp(1, 200);
    let rows = rankings::get_leaderboard(&state.db, limit).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
