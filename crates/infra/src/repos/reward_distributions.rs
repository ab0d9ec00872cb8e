use rust_decimal::Decimal;
use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::RewardDistributionRow;

const COLUMNS: &str = "id, tournament_id, distributed_at, total_credits, total_xp, line_items";

/// Pre-check used by the reward orchestrator (spec §4.10); the unique
/// index on `tournament_id` backs this with a storage-level guarantee.
pub async fn get_by_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
) -> Result<Option<RewardDistributionRow>> {
    sqlx::query_as::<_, RewardDistributionRow>(&format!(
        "SELECT {COLUMNS} FROM reward_distributions WHERE tournament_id = $1"
    ))
    .bind(tournament_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    total_credits: Decimal,
    total_xp: i64,
    line_items: serde_json::Value,
) -> Result<RewardDistributionRow> {
    sqlx::query_as::<_, RewardDistributionRow>(&format!(
        r#"
        INSERT INTO reward_distributions (id, tournament_id, distributed_at, total_credits, total_xp, line_items)
        VALUES (gen_random_uuid(), $1, NOW(), $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(tournament_id)
    .bind(total_credits)
    .bind(total_xp)
    .bind(line_items)
    .fetch_one(executor)
    .await
}
