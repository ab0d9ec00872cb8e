use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::TournamentStatusHistoryRow;

const COLUMNS: &str = "id, tournament_id, old_status, new_status, changed_by, reason, metadata, changed_at";

/// Appended in the same transaction as the status `UPDATE` it describes
/// (spec §4.9), mirroring the teacher's `tournament_clock_events` write.
pub async fn append<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
    old_status: &str,
    new_status: &str,
    changed_by: Option<Uuid>,
    reason: Option<&str>,
    metadata: Option<serde_json::Value>,
) -> Result<TournamentStatusHistoryRow> {
    sqlx::query_as::<_, TournamentStatusHistoryRow>(&format!(
        r#"
        INSERT INTO tournament_status_history (id, tournament_id, old_status, new_status, changed_by, reason, metadata, changed_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, NOW())
        RETURNING {COLUMNS}
        "#
    ))
    .bind(tournament_id)
    .bind(old_status)
    .bind(new_status)
    .bind(changed_by)
    .bind(reason)
    .bind(metadata)
    .fetch_one(executor)
    .await
}

pub async fn list_for_tournament<'e>(
    executor: impl PgExecutor<'e>,
    tournament_id: Uuid,
) -> Result<Vec<TournamentStatusHistoryRow>> {
    sqlx::query_as::<_, TournamentStatusHistoryRow>(&format!(
        "SELECT {COLUMNS} FROM tournament_status_history WHERE tournament_id = $1 ORDER BY changed_at ASC"
    ))
    .bind(tournament_id)
    .fetch_all(executor)
    .await
}
