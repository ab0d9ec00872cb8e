use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{db::Db, engine::schedule::SessionDraft, models::SessionRow};

const COLUMNS: &str = r#"
    id, tournament_id, title, date_start, date_end, campus_id,
    tournament_phase, tournament_round, group_identifier, match_format,
    scoring_type, participant_user_ids, rounds_data, game_results
"#;

#[derive(Clone)]
pub struct SessionRepo {
    pool: Db,
}

impl SessionRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn insert_drafts(
        &self,
        executor: &mut sqlx::PgConnection,
        tournament_id: Uuid,
        drafts: &[SessionDraft],
    ) -> SqlxResult<Vec<SessionRow>> {
        let mut rows = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let row = sqlx::query_as::<_, SessionRow>(&format!(
                r#"
                INSERT INTO sessions (
                    id, tournament_id, title, date_start, date_end, campus_id,
                    tournament_phase, tournament_round, group_identifier,
                    match_format, participant_user_ids, rounds_data
                )
                VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING {COLUMNS}
                "#
            ))
            .bind(tournament_id)
            .bind(&draft.title)
            .bind(draft.date_start)
            .bind(draft.date_end)
            .bind(draft.campus_id)
            .bind(serde_json::to_value(draft.tournament_phase).unwrap().as_str().unwrap())
            .bind(draft.tournament_round)
            .bind(&draft.group_identifier)
            .bind(serde_json::to_value(draft.match_format).unwrap().as_str().unwrap())
            .bind(&draft.participant_user_ids)
            .bind(draft.rounds_data.as_ref().map(|r| serde_json::to_value(r).unwrap()))
            .fetch_one(&mut *executor)
            .await?;
            rows.push(row);
        }
        Ok(rows)
    }

    pub async fn list_for_tournament(&self, tournament_id: Uuid) -> SqlxResult<Vec<SessionRow>> {
        sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {COLUMNS} FROM sessions WHERE tournament_id = $1 ORDER BY tournament_round ASC, date_start ASC"
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_by_phase(&self, tournament_id: Uuid, phase: &str) -> SqlxResult<Vec<SessionRow>> {
        sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {COLUMNS} FROM sessions WHERE tournament_id = $1 AND tournament_phase = $2 ORDER BY tournament_round ASC"
        ))
        .bind(tournament_id)
        .bind(phase)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<SessionRow>> {
        sqlx::query_as::<_, SessionRow>(&format!("SELECT {COLUMNS} FROM sessions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Row-level lock used by finalizers to guard against concurrent
    /// double-finalization of the same session.
    pub async fn get_for_update(
        &self,
        executor: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> SqlxResult<Option<SessionRow>> {
        sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn update_rounds_data(
        &self,
        id: Uuid,
        rounds_data: serde_json::Value,
    ) -> SqlxResult<()> {
        sqlx::query("UPDATE sessions SET rounds_data = $2 WHERE id = $1")
            .bind(id)
            .bind(rounds_data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn write_game_results(
        &self,
        executor: &mut sqlx::PgConnection,
        id: Uuid,
        game_results: serde_json::Value,
    ) -> SqlxResult<()> {
        sqlx::query("UPDATE sessions SET game_results = $2 WHERE id = $1")
            .bind(id)
            .bind(game_results)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_participants(
        &self,
        executor: &mut sqlx::PgConnection,
        id: Uuid,
        participant_user_ids: &[Uuid],
    ) -> SqlxResult<()> {
        sqlx::query("UPDATE sessions SET participant_user_ids = $2 WHERE id = $1")
            .bind(id)
            .bind(participant_user_ids)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_for_tournament(&self, tournament_id: Uuid) -> SqlxResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
