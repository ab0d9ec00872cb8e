use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{db::Db, models::CampusScheduleConfigRow};

const COLUMNS: &str = r#"
    id, tournament_id, campus_id, match_duration_minutes,
    break_duration_minutes, parallel_fields, venue_label, is_active
"#;

#[derive(Clone)]
pub struct CampusScheduleConfigRepo {
    pool: Db,
}

impl CampusScheduleConfigRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn upsert(
        &self,
        tournament_id: Uuid,
        campus_id: Uuid,
        match_duration_minutes: Option<i32>,
        break_duration_minutes: Option<i32>,
        parallel_fields: Option<i32>,
        venue_label: Option<String>,
    ) -> SqlxResult<CampusScheduleConfigRow> {
        sqlx::query_as::<_, CampusScheduleConfigRow>(&format!(
            r#"
            INSERT INTO campus_schedule_configs (
                id, tournament_id, campus_id, match_duration_minutes,
                break_duration_minutes, parallel_fields, venue_label, is_active
            )
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, true)
            ON CONFLICT (tournament_id, campus_id) DO UPDATE SET
                match_duration_minutes = EXCLUDED.match_duration_minutes,
                break_duration_minutes = EXCLUDED.break_duration_minutes,
                parallel_fields = EXCLUDED.parallel_fields,
                venue_label = EXCLUDED.venue_label,
                is_active = true
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tournament_id)
        .bind(campus_id)
        .bind(match_duration_minutes)
        .bind(break_duration_minutes)
        .bind(parallel_fields)
        .bind(venue_label)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get(&self, tournament_id: Uuid, campus_id: Uuid) -> SqlxResult<Option<CampusScheduleConfigRow>> {
        sqlx::query_as::<_, CampusScheduleConfigRow>(&format!(
            "SELECT {COLUMNS} FROM campus_schedule_configs WHERE tournament_id = $1 AND campus_id = $2"
        ))
        .bind(tournament_id)
        .bind(campus_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_for_tournament(&self, tournament_id: Uuid) -> SqlxResult<Vec<CampusScheduleConfigRow>> {
        sqlx::query_as::<_, CampusScheduleConfigRow>(&format!(
            "SELECT {COLUMNS} FROM campus_schedule_configs WHERE tournament_id = $1"
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete(&self, tournament_id: Uuid, campus_id: Uuid) -> SqlxResult<u64> {
        let result = sqlx::query(
            "DELETE FROM campus_schedule_configs WHERE tournament_id = $1 AND campus_id = $2",
        )
        .bind(tournament_id)
        .bind(campus_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
