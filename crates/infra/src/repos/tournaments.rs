use chrono::NaiveDate;
use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{db::Db, models::TournamentRow, pagination::LimitOffset};

#[derive(Debug, Clone, Default)]
pub struct TournamentFilter {
    pub tournament_status: Option<String>,
    pub specialization_family: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

const COLUMNS: &str = r#"
    id, display_name, short_code, specialization_family, age_group,
    start_date, end_date, tournament_format, tournament_type_code,
    scoring_type, ranking_direction, measurement_unit,
    match_duration_minutes, break_duration_minutes, parallel_fields,
    tournament_status, master_instructor_id, enrollment_snapshot,
    tournament_config, created_at, updated_at
"#;

#[derive(Clone)]
pub struct TournamentRepo {
    pool: Db,
}

impl TournamentRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<TournamentRow>> {
        sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Row-level pessimistic lock for the tournament finalizer (spec §4.8).
    pub async fn get_for_update(
        &self,
        executor: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> SqlxResult<Option<TournamentRow>> {
        sqlx::query_as::<_, TournamentRow>(&format!(
            "SELECT {COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn list(
        &self,
        filter: TournamentFilter,
        page: Option<LimitOffset>,
    ) -> SqlxResult<Vec<TournamentRow>> {
        let p = page.unwrap_or_default();
        sqlx::query_as::<_, TournamentRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM tournaments
            WHERE ($1::text IS NULL OR tournament_status = $1)
              AND ($2::text IS NULL OR specialization_family = $2)
              AND ($3::date IS NULL OR start_date >= $3)
              AND ($4::date IS NULL OR end_date <= $4)
            ORDER BY start_date DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.tournament_status)
        .bind(filter.specialization_family)
        .bind(filter.from)
        .bind(filter.to)
        .bind(p.limit)
        .bind(p.offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_status(
        &self,
        executor: &mut sqlx::PgConnection,
        id: Uuid,
        new_status: &str,
    ) -> SqlxResult<Option<TournamentRow>> {
        sqlx::query_as::<_, TournamentRow>(&format!(
            r#"
            UPDATE tournaments
            SET tournament_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_status)
        .fetch_optional(executor)
        .await
    }

    pub async fn write_enrollment_snapshot(
        &self,
        executor: &mut sqlx::PgConnection,
        id: Uuid,
        snapshot: serde_json::Value,
    ) -> SqlxResult<()> {
        sqlx::query("UPDATE tournaments SET enrollment_snapshot = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(snapshot)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> SqlxResult<u64> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
