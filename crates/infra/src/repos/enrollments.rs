use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{db::Db, models::TournamentEnrollmentRow};

#[derive(Clone)]
pub struct EnrollmentRepo {
    pool: Db,
}

const COLUMNS: &str = r#"
    id, tournament_id, user_id, request_status, is_active,
    payment_verified, approved_at, payment_reference_code, created_at
"#;

impl EnrollmentRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
    ) -> SqlxResult<TournamentEnrollmentRow> {
        sqlx::query_as::<_, TournamentEnrollmentRow>(&format!(
            r#"
            INSERT INTO tournament_enrollments (id, tournament_id, user_id, request_status, is_active, payment_verified, created_at)
            VALUES (gen_random_uuid(), $1, $2, 'PENDING', true, false, NOW())
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tournament_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn deactivate(&self, tournament_id: Uuid, user_id: Uuid) -> SqlxResult<u64> {
        let result = sqlx::query(
            "UPDATE tournament_enrollments SET is_active = false WHERE tournament_id = $1 AND user_id = $2",
        )
        .bind(tournament_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_active_approved(&self, tournament_id: Uuid) -> SqlxResult<Vec<TournamentEnrollmentRow>> {
        sqlx::query_as::<_, TournamentEnrollmentRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM tournament_enrollments
            WHERE tournament_id = $1 AND is_active = true AND request_status = 'APPROVED'
            ORDER BY approved_at ASC NULLS LAST
            "#
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_for_tournament(&self, tournament_id: Uuid) -> SqlxResult<Vec<TournamentEnrollmentRow>> {
        sqlx::query_as::<_, TournamentEnrollmentRow>(&format!(
            "SELECT {COLUMNS} FROM tournament_enrollments WHERE tournament_id = $1 ORDER BY created_at ASC"
        ))
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn batch_approve(
        &self,
        tournament_id: Uuid,
        user_ids: &[Uuid],
    ) -> SqlxResult<Vec<TournamentEnrollmentRow>> {
        sqlx::query_as::<_, TournamentEnrollmentRow>(&format!(
            r#"
            UPDATE tournament_enrollments
            SET request_status = 'APPROVED', approved_at = NOW()
            WHERE tournament_id = $1 AND user_id = ANY($2)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tournament_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
    }
}
