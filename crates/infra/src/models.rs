use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::engine::types::{
    EnrollmentSnapshot, GameResults, RankingDirection, RoundsData, ScoringType,
    TournamentFormat, TournamentTypeCode,
};
use crate::error::EngineError;

fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

#[derive(Debug, Clone, FromRow)]
pub struct TournamentRow {
    pub id: Uuid,
    pub display_name: String,
    pub short_code: String,
    pub specialization_family: Option<String>,
    pub age_group: Option<String>,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub tournament_format: String,
    pub tournament_type_code: Option<String>,
    pub scoring_type: Option<String>,
    pub ranking_direction: String,
    pub measurement_unit: Option<String>,
    pub match_duration_minutes: i32,
    pub break_duration_minutes: i32,
    pub parallel_fields: i32,
    pub tournament_status: String,
    pub master_instructor_id: Option<Uuid>,
    pub enrollment_snapshot: Option<serde_json::Value>,
    pub tournament_config: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TournamentRow {
    pub fn format(&self) -> Result<TournamentFormat, EngineError> {
        parse_enum(&self.tournament_format)
            .ok_or_else(|| EngineError::UnknownScoringType(self.tournament_format.clone()))
    }

    pub fn type_code(&self) -> Option<TournamentTypeCode> {
        self.tournament_type_code.as_deref().and_then(parse_enum)
    }

    pub fn scoring(&self) -> Option<ScoringType> {
        self.scoring_type.as_deref().and_then(parse_enum)
    }

    pub fn direction(&self) -> Result<RankingDirection, EngineError> {
        parse_enum(&self.ranking_direction)
            .ok_or_else(|| EngineError::UnknownScoringType(self.ranking_direction.clone()))
    }

    pub fn reward_policy(&self) -> Option<serde_json::Value> {
        self.tournament_config
            .as_ref()
            .and_then(|c| c.get("reward_policy"))
            .cloned()
    }

    pub fn snapshot(&self) -> Option<EnrollmentSnapshot> {
        self.enrollment_snapshot
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TournamentEnrollmentRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub request_status: String,
    pub is_active: bool,
    pub payment_verified: bool,
    pub approved_at: Option<NaiveDateTime>,
    pub payment_reference_code: Option<String>,
    pub created_at: NaiveDateTime,
}

impl TournamentEnrollmentRow {
    pub fn is_eligible(&self) -> bool {
        self.is_active && self.request_status == "APPROVED"
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub title: String,
    pub date_start: NaiveDateTime,
    pub date_end: NaiveDateTime,
    pub campus_id: Option<Uuid>,
    pub tournament_phase: String,
    pub tournament_round: i32,
    pub group_identifier: Option<String>,
    pub match_format: String,
    pub scoring_type: Option<String>,
    pub participant_user_ids: Vec<Uuid>,
    pub rounds_data: Option<serde_json::Value>,
    pub game_results: Option<serde_json::Value>,
}

impl SessionRow {
    pub fn is_finalized(&self) -> bool {
        self.game_results.is_some()
    }

    pub fn rounds(&self) -> Option<RoundsData> {
        self.rounds_data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn results(&self) -> Option<GameResults> {
        self.game_results
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CampusScheduleConfigRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub campus_id: Uuid,
    pub match_duration_minutes: Option<i32>,
    pub break_duration_minutes: Option<i32>,
    pub parallel_fields: Option<i32>,
    pub venue_label: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct TournamentRankingRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub participant_type: String,
    pub points: Decimal,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub rank: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RewardDistributionRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub distributed_at: NaiveDateTime,
    pub total_credits: Decimal,
    pub total_xp: i64,
    pub line_items: serde_json::Value,
}

#[derive(Debug, Clone, FromRow)]
pub struct TournamentStatusHistoryRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub changed_by: Option<Uuid>,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub changed_at: NaiveDateTime,
}
