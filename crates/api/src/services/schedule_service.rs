use infra::engine::schedule::{
    self, default_start, ResolvedDurations, SessionDraft,
};
use infra::engine::types::TournamentTypeCode;
use infra::models::{CampusScheduleConfigRow, TournamentRow};
use infra::repos::{EnrollmentRepo, SessionRepo};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateSessionsRequest {
    pub num_groups: Option<usize>,
    pub top_n_per_group: Option<usize>,
    pub total_rounds: Option<i32>,
    pub campus_id: Option<Uuid>,
}

/// Resolves the roster, picks the generator for `tournament_type_code` /
/// `tournament_format`, and returns the draft sessions without persisting
/// them (used by both `generate-sessions` and `preview-sessions`).
pub async fn build_drafts(
    enrollment_repo: &EnrollmentRepo,
    tournament: &TournamentRow,
    campus: Option<&CampusScheduleConfigRow>,
    req: &GenerateSessionsRequest,
) -> Result<Vec<SessionDraft>, AppError> {
    let roster: Vec<Uuid> = enrollment_repo
        .list_active_approved(tournament.id)
        .await?
        .into_iter()
        .map(|e| e.user_id)
        .collect();

    let tournament_durations = ResolvedDurations {
        match_duration_minutes: tournament.match_duration_minutes,
        break_duration_minutes: tournament.break_duration_minutes,
        parallel_fields: tournament.parallel_fields,
    };
    let campus_durations = campus.map(|c| ResolvedDurations {
        match_duration_minutes: c.match_duration_minutes.unwrap_or(tournament.match_duration_minutes),
        break_duration_minutes: c.break_duration_minutes.unwrap_or(tournament.break_duration_minutes),
        parallel_fields: c.parallel_fields.unwrap_or(tournament.parallel_fields),
    });
    let durations = schedule::resolve_durations(campus_durations.as_ref(), &tournament_durations, None);
    let campus_id = req.campus_id.or_else(|| campus.map(|c| c.campus_id));
    let start = default_start(tournament.start_date);

    use infra::engine::types::TournamentFormat;
    let drafts = match tournament.format()? {
        TournamentFormat::IndividualRanking => {
            let total_rounds = req.total_rounds.unwrap_or(1);
            schedule::generate_individual_ranking(&roster, total_rounds, start, &durations, campus_id)
        }
        TournamentFormat::HeadToHead => match tournament.type_code() {
            Some(TournamentTypeCode::League) | None => {
                schedule::generate_league(&roster, start, &durations, campus_id)
            }
            Some(TournamentTypeCode::Knockout) => {
                schedule::generate_knockout(&roster, start, &durations, campus_id)
            }
            Some(TournamentTypeCode::GroupKnockout) => {
                let num_groups = req.num_groups.unwrap_or(4);
                let top_n = req.top_n_per_group.unwrap_or(2);
                schedule::generate_group_knockout(&roster, num_groups, top_n, start, &durations, campus_id)
            }
            Some(TournamentTypeCode::Swiss) => {
                return Err(infra::EngineError::UnknownScoringType(
                    "swiss tournament_type_code is reserved, not implemented".into(),
                )
                .into())
            }
        },
    };

    Ok(drafts)
}

/// Idempotency (spec.md §4.6): regeneration only permitted while the
/// tournament is at or before SEEKING_INSTRUCTOR, or after an explicit
/// `DELETE /sessions`.
pub fn can_generate(tournament: &TournamentRow) -> bool {
    matches!(
        tournament.tournament_status.as_str(),
        "DRAFT" | "SEEKING_INSTRUCTOR"
    )
}

pub async fn generate_and_persist(
    db: &PgPool,
    session_repo: &SessionRepo,
    tournament: &TournamentRow,
    drafts: Vec<SessionDraft>,
) -> Result<Vec<infra::models::SessionRow>, AppError> {
    let existing = session_repo.list_for_tournament(tournament.id).await?;
    if !existing.is_empty() && !can_generate(tournament) {
        return Err(AppError::BadRequest(
            "sessions already exist; DELETE /sessions before regenerating".into(),
        ));
    }

    let mut tx = db.begin().await?;
    let rows = session_repo.insert_drafts(&mut tx, tournament.id, &drafts).await?;
    tx.commit().await?;
    Ok(rows)
}
