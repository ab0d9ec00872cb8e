use chrono::Utc;
use infra::engine::advancement;
use infra::engine::types::EnrollmentSnapshot;
use infra::models::SessionRow;
use infra::repos::{tournaments::TournamentRepo, SessionRepo};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::collaborators::UserDirectory;
use crate::error::AppError;

pub enum GroupStageOutcome {
    Completed(EnrollmentSnapshot),
    AlreadyComplete(EnrollmentSnapshot),
    Incomplete { incomplete_session_ids: Vec<Uuid> },
}

/// Closes out the group stage: computes standings, seeds the knockout
/// bracket's round-1 sessions, and writes `enrollment_snapshot` once
/// (spec.md §5: "written once by GroupStageFinalizer; subsequent calls
/// return an already-complete response").
pub async fn finalize_group_stage(
    db: &PgPool,
    session_repo: &SessionRepo,
    tournament_repo: &TournamentRepo,
    user_directory: &dyn UserDirectory,
    tournament_id: Uuid,
) -> Result<GroupStageOutcome, AppError> {
    let tournament = tournament_repo
        .get(tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {tournament_id}")))?;

    if let Some(existing) = tournament.snapshot() {
        if existing.phase == "group_stage_complete" {
            return Ok(GroupStageOutcome::AlreadyComplete(existing));
        }
    }

    let all_sessions = session_repo.list_for_tournament(tournament_id).await?;
    let group_sessions: Vec<SessionRow> = all_sessions
        .iter()
        .filter(|s| s.tournament_phase == "group_stage")
        .cloned()
        .collect();

    let incomplete: Vec<Uuid> = group_sessions
        .iter()
        .filter(|s| !s.is_finalized())
        .map(|s| s.id)
        .collect();
    if !incomplete.is_empty() {
        return Ok(GroupStageOutcome::Incomplete {
            incomplete_session_ids: incomplete,
        });
    }

    let mut participant_ids: Vec<Uuid> = group_sessions
        .iter()
        .flat_map(|s| s.participant_user_ids.clone())
        .collect();
    participant_ids.sort();
    participant_ids.dedup();
    let directory_users = user_directory.list_users_by_ids(&participant_ids).await?;
    let names: BTreeMap<Uuid, String> = directory_users.into_iter().map(|u| (u.id, u.name)).collect();

    let per_group_standings = infra::engine::standings::calculate_standings(&group_sessions, &names);

    let round1_knockout: Vec<&SessionRow> = all_sessions
        .iter()
        .filter(|s| s.tournament_phase == "knockout" && s.tournament_round == 1)
        .collect();

    let seeded = advancement::apply_crossover_seeding(&per_group_standings, round1_knockout.len());

    let mut tx = db.begin().await?;
    for seeding in &seeded {
        if let Some(session) = round1_knockout.get(seeding.session_index) {
            session_repo
                .update_participants(&mut tx, session.id, &seeding.participants)
                .await?;
        }
    }
    tx.commit().await?;

    let total_qualified: usize = seeded.len() * 2;
    let total_groups = per_group_standings.len() as i32;
    let qualified_participant_user_ids: Vec<Uuid> =
        seeded.iter().flat_map(|s| s.participants.to_vec()).collect();

    let snapshot = EnrollmentSnapshot {
        timestamp: Utc::now(),
        phase: "group_stage_complete".to_string(),
        per_group_standings,
        qualified_participant_user_ids,
        qualification_rule: "top_n_crossover".to_string(),
        total_groups,
        total_qualified: total_qualified as i32,
    };

    let payload = serde_json::to_value(&snapshot).map_err(|e| AppError::Internal(e.to_string()))?;
    let mut tx = db.begin().await?;
    tournament_repo
        .write_enrollment_snapshot(&mut tx, tournament_id, payload)
        .await?;
    tx.commit().await?;

    Ok(GroupStageOutcome::Completed(snapshot))
}
