mod common;

use api::error::AppError;
use api::services::{session_finalizer, tournament_finalizer};
use common::{
    create_test_session, create_test_tournament, create_test_user, enroll_approved,
    TestSessionSpec, TestTournamentSpec,
};
use infra::repos::tournaments::TournamentRepo;
use infra::repos::SessionRepo;

/// Spec scenario S5: a session can only be finalized once; the second
/// attempt is rejected rather than silently re-ranking.
#[tokio::test]
async fn double_session_finalization_is_rejected() {
    let state = common::setup_test_db().await;

    let user_a = create_test_user(&state, "a@example.com", "Alice", "STUDENT").await;
    let user_b = create_test_user(&state, "b@example.com", "Bob", "STUDENT").await;

    let tournament_id = create_test_tournament(
        &state,
        TestTournamentSpec {
            display_name: "Sprint Trials",
            short_code: "SPRINT-S5",
            tournament_format: "INDIVIDUAL_RANKING",
            tournament_type_code: None,
            scoring_type: Some("TIME_ASC"),
            ranking_direction: "ASC",
            tournament_status: "ONGOING",
            reward_policy: None,
        },
    )
    .await;

    enroll_approved(&state, tournament_id, user_a).await;
    enroll_approved(&state, tournament_id, user_b).await;

    let rounds_data = serde_json::json!({
        "total_rounds": 1,
        "completed_rounds": 1,
        "round_results": {
            "1": { user_a.to_string(): "12.4", user_b.to_string(): "13.1" }
        }
    });

    let session_id = create_test_session(
        &state,
        TestSessionSpec {
            tournament_id,
            tournament_phase: "individual_ranking",
            tournament_round: 1,
            match_format: "INDIVIDUAL_RANKING",
            participant_user_ids: vec![user_a, user_b],
            rounds_data: Some(rounds_data),
            game_results: None,
        },
    )
    .await;

    let session_repo = SessionRepo::new(state.db.clone());
    let tournament_repo = TournamentRepo::new(state.db.clone());

    let first = session_finalizer::finalize_session(
        &state.db,
        &session_repo,
        &tournament_repo,
        session_id,
        user_a,
        "Instructor".to_string(),
    )
    .await;
    assert!(first.is_ok(), "first finalization should succeed: {:?}", first.err());

    let second = session_finalizer::finalize_session(
        &state.db,
        &session_repo,
        &tournament_repo,
        session_id,
        user_a,
        "Instructor".to_string(),
    )
    .await;

    match second {
        Err(AppError::Engine(infra::EngineError::AlreadyFinalized)) => {}
        other => panic!("expected AlreadyFinalized, got {other:?}"),
    }
}

/// Spec scenario S6: triggering the finalizer twice on a tournament that
/// is already COMPLETED must not distribute rewards twice.
#[tokio::test]
async fn tournament_finalization_distributes_rewards_exactly_once() {
    let state = common::setup_test_db().await;

    let user_a = create_test_user(&state, "c@example.com", "Carla", "STUDENT").await;
    let user_b = create_test_user(&state, "d@example.com", "Dan", "STUDENT").await;

    let reward_policy = serde_json::json!({
        "1": { "credits": "10", "xp": 100, "badge": "gold" },
        "participant": { "credits": "1", "xp": 5, "badge": null }
    });

    let tournament_id = create_test_tournament(
        &state,
        TestTournamentSpec {
            display_name: "Finals Cup",
            short_code: "FINALS-S6",
            tournament_format: "INDIVIDUAL_RANKING",
            tournament_type_code: None,
            scoring_type: Some("TIME_ASC"),
            ranking_direction: "ASC",
            tournament_status: "IN_PROGRESS",
            reward_policy: Some(reward_policy),
        },
    )
    .await;

    enroll_approved(&state, tournament_id, user_a).await;
    enroll_approved(&state, tournament_id, user_b).await;

    let rounds_data = serde_json::json!({
        "total_rounds": 1,
        "completed_rounds": 1,
        "round_results": {
            "1": { user_a.to_string(): "11.0", user_b.to_string(): "12.0" }
        }
    });

    let session_id = create_test_session(
        &state,
        TestSessionSpec {
            tournament_id,
            tournament_phase: "individual_ranking",
            tournament_round: 1,
            match_format: "INDIVIDUAL_RANKING",
            participant_user_ids: vec![user_a, user_b],
            rounds_data: Some(rounds_data),
            game_results: None,
        },
    )
    .await;

    let session_repo = SessionRepo::new(state.db.clone());
    let tournament_repo = TournamentRepo::new(state.db.clone());

    session_finalizer::finalize_session(
        &state.db,
        &session_repo,
        &tournament_repo,
        session_id,
        user_a,
        "Instructor".to_string(),
    )
    .await
    .expect("session finalization should succeed");

    let outcome_one = tournament_finalizer::finalize_tournament(
        &state.db,
        &session_repo,
        &tournament_repo,
        state.credit_ledger.as_ref(),
        state.audit_log.as_ref(),
        tournament_id,
        None,
    )
    .await
    .expect("first tournament finalization should succeed");

    let outcome_two = tournament_finalizer::finalize_tournament(
        &state.db,
        &session_repo,
        &tournament_repo,
        state.credit_ledger.as_ref(),
        state.audit_log.as_ref(),
        tournament_id,
        None,
    )
    .await
    .expect("second tournament finalization should stay idempotent");

    let summary_one = match outcome_one {
        tournament_finalizer::TournamentFinalizeOutcome::Completed(s) => s,
        tournament_finalizer::TournamentFinalizeOutcome::AlreadyCompleted(_) => {
            panic!("expected Completed outcome on first finalization")
        }
    };
    let summary_two = match outcome_two {
        tournament_finalizer::TournamentFinalizeOutcome::AlreadyCompleted(s) => s,
        tournament_finalizer::TournamentFinalizeOutcome::Completed(_) => {
            panic!("expected AlreadyCompleted outcome on second finalization")
        }
    };

    assert_eq!(summary_one.total_credits, summary_two.total_credits);
    assert_eq!(summary_one.line_items.len(), summary_two.line_items.len());

    let distributions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reward_distributions WHERE tournament_id = $1")
        .bind(tournament_id)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(distributions, 1, "reward_distributions must have exactly one row");

    let credit_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credit_ledger_entries WHERE linked_entity_id = $1")
        .bind(tournament_id)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(credit_entries, 2, "credits should be granted exactly once per ranked participant");
}
