mod common;

use api::error::AppError;
use api::services::result_service;
use common::{create_test_session, create_test_tournament, create_test_user, enroll_approved, TestSessionSpec, TestTournamentSpec};
use infra::repos::tournaments::TournamentRepo;
use infra::repos::{EnrollmentRepo, SessionRepo};

/// Result Validator rejects submissions naming a user who never enrolled.
#[tokio::test]
async fn submission_from_unenrolled_user_is_rejected() {
    let state = common::setup_test_db().await;

    let enrolled = create_test_user(&state, "enrolled@example.com", "Enrolled", "STUDENT").await;
    let outsider = create_test_user(&state, "outsider@example.com", "Outsider", "STUDENT").await;

    let tournament_id = create_test_tournament(
        &state,
        TestTournamentSpec {
            display_name: "Ladder League",
            short_code: "LADDER-1",
            tournament_format: "HEAD_TO_HEAD",
            tournament_type_code: Some("LEAGUE"),
            scoring_type: None,
            ranking_direction: "DESC",
            tournament_status: "ONGOING",
            reward_policy: None,
        },
    )
    .await;

    enroll_approved(&state, tournament_id, enrolled).await;

    let session_id = create_test_session(
        &state,
        TestSessionSpec {
            tournament_id,
            tournament_phase: "league",
            tournament_round: 1,
            match_format: "HEAD_TO_HEAD",
            participant_user_ids: vec![enrolled, outsider],
            rounds_data: None,
            game_results: None,
        },
    )
    .await;

    let tournament_repo = TournamentRepo::new(state.db.clone());
    let session_repo = SessionRepo::new(state.db.clone());
    let enrollment_repo = EnrollmentRepo::new(state.db.clone());

    let tournament = tournament_repo.get(tournament_id).await.unwrap().unwrap();
    let session = session_repo.get(session_id).await.unwrap().unwrap();
    let enrollments = enrollment_repo.list_for_tournament(tournament_id).await.unwrap();

    let result = result_service::validate_submission(&tournament, &session, &enrollments, &[enrolled, outsider]);

    match result {
        Err(AppError::Engine(infra::EngineError::InvalidResult { offending_user_ids, .. })) => {
            assert_eq!(offending_user_ids, vec![outsider]);
        }
        other => panic!("expected InvalidResult naming the outsider, got {other:?}"),
    }
}

/// A session that already carries `game_results` cannot accept a second
/// result submission.
#[tokio::test]
async fn submission_to_already_finalized_session_is_rejected() {
    let state = common::setup_test_db().await;

    let a = create_test_user(&state, "a2@example.com", "A", "STUDENT").await;
    let b = create_test_user(&state, "b2@example.com", "B", "STUDENT").await;

    let tournament_id = create_test_tournament(
        &state,
        TestTournamentSpec {
            display_name: "Knockout Cup",
            short_code: "KO-1",
            tournament_format: "HEAD_TO_HEAD",
            tournament_type_code: Some("KNOCKOUT"),
            scoring_type: None,
            ranking_direction: "DESC",
            tournament_status: "ONGOING",
            reward_policy: None,
        },
    )
    .await;

    enroll_approved(&state, tournament_id, a).await;
    enroll_approved(&state, tournament_id, b).await;

    let already_recorded = serde_json::json!({
        "match_format": "HEAD_TO_HEAD",
        "round_number": null,
        "participants": [],
        "raw_results": []
    });

    let session_id = create_test_session(
        &state,
        TestSessionSpec {
            tournament_id,
            tournament_phase: "knockout",
            tournament_round: 1,
            match_format: "HEAD_TO_HEAD",
            participant_user_ids: vec![a, b],
            rounds_data: None,
            game_results: Some(already_recorded),
        },
    )
    .await;

    let tournament_repo = TournamentRepo::new(state.db.clone());
    let session_repo = SessionRepo::new(state.db.clone());
    let enrollment_repo = EnrollmentRepo::new(state.db.clone());

    let tournament = tournament_repo.get(tournament_id).await.unwrap().unwrap();
    let session = session_repo.get(session_id).await.unwrap().unwrap();
    let enrollments = enrollment_repo.list_for_tournament(tournament_id).await.unwrap();

    let result = result_service::validate_submission(&tournament, &session, &enrollments, &[a, b]);

    assert!(matches!(
        result,
        Err(AppError::Engine(infra::EngineError::AlreadyFinalized))
    ));
}
