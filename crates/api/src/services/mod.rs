pub mod group_stage_finalizer;
pub mod ranking_service;
pub mod result_service;
pub mod reward_orchestrator;
pub mod schedule_service;
pub mod session_finalizer;
pub mod tournament_finalizer;
