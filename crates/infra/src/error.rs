use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the pure tournament engine (ranking, scheduling,
/// finalization, advancement). Carries no HTTP knowledge — `api::AppError`
/// wraps this with a status code and JSON body.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown scoring type: {0}")]
    UnknownScoringType(String),

    #[error("invalid result submission: {reason}")]
    InvalidResult {
        reason: String,
        offending_user_ids: Vec<Uuid>,
        duplicate_values: Vec<i32>,
    },

    #[error("transition from {from} to {to} is not permitted")]
    InvalidTransition { from: String, to: String },

    #[error("stage incomplete: {incomplete_count} session(s) missing results")]
    IncompleteStage {
        incomplete_count: usize,
        incomplete_session_ids: Vec<Uuid>,
    },

    #[error("already finalized")]
    AlreadyFinalized,

    #[error("not found: {0}")]
    NotFound(String),
}

impl EngineError {
    pub fn invalid_result(reason: impl Into<String>) -> Self {
        EngineError::InvalidResult {
            reason: reason.into(),
            offending_user_ids: Vec::new(),
            duplicate_values: Vec::new(),
        }
    }

    pub fn invalid_result_users(reason: impl Into<String>, offending_user_ids: Vec<Uuid>) -> Self {
        EngineError::InvalidResult {
            reason: reason.into(),
            offending_user_ids,
            duplicate_values: Vec::new(),
        }
    }

    pub fn invalid_result_duplicates(reason: impl Into<String>, duplicate_values: Vec<i32>) -> Self {
        EngineError::InvalidResult {
            reason: reason.into(),
            offending_user_ids: Vec::new(),
            duplicate_values,
        }
    }
}
