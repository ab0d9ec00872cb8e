use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use infra::EngineError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error")]
    Db(#[from] sqlx::Error),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, details) = match &self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "bad_request", None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", None),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database", None),
            AppError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", None),
            AppError::Engine(engine_err) => engine_status(engine_err),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                message: self.to_string(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

fn engine_status(err: &EngineError) -> (StatusCode, &'static str, Option<serde_json::Value>) {
    match err {
        EngineError::UnknownScoringType(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "unknown_scoring_type", None)
        }
        EngineError::InvalidResult {
            reason,
            offending_user_ids,
            duplicate_values,
        } => (
            StatusCode::BAD_REQUEST,
            "invalid_result",
            Some(json!({
                "reason": reason,
                "offending_user_ids": offending_user_ids,
                "duplicate_values": duplicate_values,
            })),
        ),
        EngineError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            "invalid_transition",
            Some(json!({ "from": from, "to": to })),
        ),
        EngineError::IncompleteStage {
            incomplete_count,
            incomplete_session_ids,
        } => (
            StatusCode::BAD_REQUEST,
            "incomplete_stage",
            Some(json!({
                "incomplete_count": incomplete_count,
                "incomplete_session_ids": incomplete_session_ids,
            })),
        ),
        EngineError::AlreadyFinalized => (StatusCode::BAD_REQUEST, "already_finalized", None),
        EngineError::NotFound(resource) => (
            StatusCode::NOT_FOUND,
            "not_found",
            Some(json!({ "resource": resource })),
        ),
    }
}
