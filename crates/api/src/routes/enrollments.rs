use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use infra::models::TournamentEnrollmentRow;
use infra::repos::EnrollmentRepo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::permissions::{require_role, Role};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub request_status: String,
    pub is_active: bool,
    pub payment_verified: bool,
}

impl From<TournamentEnrollmentRow> for EnrollmentResponse {
    fn from(row: TournamentEnrollmentRow) -> Self {
        Self {
            id: row.id,
            tournament_id: row.tournament_id,
            user_id: row.user_id,
            request_status: row.request_status,
            is_active: row.is_active,
            payment_verified: row.payment_verified,
        }
    }
}

pub async fn enroll(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), AppError> {
    let claims = require_role(claims.as_ref(), Role::Student)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized("invalid subject claim".into()))?;

    let repo = EnrollmentRepo::new(state.db.clone());
    let row = repo.create(tournament_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn unenroll(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let claims = require_role(claims.as_ref(), Role::Student)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized("invalid subject claim".into()))?;

    let repo = EnrollmentRepo::new(state.db.clone());
    let affected = repo.deactivate(tournament_id, user_id).await?;
    if affected == 0 {
        return Err(AppError::NotFound(format!(
            "enrollment for user {user_id} in tournament {tournament_id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    let repo = EnrollmentRepo::new(state.db.clone());
    let rows = repo.list_for_tournament(tournament_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchApproveRequest {
    pub user_ids: Vec<Uuid>,
}

pub async fn batch_approve(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tournament_id): Path<Uuid>,
    Json(req): Json<BatchApproveRequest>,
) -> Result<Json<Vec<EnrollmentResponse>>, AppError> {
    require_role(claims.as_ref(), Role::Admin)?;

    let repo = EnrollmentRepo::new(state.db.clone());
    let rows = repo.batch_approve(tournament_id, &req.user_ids).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
