use infra::repos::{reward_distributions, rankings, tournaments::TournamentRepo};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::collaborators::{AuditLog, CreditLedger};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct RewardLineItem {
    pub user_id: Uuid,
    pub rank: Option<i32>,
    pub credits: Decimal,
    pub xp: i64,
    pub badge: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardSummary {
    pub tournament_id: Uuid,
    pub total_credits: Decimal,
    pub total_xp: i64,
    pub line_items: Vec<RewardLineItem>,
}

#[derive(serde::Deserialize)]
struct RewardEntry {
    credits: Decimal,
    xp: i64,
    badge: Option<String>,
}

/// Distributes rewards for a `COMPLETED` tournament, exactly once
/// (spec.md §4.10). The pre-check here plus the storage-level unique
/// index on `reward_distributions.tournament_id` together make the path
/// safe under concurrent admin retries.
pub async fn distribute_rewards_for_tournament(
    db: &PgPool,
    tournament_repo: &TournamentRepo,
    credit_ledger: &dyn CreditLedger,
    audit_log: &dyn AuditLog,
    tournament_id: Uuid,
) -> Result<RewardSummary, AppError> {
    if let Some(existing) = reward_distributions::get_by_tournament(db, tournament_id).await? {
        let line_items: Vec<RewardLineItem> =
            serde_json::from_value(existing.line_items).unwrap_or_default();
        return Ok(RewardSummary {
            tournament_id,
            total_credits: existing.total_credits,
            total_xp: existing.total_xp,
            line_items,
        });
    }

    let tournament = tournament_repo
        .get(tournament_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tournament {tournament_id}")))?;

    let reward_policy = tournament
        .reward_policy()
        .ok_or_else(|| AppError::BadRequest("tournament has no reward_policy configured".into()))?;

    let ranking_rows = rankings::list_by_tournament(db, tournament_id).await?;

    let mut tx = db.begin().await?;
    let mut line_items = Vec::with_capacity(ranking_rows.len());
    let mut total_credits = Decimal::ZERO;
    let mut total_xp: i64 = 0;

    for row in &ranking_rows {
        let Some(user_id) = row.user_id else { continue };
        let entry = lookup_reward(&reward_policy, row.rank);

        credit_ledger
            .credit(
                &mut tx,
                user_id,
                entry.credits,
                "tournament_reward",
                &format!("reward for tournament {tournament_id}"),
                tournament_id,
            )
            .await?;

        audit_log
            .log(
                &mut tx,
                "reward_distributed",
                Some(user_id),
                "tournament",
                tournament_id,
                serde_json::json!({ "rank": row.rank, "credits": entry.credits, "xp": entry.xp }),
            )
            .await;

        total_credits += entry.credits;
        total_xp += entry.xp;
        line_items.push(RewardLineItem {
            user_id,
            rank: row.rank,
            credits: entry.credits,
            xp: entry.xp,
            badge: entry.badge,
        });
    }

    let line_items_json = serde_json::to_value(&line_items).map_err(|e| AppError::Internal(e.to_string()))?;
    reward_distributions::create(&mut *tx, tournament_id, total_credits, total_xp, line_items_json).await?;
    tx.commit().await?;

    Ok(RewardSummary {
        tournament_id,
        total_credits,
        total_xp,
        line_items,
    })
}

fn lookup_reward(policy: &JsonValue, rank: Option<i32>) -> RewardEntry {
    let key = rank.map(|r| r.to_string());
    let value = key
        .as_deref()
        .and_then(|k| policy.get(k))
        .or_else(|| policy.get("participant"));

    value
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(RewardEntry {
            credits: Decimal::ZERO,
            xp: 0,
            badge: None,
        })
}
