//! Result Processor (spec §4.2): validates submitted raw match results
//! per `match_format` and derives per-session `(user_id, rank)` pairs
//! for every format other than INDIVIDUAL_RANKING scoring strategies.

use std::collections::HashSet;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::EngineError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawResult {
    pub user_id: Uuid,
    pub placement: Option<i32>,
    pub result: Option<String>,
    pub score: Option<f64>,
    pub team: Option<String>,
    pub team_score: Option<f64>,
    pub opponent_score: Option<f64>,
    pub time_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRank {
    pub user_id: Uuid,
    pub rank: i32,
}

/// Injection seam for SKILL_RATING (spec §9): rating criteria and
/// judge-aggregation rules are undefined upstream, so the default
/// implementation raises and callers may supply their own.
pub trait SkillRatingProcessor {
    fn process(&self, results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError>;
}

fn reject_empty(results: &[RawResult]) -> Result<(), EngineError> {
    if results.is_empty() {
        return Err(EngineError::invalid_result("result batch must not be empty"));
    }
    Ok(())
}

fn individual_ranking(results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError> {
    reject_empty(results)?;
    let n = results.len() as i32;
    let mut placements = Vec::with_capacity(results.len());
    for r in results {
        let Some(p) = r.placement else {
            return Err(EngineError::invalid_result_users(
                "every result requires a placement",
                vec![r.user_id],
            ));
        };
        placements.push((r.user_id, p));
    }
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for (_, p) in &placements {
        if !seen.insert(*p) {
            duplicates.push(*p);
        }
    }
    if !duplicates.is_empty() {
        return Err(EngineError::invalid_result_duplicates(
            "placements must be unique",
            duplicates,
        ));
    }
    let mut sorted_placements: Vec<i32> = placements.iter().map(|(_, p)| *p).collect();
    sorted_placements.sort_unstable();
    if sorted_placements != (1..=n).collect::<Vec<_>>() {
        return Err(EngineError::invalid_result(
            "placements must start at 1 and be contiguous",
        ));
    }
    Ok(placements
        .into_iter()
        .map(|(user_id, rank)| DerivedRank { user_id, rank })
        .collect())
}

/// HEAD_TO_HEAD dispatches to the WIN_LOSS or SCORE_BASED sub-contract
/// (spec §4.2) based on which fields the submission actually carries,
/// since `match_format` itself only ever stores the single string
/// `"HEAD_TO_HEAD"`.
fn head_to_head(results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError> {
    reject_empty(results)?;
    if results.iter().all(|r| r.result.is_some()) {
        head_to_head_win_loss(results)
    } else if results.iter().all(|r| r.score.is_some()) {
        head_to_head_score_based(results)
    } else {
        Err(EngineError::invalid_result(
            "HEAD_TO_HEAD requires either `result` (WIN/LOSS) or `score` for every participant",
        ))
    }
}

fn head_to_head_win_loss(results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError> {
    reject_empty(results)?;
    if results.len() != 2 {
        return Err(EngineError::invalid_result(
            "HEAD_TO_HEAD WIN_LOSS requires exactly two results",
        ));
    }
    let mut ranked = Vec::with_capacity(2);
    for r in results {
        let outcome = r.result.as_deref().ok_or_else(|| {
            EngineError::invalid_result_users("result field required", vec![r.user_id])
        })?;
        let rank = match outcome {
            "WIN" => 1,
            "LOSS" => 2,
            other => {
                return Err(EngineError::invalid_result(format!(
                    "unknown head-to-head result {other}"
                )))
            }
        };
        ranked.push(DerivedRank { user_id: r.user_id, rank });
    }
    Ok(ranked)
}

fn head_to_head_score_based(results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError> {
    reject_empty(results)?;
    if results.len() != 2 {
        return Err(EngineError::invalid_result(
            "HEAD_TO_HEAD SCORE_BASED requires exactly two results",
        ));
    }
    let mut with_scores = Vec::with_capacity(2);
    for r in results {
        let score = r.score.ok_or_else(|| {
            EngineError::invalid_result_users("score field required", vec![r.user_id])
        })?;
        with_scores.push((r.user_id, score));
    }
    if (with_scores[0].1 - with_scores[1].1).abs() < f64::EPSILON {
        return Ok(with_scores
            .into_iter()
            .map(|(user_id, _)| DerivedRank { user_id, rank: 1 })
            .collect());
    }
    let (winner, loser) = if with_scores[0].1 > with_scores[1].1 {
        (with_scores[0].0, with_scores[1].0)
    } else {
        (with_scores[1].0, with_scores[0].0)
    };
    Ok(vec![
        DerivedRank { user_id: winner, rank: 1 },
        DerivedRank { user_id: loser, rank: 2 },
    ])
}

fn team_match(results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError> {
    reject_empty(results)?;
    let mut per_team: Vec<(String, f64, Vec<Uuid>)> = Vec::new();
    for r in results {
        let team = r.team.clone().ok_or_else(|| {
            EngineError::invalid_result_users("team field required", vec![r.user_id])
        })?;
        let team_score = r.team_score.ok_or_else(|| {
            EngineError::invalid_result_users("team_score field required", vec![r.user_id])
        })?;
        if r.opponent_score.is_none() {
            return Err(EngineError::invalid_result_users(
                "opponent_score field required",
                vec![r.user_id],
            ));
        }
        match per_team.iter_mut().find(|(t, _, _)| *t == team) {
            Some((_, _, members)) => members.push(r.user_id),
            None => per_team.push((team, team_score, vec![r.user_id])),
        }
    }
    if per_team.len() != 2 {
        return Err(EngineError::invalid_result(
            "TEAM_MATCH requires results split across exactly two teams",
        ));
    }
    let (rank_a, rank_b) = if (per_team[0].1 - per_team[1].1).abs() < f64::EPSILON {
        (1, 1)
    } else if per_team[0].1 > per_team[1].1 {
        (1, 2)
    } else {
        (2, 1)
    };
    let mut out = Vec::with_capacity(results.len());
    for user_id in &per_team[0].2 {
        out.push(DerivedRank { user_id: *user_id, rank: rank_a });
    }
    for user_id in &per_team[1].2 {
        out.push(DerivedRank { user_id: *user_id, rank: rank_b });
    }
    Ok(out)
}

fn time_based(results: &[RawResult]) -> Result<Vec<DerivedRank>, EngineError> {
    reject_empty(results)?;
    let mut with_times = Vec::with_capacity(results.len());
    for r in results {
        let t = r.time_seconds.ok_or_else(|| {
            EngineError::invalid_result_users("time_seconds field required", vec![r.user_id])
        })?;
        with_times.push((r.user_id, t));
    }
    with_times.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(with_times
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, _))| DerivedRank {
            user_id,
            rank: (i + 1) as i32,
        })
        .collect())
}

/// Validates and derives `(user_id, rank)` pairs for the named
/// `match_format`. `skill_rating` is the injection seam for
/// SKILL_RATING sessions; pass `None` to fail fast as the default does.
pub fn process_results(
    match_format: &str,
    results: &[RawResult],
    skill_rating: Option<&dyn SkillRatingProcessor>,
) -> Result<Vec<DerivedRank>, EngineError> {
    match match_format {
        "INDIVIDUAL_RANKING" => individual_ranking(results),
        "HEAD_TO_HEAD" => head_to_head(results),
        "TEAM_MATCH" => team_match(results),
        "TIME_BASED" => time_based(results),
        "SKILL_RATING" => match skill_rating {
            Some(processor) => processor.process(results),
            None => Err(EngineError::UnknownScoringType(
                "SKILL_RATING has no injected processor".to_string(),
            )),
        },
        other => Err(EngineError::UnknownScoringType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(user_id: Uuid) -> RawResult {
        RawResult {
            user_id,
            placement: None,
            result: None,
            score: None,
            team: None,
            team_score: None,
            opponent_score: None,
            time_seconds: None,
        }
    }

    #[test]
    fn individual_ranking_requires_contiguous_placements() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut r1 = result(u1);
        r1.placement = Some(1);
        let mut r2 = result(u2);
        r2.placement = Some(3);
        let err = process_results("INDIVIDUAL_RANKING", &[r1, r2], None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidResult { .. }));
    }

    #[test]
    fn head_to_head_score_tie_ranks_both_first() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut r1 = result(u1);
        r1.score = Some(5.0);
        let mut r2 = result(u2);
        r2.score = Some(5.0);
        let ranks = process_results("HEAD_TO_HEAD", &[r1, r2], None).unwrap();
        assert!(ranks.iter().all(|r| r.rank == 1));
    }

    #[test]
    fn head_to_head_dispatches_on_result_field_for_win_loss() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut r1 = result(u1);
        r1.result = Some("WIN".to_string());
        let mut r2 = result(u2);
        r2.result = Some("LOSS".to_string());
        let ranks = process_results("HEAD_TO_HEAD", &[r1, r2], None).unwrap();
        assert_eq!(ranks.iter().find(|r| r.user_id == u1).unwrap().rank, 1);
        assert_eq!(ranks.iter().find(|r| r.user_id == u2).unwrap().rank, 2);
    }

    #[test]
    fn head_to_head_rejects_mixed_result_and_score_fields() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut r1 = result(u1);
        r1.result = Some("WIN".to_string());
        let mut r2 = result(u2);
        r2.score = Some(3.0);
        let err = process_results("HEAD_TO_HEAD", &[r1, r2], None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidResult { .. }));
    }

    #[test]
    fn skill_rating_without_processor_fails_fast() {
        let u1 = Uuid::from_u128(1);
        let err = process_results("SKILL_RATING", &[result(u1)], None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownScoringType(_)));
    }
}
