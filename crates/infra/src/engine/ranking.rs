//! Ranking Strategy layer (spec §4.1).
//!
//! A strategy is dispatched by `ScoringType` rather than modeled as a
//! trait object — each strategy is a pure table-driven value, following
//! the `RankingStrategy._group_by_value` shape of the reference tie-skip
//! algorithm.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::types::{AggregationMethod, RankGroup, RankingDirection, ScoringType};
use crate::error::EngineError;

/// Extracts the first numeric token (optional leading minus, digits,
/// optional decimal point) from a measured-value string such as
/// `"12.5s"` or `"11 pts"`. Returns `None` when no numeric token is
/// present; callers skip the (user, round) pair in that case.
pub fn parse_measured_value(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_digit() || (c == '-' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit())
        {
            break;
        }
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    let start = i;
    let mut end = i;
    let mut seen_dot = false;
    if bytes[end] as char == '-' {
        end += 1;
    }
    while end < bytes.len() {
        let c = bytes[end] as char;
        if c.is_ascii_digit() {
            end += 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    raw[start..end].parse::<f64>().ok()
}

fn resolved_direction(scoring_type: ScoringType, override_direction: Option<RankingDirection>) -> RankingDirection {
    override_direction.unwrap_or_else(|| scoring_type.default_direction())
}

/// Reduces a participant's per-round values to a single final value.
pub fn aggregate_value(scoring_type: ScoringType, direction: RankingDirection, values: &[f64]) -> f64 {
    match scoring_type {
        ScoringType::TimeBased | ScoringType::RoundsBased => match direction {
            RankingDirection::Asc => values.iter().cloned().fold(f64::INFINITY, f64::min),
            RankingDirection::Desc => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        },
        ScoringType::ScoreBased | ScoringType::Placement | ScoringType::DistanceBased => {
            values.iter().sum()
        }
    }
}

/// The label written into `game_results.aggregation_method`, derived
/// from the strategy and the resolved direction — never hard-coded.
pub fn aggregation_label(scoring_type: ScoringType, direction: RankingDirection) -> AggregationMethod {
    match scoring_type {
        ScoringType::TimeBased | ScoringType::RoundsBased => match direction {
            RankingDirection::Asc => AggregationMethod::MinValue,
            RankingDirection::Desc => AggregationMethod::MaxValue,
        },
        ScoringType::ScoreBased | ScoringType::DistanceBased => AggregationMethod::Sum,
        ScoringType::Placement => AggregationMethod::SumPlacement,
    }
}

/// Groups sorted `(user_id, final_value)` pairs into `RankGroup`s,
/// skipping ranks after ties: a tied group of size `k` at rank `r` is
/// followed by the next group at rank `r + k`.
fn tie_rank_groups(sorted: Vec<(Uuid, f64)>) -> Vec<RankGroup> {
    let mut groups = Vec::new();
    let mut i = 0;
    let mut rank = 1;
    while i < sorted.len() {
        let value = sorted[i].1;
        let mut j = i;
        while j < sorted.len() && (sorted[j].1 - value).abs() < 1e-9 {
            j += 1;
        }
        let participants = sorted[i..j].iter().map(|(u, _)| *u).collect::<Vec<_>>();
        let size = participants.len() as i32;
        groups.push(RankGroup {
            rank,
            participants,
            final_value: value,
        });
        rank += size;
        i = j;
    }
    groups
}

/// Aggregates per-round measured values for INDIVIDUAL_RANKING sessions
/// and returns ordered `RankGroup`s. `round_results` is keyed by round
/// number (in whatever order) then user id, with raw string values.
pub fn calculate_rankings(
    scoring_type: ScoringType,
    round_results: &BTreeMap<String, BTreeMap<Uuid, String>>,
    participants: &[Uuid],
    ranking_direction_override: Option<RankingDirection>,
) -> Result<Vec<RankGroup>, EngineError> {
    let direction = resolved_direction(scoring_type, ranking_direction_override);

    let mut per_user_values: BTreeMap<Uuid, Vec<f64>> =
        participants.iter().map(|u| (*u, Vec::new())).collect();

    for round in round_results.values() {
        for (user_id, raw) in round {
            if let Some(value) = parse_measured_value(raw) {
                per_user_values.entry(*user_id).or_default().push(value);
            }
        }
    }

    let mut finals: Vec<(Uuid, f64)> = per_user_values
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(user_id, values)| (user_id, aggregate_value(scoring_type, direction, &values)))
        .collect();

    finals.sort_by(|a, b| match direction {
        RankingDirection::Asc => a.1.partial_cmp(&b.1).unwrap(),
        RankingDirection::Desc => b.1.partial_cmp(&a.1).unwrap(),
    });

    Ok(tie_rank_groups(finals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(pairs: &[(Uuid, &str)]) -> BTreeMap<Uuid, String> {
        pairs.iter().map(|(u, v)| (*u, v.to_string())).collect()
    }

    #[test]
    fn parses_measured_values() {
        assert_eq!(parse_measured_value("12.5s"), Some(12.5));
        assert_eq!(parse_measured_value("11 pts"), Some(11.0));
        assert_eq!(parse_measured_value("-3.2"), Some(-3.2));
        assert_eq!(parse_measured_value("n/a"), None);
    }

    #[test]
    fn aggregation_correctness() {
        let v = vec![3.0, 1.0, 5.0];
        assert_eq!(
            aggregate_value(ScoringType::TimeBased, RankingDirection::Asc, &v),
            1.0
        );
        assert_eq!(
            aggregate_value(ScoringType::ScoreBased, RankingDirection::Desc, &v),
            9.0
        );
        assert_eq!(
            aggregate_value(ScoringType::RoundsBased, RankingDirection::Desc, &v),
            5.0
        );
        assert_eq!(
            aggregate_value(ScoringType::Placement, RankingDirection::Asc, &v),
            9.0
        );
    }

    #[test]
    fn direction_override_flips_aggregate() {
        let v = vec![3.0, 1.0, 5.0];
        assert_eq!(
            aggregate_value(ScoringType::TimeBased, RankingDirection::Desc, &v),
            5.0
        );
        assert_eq!(
            aggregate_value(ScoringType::RoundsBased, RankingDirection::Asc, &v),
            1.0
        );
    }

    // S1 — ROUNDS_BASED with a 2-way tie at rank 2.
    #[test]
    fn s1_rounds_based_tie_at_rank_two() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let u3 = Uuid::from_u128(3);
        let u4 = Uuid::from_u128(4);
        let mut rr = BTreeMap::new();
        rr.insert(
            "1".to_string(),
            round(&[(u1, "11 pts"), (u2, "6 pts"), (u3, "8 pts"), (u4, "5 pts")]),
        );
        rr.insert(
            "2".to_string(),
            round(&[(u1, "10 pts"), (u2, "7 pts"), (u3, "10 pts"), (u4, "6 pts")]),
        );
        rr.insert(
            "3".to_string(),
            round(&[(u1, "11 pts"), (u2, "10 pts"), (u3, "10 pts"), (u4, "9 pts")]),
        );

        let groups = calculate_rankings(
            ScoringType::RoundsBased,
            &rr,
            &[u1, u2, u3, u4],
            None,
        )
        .unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], RankGroup { rank: 1, participants: vec![u1], final_value: 11.0 });
        assert_eq!(groups[1].rank, 2);
        assert_eq!(groups[1].final_value, 10.0);
        let mut tied = groups[1].participants.clone();
        tied.sort();
        let mut expected = vec![u2, u3];
        expected.sort();
        assert_eq!(tied, expected);
        assert_eq!(groups[2], RankGroup { rank: 4, participants: vec![u4], final_value: 9.0 });
    }

    // S3 — SCORE_BASED direction override.
    #[test]
    fn s3_score_based_direction_override() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut rr = BTreeMap::new();
        rr.insert("1".to_string(), round(&[(u1, "1"), (u2, "5")]));

        let asc = calculate_rankings(ScoringType::ScoreBased, &rr, &[u1, u2], Some(RankingDirection::Asc))
            .unwrap();
        assert_eq!(asc[0].participants, vec![u1]);

        let default = calculate_rankings(ScoringType::ScoreBased, &rr, &[u1, u2], None).unwrap();
        assert_eq!(default[0].participants, vec![u2]);
    }

    // S4 — PLACEMENT sum-of-placements.
    #[test]
    fn s4_placement_sum_of_placements() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let mut rr = BTreeMap::new();
        rr.insert("1".to_string(), round(&[(u1, "1"), (u2, "1")]));
        rr.insert("2".to_string(), round(&[(u1, "1"), (u2, "3")]));

        let groups = calculate_rankings(ScoringType::Placement, &rr, &[u1, u2], None).unwrap();
        assert_eq!(groups[0], RankGroup { rank: 1, participants: vec![u1], final_value: 2.0 });
        assert_eq!(groups[1], RankGroup { rank: 2, participants: vec![u2], final_value: 4.0 });
        assert_eq!(
            aggregation_label(ScoringType::Placement, RankingDirection::Asc),
            AggregationMethod::SumPlacement
        );
    }

    #[test]
    fn tied_rank_sequence_is_strictly_increasing() {
        let u = (0..5).map(Uuid::from_u128).collect::<Vec<_>>();
        let mut rr = BTreeMap::new();
        rr.insert(
            "1".to_string(),
            round(&[(u[0], "5"), (u[1], "5"), (u[2], "5"), (u[3], "2"), (u[4], "1")]),
        );
        let groups = calculate_rankings(ScoringType::ScoreBased, &rr, &u, None).unwrap();
        let ranks: Vec<i32> = groups.iter().map(|g| g.rank).collect();
        assert_eq!(ranks, vec![1, 4, 5]);
    }
}
