//! Typed JSON blobs persisted on `tournaments` and `sessions`.
//!
//! Per the design notes, `rounds_data`, `game_results` and
//! `enrollment_snapshot` are modelled as explicit structs with
//! serde encode/decode rather than round-tripped as untyped maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentFormat {
    IndividualRanking,
    HeadToHead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentTypeCode {
    League,
    Knockout,
    GroupKnockout,
    /// Reserved, not implemented — requesting it fails fast (`UnknownScoringType`).
    Swiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoringType {
    TimeBased,
    ScoreBased,
    RoundsBased,
    DistanceBased,
    Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RankingDirection {
    Asc,
    Desc,
}

impl ScoringType {
    /// Default direction derived from scoring type (spec.md §3.1), overridable.
    pub fn default_direction(self) -> RankingDirection {
        match self {
            ScoringType::TimeBased | ScoringType::Placement => RankingDirection::Asc,
            ScoringType::ScoreBased | ScoringType::RoundsBased | ScoringType::DistanceBased => {
                RankingDirection::Desc
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchFormat {
    IndividualRanking,
    HeadToHead,
    TeamMatch,
    TimeBased,
    SkillRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationMethod {
    MinValue,
    MaxValue,
    Sum,
    SumPlacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    GroupStage,
    Knockout,
    IndividualRanking,
}

/// A tuple `{rank, [participants], final_value}`; ties are represented
/// by more than one participant. Tied ranks skip subsequent ranks.
#[derive(Debug, Clone, PartialEq)]
pub struct RankGroup {
    pub rank: i32,
    pub participants: Vec<Uuid>,
    pub final_value: f64,
}

impl RankGroup {
    pub fn is_tied(&self) -> bool {
        self.participants.len() > 1
    }
}

/// One entry in `game_results.derived_rankings` / `performance_rankings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedRanking {
    pub user_id: Uuid,
    pub rank: i32,
    pub final_value: f64,
    pub measurement_unit: String,
    pub is_tied: bool,
}

/// `sessions.rounds_data` (INDIVIDUAL_RANKING only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundsData {
    pub total_rounds: i32,
    pub completed_rounds: i32,
    /// round_number (as string) -> user_id (as string) -> measured value string.
    pub round_results: BTreeMap<String, BTreeMap<String, String>>,
}

impl RoundsData {
    pub fn new(total_rounds: i32) -> Self {
        Self {
            total_rounds,
            completed_rounds: 0,
            round_results: BTreeMap::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_rounds >= self.total_rounds
    }

    /// Parsed view keyed by round number -> user_id -> raw value string,
    /// suitable for the ranking strategies.
    pub fn parsed_round_results(&self) -> BTreeMap<String, BTreeMap<Uuid, String>> {
        self.round_results
            .iter()
            .map(|(round, users)| {
                let users = users
                    .iter()
                    .filter_map(|(uid, val)| Uuid::parse_str(uid).ok().map(|u| (u, val.clone())))
                    .collect();
                (round.clone(), users)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadToHeadOutcome {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadToHeadParticipant {
    pub user_id: Uuid,
    pub score: f64,
    pub result: HeadToHeadOutcome,
}

/// `sessions.game_results` for IR sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualGameResults {
    pub recorded_at: DateTime<Utc>,
    pub recorded_by_id: Uuid,
    pub recorded_by_name: String,
    pub tournament_format: TournamentFormat,
    pub scoring_type: ScoringType,
    pub measurement_unit: String,
    pub ranking_direction: RankingDirection,
    pub total_rounds: i32,
    pub aggregation_method: AggregationMethod,
    pub rounds_data: RoundsData,
    pub derived_rankings: Vec<DerivedRanking>,
    pub performance_rankings: Vec<DerivedRanking>,
    pub wins_rankings: Vec<DerivedRanking>,
}

/// `sessions.game_results` for HEAD_TO_HEAD sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadToHeadGameResults {
    pub match_format: String,
    pub round_number: Option<i32>,
    pub participants: Vec<HeadToHeadParticipant>,
    pub raw_results: Vec<HeadToHeadParticipant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameResults {
    Individual(IndividualGameResults),
    HeadToHead(HeadToHeadGameResults),
}

/// One row of `enrollment_snapshot.per_group_standings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStandingEntry {
    pub user_id: Uuid,
    pub name: String,
    pub points: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub matches_played: i32,
    pub rank: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStandings {
    pub group_identifier: String,
    pub standings: Vec<GroupStandingEntry>,
}

/// `tournament.enrollment_snapshot`, written once by the group stage finalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentSnapshot {
    pub timestamp: DateTime<Utc>,
    pub phase: String,
    pub per_group_standings: Vec<GroupStandings>,
    pub qualified_participant_user_ids: Vec<Uuid>,
    pub qualification_rule: String,
    pub total_groups: i32,
    pub total_qualified: i32,
}
