//! Standings Calculator (spec §4.4): group-stage football-style
//! standings with tie-skip ranking, initializing every enrolled
//! participant even before their first match is played.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use uuid::Uuid;

use super::types::{GroupStandingEntry, GroupStandings, HeadToHeadOutcome};
use crate::models::SessionRow;

#[derive(Debug, Default, Clone)]
struct Accum {
    points: i32,
    wins: i32,
    draws: i32,
    losses: i32,
    goals_for: i32,
    goals_against: i32,
    matches_played: i32,
}

/// `sessions` must already be filtered to GROUP_STAGE sessions for one
/// tournament. Participant names come from the caller's user directory
/// lookup, keyed by user id.
pub fn calculate_standings(
    sessions: &[SessionRow],
    names: &BTreeMap<Uuid, String>,
) -> Vec<GroupStandings> {
    let mut per_group: BTreeMap<String, BTreeMap<Uuid, Accum>> = BTreeMap::new();

    for session in sessions {
        let group = session.group_identifier.clone().unwrap_or_default();
        let table = per_group.entry(group).or_default();
        for user_id in &session.participant_user_ids {
            table.entry(*user_id).or_default();
        }

        let Some(super::types::GameResults::HeadToHead(results)) = session.results() else {
            continue;
        };
        if results.participants.len() != 2 {
            continue;
        }
        let a = &results.participants[0];
        let b = &results.participants[1];
        for (me, opponent) in [(a, b), (b, a)] {
            let entry = table.entry(me.user_id).or_default();
            entry.matches_played += 1;
            entry.goals_for += me.score as i32;
            entry.goals_against += opponent.score as i32;
            match me.result {
                HeadToHeadOutcome::Win => {
                    entry.points += 3;
                    entry.wins += 1;
                }
                HeadToHeadOutcome::Draw => {
                    entry.points += 1;
                    entry.draws += 1;
                }
                HeadToHeadOutcome::Loss => {
                    entry.losses += 1;
                }
            }
        }
    }

    per_group
        .into_iter()
        .map(|(group_identifier, table)| {
            let mut entries: Vec<(Uuid, Accum)> = table.into_iter().collect();
            entries.sort_by(|(_, a), (_, b)| {
                let gd_a = a.goals_for - a.goals_against;
                let gd_b = b.goals_for - b.goals_against;
                b.points
                    .cmp(&a.points)
                    .then(gd_b.cmp(&gd_a))
                    .then(b.goals_for.cmp(&a.goals_for))
            });

            let mut standings = Vec::with_capacity(entries.len());
            let mut i = 0;
            let mut rank = 1;
            while i < entries.len() {
                let mut j = i + 1;
                while j < entries.len()
                    && cmp_key(&entries[i].1, &entries[j].1) == Ordering::Equal
                {
                    j += 1;
                }
                let group_size = (j - i) as i32;
                for (user_id, a) in &entries[i..j] {
                    standings.push(GroupStandingEntry {
                        user_id: *user_id,
                        name: names.get(user_id).cloned().unwrap_or_default(),
                        points: a.points,
                        wins: a.wins,
                        draws: a.draws,
                        losses: a.losses,
                        goals_for: a.goals_for,
                        goals_against: a.goals_against,
                        goal_difference: a.goals_for - a.goals_against,
                        matches_played: a.matches_played,
                        rank,
                    });
                }
                rank += group_size;
                i = j;
            }

            GroupStandings {
                group_identifier,
                standings,
            }
        })
        .collect()
}

fn cmp_key(a: &Accum, b: &Accum) -> Ordering {
    let gd_a = a.goals_for - a.goals_against;
    let gd_b = b.goals_for - b.goals_against;
    a.points
        .cmp(&b.points)
        .then(gd_a.cmp(&gd_b))
        .then(a.goals_for.cmp(&b.goals_for))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{HeadToHeadGameResults, HeadToHeadParticipant};
    use chrono::NaiveDateTime;

    fn session(
        group: &str,
        participants: Vec<Uuid>,
        results: Option<HeadToHeadGameResults>,
    ) -> SessionRow {
        SessionRow {
            id: Uuid::new_v4(),
            tournament_id: Uuid::new_v4(),
            title: "match".to_string(),
            date_start: NaiveDateTime::UNIX_EPOCH,
            date_end: NaiveDateTime::UNIX_EPOCH,
            campus_id: None,
            tournament_phase: "GROUP_STAGE".to_string(),
            tournament_round: 1,
            group_identifier: Some(group.to_string()),
            match_format: "HEAD_TO_HEAD".to_string(),
            scoring_type: None,
            participant_user_ids: participants,
            rounds_data: None,
            game_results: results.map(|r| serde_json::to_value(r).unwrap()),
        }
    }

    #[test]
    fn zero_match_rows_appear_before_any_results() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let sessions = vec![session("Group A", vec![u1, u2], None)];
        let standings = calculate_standings(&sessions, &BTreeMap::new());
        assert_eq!(standings[0].standings.len(), 2);
        assert!(standings[0].standings.iter().all(|e| e.matches_played == 0));
    }

    #[test]
    fn ties_skip_subsequent_ranks() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let u3 = Uuid::from_u128(3);
        let draw = HeadToHeadGameResults {
            match_format: "HEAD_TO_HEAD".to_string(),
            round_number: None,
            participants: vec![
                HeadToHeadParticipant { user_id: u1, score: 1.0, result: HeadToHeadOutcome::Draw },
                HeadToHeadParticipant { user_id: u2, score: 1.0, result: HeadToHeadOutcome::Draw },
            ],
            raw_results: Vec::new(),
        };
        let sessions = vec![
            session("Group A", vec![u1, u2, u3], Some(draw)),
        ];
        let standings = calculate_standings(&sessions, &BTreeMap::new());
        let ranks: BTreeMap<Uuid, i32> = standings[0]
            .standings
            .iter()
            .map(|e| (e.user_id, e.rank))
            .collect();
        assert_eq!(ranks[&u1], 1);
        assert_eq!(ranks[&u2], 1);
        assert_eq!(ranks[&u3], 3);
    }
}
