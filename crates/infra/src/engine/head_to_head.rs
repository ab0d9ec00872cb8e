//! Head-to-head tournament ranking strategies (spec §4.3): league,
//! single-elimination knockout, and the two-phase group+knockout hybrid.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use uuid::Uuid;

use super::types::{HeadToHeadGameResults, HeadToHeadOutcome};

/// One completed HEAD_TO_HEAD session's relevant fields for ranking.
#[derive(Debug, Clone)]
pub struct CompletedMatch {
    pub group_identifier: Option<String>,
    pub round_number: Option<i32>,
    pub results: HeadToHeadGameResults,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueEntry {
    pub user_id: Uuid,
    pub rank: i32,
    pub is_tied: bool,
    pub points: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
}

#[derive(Debug, Default, Clone)]
struct Accum {
    points: i32,
    wins: i32,
    draws: i32,
    losses: i32,
    goals_for: i32,
    goals_against: i32,
}

fn accumulate_matches<'a>(matches: impl Iterator<Item = &'a HeadToHeadGameResults>) -> BTreeMap<Uuid, Accum> {
    let mut table: BTreeMap<Uuid, Accum> = BTreeMap::new();
    for game in matches {
        if game.participants.len() != 2 {
            continue;
        }
        let a = &game.participants[0];
        let b = &game.participants[1];
        for (me, opponent) in [(a, b), (b, a)] {
            let entry = table.entry(me.user_id).or_default();
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
    table
}

fn rank_with_ties<T, F>(mut items: Vec<T>, sort_key: F) -> Vec<(i32, bool, T)>
where
    F: Fn(&T, &T) -> Ordering,
{
    items.sort_by(&sort_key);
    let mut out = Vec::with_capacity(items.len());
    let mut i = 0;
    let mut rank = 1;
    while i < items.len() {
        let mut j = i + 1;
        while j < items.len() && sort_key(&items[i], &items[j]) == Ordering::Equal {
            j += 1;
        }
        let group_size = (j - i) as i32;
        let is_tied = group_size > 1;
        for item in items.drain(i..j) {
            out.push((rank, is_tied, item));
        }
        // `drain` shifts remaining elements down to index `i`; continue from there.
        rank += group_size;
    }
    out
}

/// league (round robin): points/goal-difference/goals-for ordering.
pub fn league_standings(matches: &[HeadToHeadGameResults]) -> Vec<LeagueEntry> {
    let table = accumulate_matches(matches.iter());
    let entries: Vec<(Uuid, Accum)> = table.into_iter().collect();

    let ranked = rank_with_ties(entries, |(_, a), (_, b)| {
        let gd_a = a.goals_for - a.goals_against;
        let gd_b = b.goals_for - b.goals_against;
        b.points
            .cmp(&a.points)
            .then(gd_b.cmp(&gd_a))
            .then(b.goals_for.cmp(&a.goals_for))
    });

    ranked
        .into_iter()
        .map(|(rank, is_tied, (user_id, a))| LeagueEntry {
            user_id,
            rank,
            is_tied,
            points: a.points,
            wins: a.wins,
            draws: a.draws,
            losses: a.losses,
            goals_for: a.goals_for,
            goals_against: a.goals_against,
            goal_difference: a.goals_for - a.goals_against,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultLabel {
    Win,
    RunnerUp,
    Loss,
}

impl ResultLabel {
    fn priority(self) -> i32 {
        match self {
            ResultLabel::Win => 0,
            ResultLabel::RunnerUp => 1,
            ResultLabel::Loss => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnockoutEntry {
    pub user_id: Uuid,
    pub rank: i32,
    pub is_tied: bool,
    pub round_reached: i32,
    pub result: String,
    pub elimination_score: Option<f64>,
    pub elimination_round: Option<i32>,
}

struct KnockoutTrack {
    round_reached: i32,
    last_score: f64,
    last_result: HeadToHeadOutcome,
}

/// single elimination: highest round reached, then win > runner_up >
/// loss, then elimination score. The final-round loser is relabeled
/// "runner_up" so the three-way priority is reachable (see DESIGN.md).
pub fn knockout_standings(matches: &[CompletedMatch]) -> Vec<KnockoutEntry> {
    let final_round = matches.iter().filter_map(|m| m.round_number).max().unwrap_or(0);

    let mut tracks: BTreeMap<Uuid, KnockoutTrack> = BTreeMap::new();
    for m in matches {
        let Some(round_number) = m.round_number else { continue };
        if m.results.participants.len() != 2 {
            continue;
        }
        for p in &m.results.participants {
            let track = tracks.entry(p.user_id).or_insert(KnockoutTrack {
                round_reached: round_number,
                last_score: p.score,
                last_result: p.result,
            });
            if round_number >= track.round_reached {
                track.round_reached = round_number;
                track.last_score = p.score;
                track.last_result = p.result;
            }
        }
    }

    let entries: Vec<(Uuid, KnockoutTrack)> = tracks.into_iter().collect();

    let labeled: Vec<(Uuid, i32, ResultLabel, Option<f64>, Option<i32>)> = entries
        .into_iter()
        .map(|(user_id, t)| match t.last_result {
            HeadToHeadOutcome::Win if t.round_reached == final_round => {
                (user_id, t.round_reached, ResultLabel::Win, None, None)
            }
            HeadToHeadOutcome::Win => (user_id, t.round_reached, ResultLabel::Win, None, None),
            HeadToHeadOutcome::Loss | HeadToHeadOutcome::Draw => {
                let label = if t.round_reached == final_round {
                    ResultLabel::RunnerUp
                } else {
                    ResultLabel::Loss
                };
                (
                    user_id,
                    t.round_reached,
                    label,
                    Some(t.last_score),
                    Some(t.round_reached),
                )
            }
        })
        .collect();

    let ranked = rank_with_ties(labeled, |a, b| {
        b.1.cmp(&a.1)
            .then(a.2.priority().cmp(&b.2.priority()))
            .then(
                b.3.unwrap_or(f64::NEG_INFINITY)
                    .partial_cmp(&a.3.unwrap_or(f64::NEG_INFINITY))
                    .unwrap_or(Ordering::Equal),
            )
    });

    ranked
        .into_iter()
        .map(|(rank, is_tied, (user_id, round_reached, label, score, elim_round))| KnockoutEntry {
            user_id,
            rank,
            is_tied,
            round_reached,
            result: match label {
                ResultLabel::Win => "win".to_string(),
                ResultLabel::RunnerUp => "runner_up".to_string(),
                ResultLabel::Loss => "loss".to_string(),
            },
            elimination_score: score,
            elimination_round: elim_round,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupKnockoutEntry {
    pub user_id: Uuid,
    pub rank: i32,
}

/// Phase 1: per-group league standings. Phase 2: knockout ranking over
/// KNOCKOUT-phase sessions. Knockout participants rank 1..K; remaining
/// group-only participants follow, ordered by (group_rank, group_id).
pub fn group_knockout_standings(
    group_matches: &[CompletedMatch],
    knockout_matches: &[CompletedMatch],
) -> Vec<GroupKnockoutEntry> {
    let mut per_group: BTreeMap<String, Vec<HeadToHeadGameResults>> = BTreeMap::new();
    for m in group_matches {
        let group = m.group_identifier.clone().unwrap_or_default();
        per_group.entry(group).or_default().push(m.results.clone());
    }

    let mut group_rank_by_user: BTreeMap<Uuid, (i32, String)> = BTreeMap::new();
    for (group_id, matches) in &per_group {
        for entry in league_standings(matches) {
            group_rank_by_user
                .entry(entry.user_id)
                .or_insert((entry.rank, group_id.clone()));
        }
    }

    let knockout = knockout_standings(knockout_matches);
    let knockout_ids: std::collections::HashSet<Uuid> = knockout.iter().map(|e| e.user_id).collect();
    let k = knockout.len() as i32;

    let mut out: Vec<GroupKnockoutEntry> = knockout
        .into_iter()
        .map(|e| GroupKnockoutEntry { user_id: e.user_id, rank: e.rank })
        .collect();

    let mut leftover: Vec<(Uuid, i32, String)> = group_rank_by_user
        .into_iter()
        .filter(|(user_id, _)| !knockout_ids.contains(user_id))
        .map(|(user_id, (rank, group))| (user_id, rank, group))
        .collect();
    leftover.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));

    for (i, (user_id, _, _)) in leftover.into_iter().enumerate() {
        out.push(GroupKnockoutEntry {
            user_id,
            rank: k + 1 + i as i32,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hth(p: [(Uuid, f64, HeadToHeadOutcome); 2]) -> HeadToHeadGameResults {
        HeadToHeadGameResults {
            match_format: "HEAD_TO_HEAD".to_string(),
            round_number: None,
            participants: p
                .iter()
                .map(|(u, s, r)| super::super::types::HeadToHeadParticipant {
                    user_id: *u,
                    score: *s,
                    result: *r,
                })
                .collect(),
            raw_results: Vec::new(),
        }
    }

    #[test]
    fn league_orders_by_points_then_goal_difference() {
        let u1 = Uuid::from_u128(1);
        let u2 = Uuid::from_u128(2);
        let u3 = Uuid::from_u128(3);
        let matches = vec![
            hth([(u1, 3.0, HeadToHeadOutcome::Win), (u2, 1.0, HeadToHeadOutcome::Loss)]),
            hth([(u2, 2.0, HeadToHeadOutcome::Draw), (u3, 2.0, HeadToHeadOutcome::Draw)]),
            hth([(u1, 1.0, HeadToHeadOutcome::Loss), (u3, 4.0, HeadToHeadOutcome::Win)]),
        ];
        let standings = league_standings(&matches);
        assert_eq!(standings[0].user_id, u3);
        assert_eq!(standings[0].points, 4);
        assert_eq!(standings[1].user_id, u1);
        assert_eq!(standings[2].user_id, u2);
    }

    #[test]
    fn knockout_final_loser_is_runner_up() {
        let champion = Uuid::from_u128(1);
        let runner_up = Uuid::from_u128(2);
        let early_exit = Uuid::from_u128(3);
        let matches = vec![
            CompletedMatch {
                group_identifier: None,
                round_number: Some(1),
                results: hth([
                    (champion, 5.0, HeadToHeadOutcome::Win),
                    (early_exit, 2.0, HeadToHeadOutcome::Loss),
                ]),
            },
            CompletedMatch {
                group_identifier: None,
                round_number: Some(2),
                results: hth([
                    (champion, 3.0, HeadToHeadOutcome::Win),
                    (runner_up, 1.0, HeadToHeadOutcome::Loss),
                ]),
            },
        ];
        let standings = knockout_standings(&matches);
        let champ = standings.iter().find(|e| e.user_id == champion).unwrap();
        let ru = standings.iter().find(|e| e.user_id == runner_up).unwrap();
        let early = standings.iter().find(|e| e.user_id == early_exit).unwrap();
        assert_eq!(champ.result, "win");
        assert_eq!(ru.result, "runner_up");
        assert_eq!(early.result, "loss");
        assert!(champ.rank < ru.rank);
        assert!(ru.rank < early.rank);
    }
}
