//! Advancement Calculator (spec §4.5): crossover bracket seeding from
//! group standings into round-1 knockout sessions.

use uuid::Uuid;

use super::types::GroupStandings;

/// One round-1 knockout session's id paired with its two seeded
/// participants, in bracket order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeededSession {
    pub session_index: usize,
    pub participants: [Uuid; 2],
}

/// Selects the qualified participants (top `top_n` per group) in
/// `(group_identifier asc, group_rank asc)` order, i.e. the seeded list
/// `[G1.r1, G2.r1, …, GN.r1, G1.r2, G2.r2, …]`.
pub fn get_qualified_participants(standings: &[GroupStandings], top_n: i32) -> Vec<Uuid> {
    let mut groups = standings.to_vec();
    groups.sort_by(|a, b| a.group_identifier.cmp(&b.group_identifier));

    let mut seeded = Vec::new();
    for seed_position in 1..=top_n {
        for group in &groups {
            if let Some(entry) = group.standings.iter().find(|e| e.rank == seed_position) {
                seeded.push(entry.user_id);
            }
        }
    }
    seeded
}

/// Applies the crossover seeding algorithm: `top_n = round1_session_count
/// * 2 / num_groups`; session `i` receives `[seeded[i], seeded[Q-1-i]]`.
/// Returns an empty vec (no seeding applied) when `top_n < 1` or too few
/// qualifiers were produced.
pub fn apply_crossover_seeding(
    standings: &[GroupStandings],
    round1_session_count: usize,
) -> Vec<SeededSession> {
    if round1_session_count == 0 || standings.is_empty() {
        return Vec::new();
    }
    let total_qualifiers = round1_session_count * 2;
    let num_groups = standings.len();
    if num_groups == 0 || total_qualifiers % num_groups != 0 {
        return Vec::new();
    }
    let top_n = (total_qualifiers / num_groups) as i32;
    if top_n < 1 {
        return Vec::new();
    }

    let seeded = get_qualified_participants(standings, top_n);
    if seeded.len() != total_qualifiers {
        return Vec::new();
    }

    let q = seeded.len();
    (0..round1_session_count)
        .map(|i| SeededSession {
            session_index: i,
            participants: [seeded[i], seeded[q - 1 - i]],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::GroupStandingEntry;

    fn group(id: &str, ranked_users: &[(Uuid, i32)]) -> GroupStandings {
        GroupStandings {
            group_identifier: id.to_string(),
            standings: ranked_users
                .iter()
                .map(|(u, rank)| GroupStandingEntry {
                    user_id: *u,
                    name: String::new(),
                    points: 0,
                    wins: 0,
                    draws: 0,
                    losses: 0,
                    goals_for: 0,
                    goals_against: 0,
                    goal_difference: 0,
                    matches_played: 0,
                    rank: *rank,
                })
                .collect(),
        }
    }

    // S2 — 4 groups x top 2: A1xD2, B1xC2, C1xB2, D1xA2.
    #[test]
    fn s2_four_groups_top_two_crossover() {
        let a1 = Uuid::from_u128(101);
        let a2 = Uuid::from_u128(102);
        let b1 = Uuid::from_u128(201);
        let b2 = Uuid::from_u128(202);
        let c1 = Uuid::from_u128(301);
        let c2 = Uuid::from_u128(302);
        let d1 = Uuid::from_u128(401);
        let d2 = Uuid::from_u128(402);

        let standings = vec![
            group("A", &[(a1, 1), (a2, 2)]),
            group("B", &[(b1, 1), (b2, 2)]),
            group("C", &[(c1, 1), (c2, 2)]),
            group("D", &[(d1, 1), (d2, 2)]),
        ];

        let seeded = apply_crossover_seeding(&standings, 4);
        assert_eq!(seeded.len(), 4);
        assert_eq!(seeded[0].participants, [a1, d2]);
        assert_eq!(seeded[1].participants, [b1, c2]);
        assert_eq!(seeded[2].participants, [c1, b2]);
        assert_eq!(seeded[3].participants, [d1, a2]);
    }

    #[test]
    fn two_groups_top_two_yields_two_semifinals() {
        let a1 = Uuid::from_u128(1);
        let a2 = Uuid::from_u128(2);
        let b1 = Uuid::from_u128(3);
        let b2 = Uuid::from_u128(4);
        let standings = vec![group("A", &[(a1, 1), (a2, 2)]), group("B", &[(b1, 1), (b2, 2)])];
        let seeded = apply_crossover_seeding(&standings, 2);
        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded[0].participants, [a1, b2]);
        assert_eq!(seeded[1].participants, [b1, a2]);
    }

    #[test]
    fn insufficient_qualifiers_returns_no_seeding() {
        let a1 = Uuid::from_u128(1);
        let standings = vec![group("A", &[(a1, 1)])];
        let seeded = apply_crossover_seeding(&standings, 4);
        assert!(seeded.is_empty());
    }
}
