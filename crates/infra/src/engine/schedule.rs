//! Schedule Generator (spec §4.6): turns a tournament's declarative
//! type, roster and venue configuration into the full set of sessions.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::types::{MatchFormat, RoundsData, TournamentPhase};

#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub title: String,
    pub date_start: NaiveDateTime,
    pub date_end: NaiveDateTime,
    pub campus_id: Option<Uuid>,
    pub tournament_phase: TournamentPhase,
    pub tournament_round: i32,
    pub group_identifier: Option<String>,
    pub match_format: MatchFormat,
    pub participant_user_ids: Vec<Uuid>,
    pub rounds_data: Option<RoundsData>,
}

#[derive(Debug, Clone)]
pub struct ResolvedDurations {
    pub match_duration_minutes: i32,
    pub break_duration_minutes: i32,
    pub parallel_fields: i32,
}

/// Resolution order (highest wins): campus row -> tournament global ->
/// request parameter -> type defaults.
pub fn resolve_durations(
    campus: Option<&ResolvedDurations>,
    tournament: &ResolvedDurations,
    request: Option<&ResolvedDurations>,
) -> ResolvedDurations {
    campus
        .or(request)
        .cloned()
        .unwrap_or_else(|| tournament.clone())
}

/// Generates `floor(N/2) * (N-1)` round-robin matches via the circle
/// method. One "bye" slot is used internally for odd rosters and never
/// produces a session.
fn round_robin_rounds(players: &[Uuid]) -> Vec<Vec<(Uuid, Uuid)>> {
    if players.len() < 2 {
        return Vec::new();
    }
    let mut rotation: Vec<Option<Uuid>> = players.iter().map(|u| Some(*u)).collect();
    if rotation.len() % 2 == 1 {
        rotation.push(None);
    }
    let n = rotation.len();
    let rounds_count = n - 1;
    let mut rounds = Vec::with_capacity(rounds_count);

    for _ in 0..rounds_count {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (rotation[i], rotation[n - 1 - i]) {
                pairs.push((a, b));
            }
        }
        rounds.push(pairs);

        // Rotate all but the fixed first element.
        let fixed = rotation[0];
        let mut rest = rotation[1..].to_vec();
        rest.rotate_right(1);
        rotation = std::iter::once(fixed).chain(rest).collect();
    }
    rounds
}

fn schedule_round(
    pairs: &[(Uuid, Uuid)],
    round_number: i32,
    phase: TournamentPhase,
    group_identifier: Option<&str>,
    round_start: NaiveDateTime,
    durations: &ResolvedDurations,
    campus_id: Option<Uuid>,
    title_prefix: &str,
) -> Vec<SessionDraft> {
    let slot = Duration::minutes((durations.match_duration_minutes + durations.break_duration_minutes) as i64);
    let fields = durations.parallel_fields.max(1) as usize;

    pairs
        .iter()
        .enumerate()
        .map(|(i, (a, b))| {
            let field_slot = i / fields;
            let start = round_start + slot * field_slot as i32;
            let end = start + Duration::minutes(durations.match_duration_minutes as i64);
            SessionDraft {
                title: format!("{title_prefix} round {round_number}"),
                date_start: start,
                date_end: end,
                campus_id,
                tournament_phase: phase,
                tournament_round: round_number,
                group_identifier: group_identifier.map(|s| s.to_string()),
                match_format: MatchFormat::HeadToHead,
                participant_user_ids: vec![*a, *b],
                rounds_data: None,
            }
        })
        .collect()
}

pub fn generate_league(
    roster: &[Uuid],
    start: NaiveDateTime,
    durations: &ResolvedDurations,
    campus_id: Option<Uuid>,
) -> Vec<SessionDraft> {
    let rounds = round_robin_rounds(roster);
    let round_gap = Duration::minutes(
        ((durations.match_duration_minutes + durations.break_duration_minutes)
            * ((roster.len() as i32 / durations.parallel_fields.max(1)) + 1)) as i64,
    );

    rounds
        .iter()
        .enumerate()
        .flat_map(|(idx, pairs)| {
            let round_start = start + round_gap * idx as i32;
            schedule_round(
                pairs,
                (idx + 1) as i32,
                TournamentPhase::GroupStage,
                None,
                round_start,
                durations,
                campus_id,
                "League",
            )
        })
        .collect()
}

fn next_power_of_two(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p *= 2;
    }
    p.max(1)
}

/// Standard seeding pairing: seed `i` meets seed `P-1-i`. Top seeds (low
/// index) draw byes when the roster isn't a power of two; a bye slot
/// never produces a round-1 session, the seeded player advances for free.
pub fn generate_knockout(
    roster: &[Uuid],
    start: NaiveDateTime,
    durations: &ResolvedDurations,
    campus_id: Option<Uuid>,
) -> Vec<SessionDraft> {
    if roster.is_empty() {
        return Vec::new();
    }
    let bracket_size = next_power_of_two(roster.len());
    let mut seeded: Vec<Option<Uuid>> = roster.iter().map(|u| Some(*u)).collect();
    seeded.resize(bracket_size, None);

    let round1_pairs: Vec<(Uuid, Uuid)> = (0..bracket_size / 2)
        .filter_map(|i| match (seeded[i], seeded[bracket_size - 1 - i]) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .collect();

    let mut drafts = schedule_round(
        &round1_pairs,
        1,
        TournamentPhase::Knockout,
        None,
        start,
        durations,
        campus_id,
        "Knockout",
    );

    let total_rounds = (bracket_size as f64).log2().round() as i32;
    let slot = Duration::minutes((durations.match_duration_minutes + durations.break_duration_minutes) as i64);
    let mut sessions_in_round = bracket_size / 4;
    let mut round_number = 2;
    let mut round_start = start + slot;
    while round_number <= total_rounds && sessions_in_round >= 1 {
        for _ in 0..sessions_in_round {
            drafts.push(SessionDraft {
                title: format!("Knockout round {round_number}"),
                date_start: round_start,
                date_end: round_start + Duration::minutes(durations.match_duration_minutes as i64),
                campus_id,
                tournament_phase: TournamentPhase::Knockout,
                tournament_round: round_number,
                group_identifier: None,
                match_format: MatchFormat::HeadToHead,
                participant_user_ids: Vec::new(),
                rounds_data: None,
            });
        }
        round_start += slot;
        round_number += 1;
        sessions_in_round /= 2;
    }

    drafts
}

/// Partitions the roster into `num_groups` mini round-robins, plus an
/// empty knockout shell sized for `top_n` qualifiers per group.
pub fn generate_group_knockout(
    roster: &[Uuid],
    num_groups: usize,
    top_n: usize,
    start: NaiveDateTime,
    durations: &ResolvedDurations,
    campus_id: Option<Uuid>,
) -> Vec<SessionDraft> {
    if num_groups == 0 {
        return Vec::new();
    }
    let mut groups: Vec<Vec<Uuid>> = vec![Vec::new(); num_groups];
    for (i, user_id) in roster.iter().enumerate() {
        groups[i % num_groups].push(*user_id);
    }

    let mut drafts = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        let group_label = format!("Group {}", (b'A' + i as u8) as char);
        let rounds = round_robin_rounds(group);
        let round_gap = Duration::minutes(
            ((durations.match_duration_minutes + durations.break_duration_minutes)
                * ((group.len() as i32 / durations.parallel_fields.max(1)) + 1)) as i64,
        );
        for (idx, pairs) in rounds.iter().enumerate() {
            let round_start = start + round_gap * idx as i32;
            drafts.extend(schedule_round(
                pairs,
                (idx + 1) as i32,
                TournamentPhase::GroupStage,
                Some(&group_label),
                round_start,
                durations,
                campus_id,
                &group_label,
            ));
        }
    }

    let qualifiers = num_groups * top_n;
    let shell_rounds = (qualifiers as f64 / 2.0).log2().ceil().max(0.0) as i32 + 1;
    let slot = Duration::minutes((durations.match_duration_minutes + durations.break_duration_minutes) as i64);
    let knockout_start = start + Duration::days(7);
    let mut sessions_in_round = qualifiers / 2;
    let mut round_number = 1;
    while round_number <= shell_rounds && sessions_in_round >= 1 {
        for _ in 0..sessions_in_round {
            drafts.push(SessionDraft {
                title: format!("Knockout round {round_number}"),
                date_start: knockout_start + slot * (round_number - 1),
                date_end: knockout_start + slot * (round_number - 1)
                    + Duration::minutes(durations.match_duration_minutes as i64),
                campus_id,
                tournament_phase: TournamentPhase::Knockout,
                tournament_round: round_number,
                group_identifier: None,
                match_format: MatchFormat::HeadToHead,
                participant_user_ids: Vec::new(),
                rounds_data: None,
            });
        }
        round_number += 1;
        sessions_in_round /= 2;
    }

    drafts
}

/// A single INDIVIDUAL_RANKING session with every approved participant.
pub fn generate_individual_ranking(
    roster: &[Uuid],
    total_rounds: i32,
    start: NaiveDateTime,
    durations: &ResolvedDurations,
    campus_id: Option<Uuid>,
) -> Vec<SessionDraft> {
    let end = start + Duration::minutes(durations.match_duration_minutes as i64);
    vec![SessionDraft {
        title: "Individual ranking session".to_string(),
        date_start: start,
        date_end: end,
        campus_id,
        tournament_phase: TournamentPhase::IndividualRanking,
        tournament_round: 1,
        group_identifier: None,
        match_format: MatchFormat::IndividualRanking,
        participant_user_ids: roster.to_vec(),
        rounds_data: Some(RoundsData::new(total_rounds)),
    }]
}

pub fn default_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuids(n: usize) -> Vec<Uuid> {
        (0..n as u128).map(Uuid::from_u128).collect()
    }

    #[test]
    fn league_match_count_matches_formula() {
        let roster = uuids(6);
        let durations = ResolvedDurations { match_duration_minutes: 30, break_duration_minutes: 5, parallel_fields: 2 };
        let drafts = generate_league(&roster, default_start(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()), &durations, None);
        // floor(N/2) * (N-1) = 3 * 5 = 15
        assert_eq!(drafts.len(), 15);
    }

    #[test]
    fn knockout_round_one_pairs_seeds_mirrored() {
        let roster = uuids(4);
        let durations = ResolvedDurations { match_duration_minutes: 30, break_duration_minutes: 5, parallel_fields: 2 };
        let drafts = generate_knockout(&roster, default_start(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()), &durations, None);
        let round1: Vec<_> = drafts.iter().filter(|d| d.tournament_round == 1).collect();
        assert_eq!(round1.len(), 2);
        assert_eq!(round1[0].participant_user_ids, vec![roster[0], roster[3]]);
        assert_eq!(round1[1].participant_user_ids, vec![roster[1], roster[2]]);
    }

    #[test]
    fn individual_ranking_is_a_single_session() {
        let roster = uuids(10);
        let durations = ResolvedDurations { match_duration_minutes: 60, break_duration_minutes: 0, parallel_fields: 1 };
        let drafts = generate_individual_ranking(&roster, 3, default_start(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()), &durations, None);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].participant_user_ids.len(), 10);
        assert_eq!(drafts[0].rounds_data.as_ref().unwrap().total_rounds, 3);
    }
}
