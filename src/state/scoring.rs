//! Pure scoring policy. Every function here is deterministic over its
//! inputs so duplicate application under the reconciliation rules always
//! converges to the same scores.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{ANSWER_PENDING, ParticipantEntity};

/// Base points for a correct tournament answer.
pub const TOURNAMENT_BASE_AWARD: u32 = 100;

/// Milliseconds of saved time per bonus point.
const SPEED_BONUS_DIVISOR: u64 = 100;

/// Speed bonus for answering `latency_ms` into a `window_ms` round: one point
/// per hundred milliseconds left on the clock, floored.
pub fn speed_bonus(window_ms: u64, latency_ms: u64) -> u32 {
    (window_ms.saturating_sub(latency_ms) / SPEED_BONUS_DIVISOR) as u32
}

/// Points for one tournament round answer. Wrong answers and unanswered
/// rounds ([`ANSWER_PENDING`]) score zero; correct answers earn the base
/// award plus the speed bonus.
pub fn timed_answer_award(
    option_index: i32,
    correct_option: usize,
    latency_ms: Option<u64>,
    window_ms: u64,
) -> u32 {
    if option_index == ANSWER_PENDING || option_index as usize != correct_option {
        return 0;
    }
    match latency_ms {
        Some(latency) => TOURNAMENT_BASE_AWARD + speed_bonus(window_ms, latency),
        None => 0,
    }
}

/// Points for one independent-progress (duel/room) answer: one per correct
/// question, no speed component.
pub fn progress_award(option_index: i32, correct_option: usize) -> u32 {
    u32::from(option_index >= 0 && option_index as usize == correct_option)
}

/// Duel winner: the higher final score wins; equal scores are a tie
/// (`None`), independent of completion time.
pub fn duel_winner(participants: &IndexMap<Uuid, ParticipantEntity>) -> Option<Uuid> {
    let mut entries = participants.iter();
    let (first_id, first) = entries.next()?;
    let (second_id, second) = entries.next()?;

    match first.score.cmp(&second.score) {
        std::cmp::Ordering::Greater => Some(*first_id),
        std::cmp::Ordering::Less => Some(*second_id),
        std::cmp::Ordering::Equal => None,
    }
}

/// Final standing order: score descending, then completion time ascending
/// (never-finished participants sort last), then join order as the stable
/// final key.
pub fn rank(participants: &IndexMap<Uuid, ParticipantEntity>) -> Vec<Uuid> {
    let mut order: Vec<(usize, Uuid)> = participants.keys().copied().enumerate().collect();
    order.sort_by_key(|(join_index, id)| {
        let p = &participants[id];
        (
            std::cmp::Reverse(p.score),
            p.completion_time_ms.unwrap_or(u64::MAX),
            *join_index,
        )
    });
    order.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::ParticipantEntity;

    fn player(score: u32, completion_time_ms: Option<u64>) -> ParticipantEntity {
        ParticipantEntity {
            score,
            finished: completion_time_ms.is_some(),
            completion_time_ms,
            ..ParticipantEntity::new("p".into(), 0)
        }
    }

    #[test]
    fn correct_answer_earns_base_plus_speed_bonus() {
        // 5s into a 30s window leaves 25 000 ms -> 250 bonus points.
        assert_eq!(timed_answer_award(2, 2, Some(5_000), 30_000), 350);
    }

    #[test]
    fn wrong_and_unanswered_rounds_score_zero() {
        assert_eq!(timed_answer_award(1, 2, Some(5_000), 30_000), 0);
        assert_eq!(timed_answer_award(ANSWER_PENDING, 0, None, 30_000), 0);
    }

    #[test]
    fn zero_latency_earns_the_full_bonus() {
        assert_eq!(timed_answer_award(0, 0, Some(0), 30_000), 400);
    }

    #[test]
    fn answer_at_the_last_moment_earns_base_only() {
        assert_eq!(timed_answer_award(0, 0, Some(30_000), 30_000), 100);
    }

    #[test]
    fn speed_bonus_is_monotonic_over_the_whole_window() {
        let window = 30_000;
        let mut last = u32::MAX;
        for latency in (0..=window).step_by(37) {
            let award = timed_answer_award(0, 0, Some(latency), window);
            assert!(
                award <= last,
                "lower latency must never score lower (latency {latency})"
            );
            last = award;
        }
    }

    #[test]
    fn duel_winner_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let forward: IndexMap<_, _> = [(a, player(5, Some(100))), (b, player(3, Some(80)))]
            .into_iter()
            .collect();
        let backward: IndexMap<_, _> = [(b, player(3, Some(80))), (a, player(5, Some(100)))]
            .into_iter()
            .collect();

        assert_eq!(duel_winner(&forward), Some(a));
        assert_eq!(duel_winner(&backward), Some(a));
    }

    #[test]
    fn equal_scores_tie_regardless_of_time() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let participants: IndexMap<_, _> = [(a, player(4, Some(500))), (b, player(4, Some(90_000)))]
            .into_iter()
            .collect();
        assert_eq!(duel_winner(&participants), None);
    }

    #[test]
    fn ranking_breaks_score_ties_by_completion_time() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let p3 = Uuid::new_v4();
        let participants: IndexMap<_, _> = [
            (p1, player(8, Some(120_000))),
            (p2, player(8, Some(90_000))),
            (p3, player(6, Some(100_000))),
        ]
        .into_iter()
        .collect();

        assert_eq!(rank(&participants), vec![p2, p1, p3]);
    }

    #[test]
    fn unfinished_participants_rank_after_finished_peers() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let participants: IndexMap<_, _> = [(p1, player(3, None)), (p2, player(3, Some(60_000)))]
            .into_iter()
            .collect();
        assert_eq!(rank(&participants), vec![p2, p1]);
    }
}
