use super::common::*;
use crate::workflows::assignment::domain::{EventRecord, RoleId};
use crate::workflows::assignment::fairness::{
    FairnessCalculator, FairnessConfig, FairnessFactor, SCORE_RANGE,
};
use crate::workflows::assignment::history::ParticipationStats;

const EPSILON: f64 = 1e-9;

fn calculator() -> FairnessCalculator {
    FairnessCalculator::new(FairnessConfig::default())
}

fn usher_id() -> RoleId {
    usher().id
}

/// `weeks` consecutive Sunday events for `person`, ending the week before the target.
fn consecutive_history(person: &str, weeks: usize) -> Vec<EventRecord> {
    let mut cursor = date(2025, 2, 23);
    let mut events = Vec::new();
    for _ in 0..weeks {
        events.push(past_event(cursor, &[person], &reader()));
        cursor -= chrono::Duration::weeks(1);
    }
    events
}

#[test]
fn zero_participation_outranks_any_nonzero_participation() {
    let fresh = person("fresh", &["usher"]);
    let busy = person("busy", &["usher"]);

    for busy_count in 1..=6 {
        let mut history = Vec::new();
        for week in 0..busy_count {
            let day = date(2025, 2, 23) - chrono::Duration::weeks(week as i64 * 2);
            history.push(past_event(day, &["busy", "other"], &reader()));
        }
        let stats = ParticipationStats::build(&history, target());

        let fresh_score = calculator().score(&fresh, &usher_id(), target(), &stats);
        let busy_score = calculator().score(&busy, &usher_id(), target(), &stats);
        assert!(
            fresh_score > busy_score,
            "count {busy_count}: {fresh_score} <= {busy_score}"
        );
    }
}

#[test]
fn consecutive_penalty_grows_until_three_weeks_then_flattens() {
    let ana = person("ana", &["usher"]);
    let penalties: Vec<f64> = (0..=5)
        .map(|weeks| {
            let stats = ParticipationStats::build(&consecutive_history("ana", weeks), target());
            assert_eq!(stats.streak_for(&ana.id), weeks as u32);
            calculator()
                .explain(&ana, &usher_id(), target(), &stats)
                .component(FairnessFactor::ConsecutivePenalty)
        })
        .collect();

    assert!(penalties[0].abs() < EPSILON);
    assert!(penalties[1] < penalties[0]);
    assert!(penalties[2] < penalties[1]);
    assert!(penalties[3] < penalties[2]);
    assert!((penalties[3] - penalties[4]).abs() < EPSILON);
    assert!((penalties[4] - penalties[5]).abs() < EPSILON);
    assert!((penalties[3] + 0.25).abs() < EPSILON);
}

#[test]
fn scores_stay_inside_the_documented_range() {
    let histories = vec![
        Vec::new(),
        consecutive_history("ana", 5),
        vec![
            past_event(date(2025, 2, 23), &["ana", "ben"], &usher()),
            past_event(date(2025, 2, 16), &["ana"], &usher()),
            past_event(date(2025, 1, 5), &["cleo"], &usher()),
        ],
    ];

    for history in &histories {
        let stats = ParticipationStats::build(history, target());
        for id in ["ana", "ben", "cleo", "dana"] {
            for priority in 0..=12u8 {
                let mut candidate = person(id, &["usher"]);
                candidate.priority = priority;
                let score = calculator().score(&candidate, &usher_id(), target(), &stats);
                assert!(
                    (SCORE_RANGE.0..=SCORE_RANGE.1).contains(&score),
                    "{id} priority {priority}: {score}"
                );
            }
        }
    }
}

#[test]
fn explanation_total_matches_score_and_component_sum() {
    let history = vec![
        past_event(date(2025, 2, 23), &["ana", "ben"], &usher()),
        past_event(date(2025, 2, 16), &["ana"], &usher()),
    ];
    let stats = ParticipationStats::build(&history, target());
    let mut ana = person("ana", &["usher"]);
    ana.priority = 8;

    let breakdown = calculator().explain(&ana, &usher_id(), target(), &stats);
    let score = calculator().score(&ana, &usher_id(), target(), &stats);
    let sum: f64 = breakdown.components.iter().map(|component| component.value).sum();

    assert!((breakdown.total - score).abs() < EPSILON);
    assert!((breakdown.total - sum).abs() < EPSILON);
    assert_eq!(breakdown.components.len(), 4);
    assert_eq!(breakdown.participation_count, 2);
    assert_eq!(breakdown.weeks_since_role, Some(1));
    assert!(!breakdown.never_held_role);
    assert_eq!(breakdown.consecutive_weeks, 2);
}

#[test]
fn recency_scales_with_weeks_away_and_caps_at_the_rotation_window() {
    let ana = person("ana", &["usher"]);
    let recency_after = |last_served| {
        let history = vec![past_event(last_served, &["ana"], &usher())];
        let stats = ParticipationStats::build(&history, target());
        calculator()
            .explain(&ana, &usher_id(), target(), &stats)
            .component(FairnessFactor::RoleRecency)
    };

    assert!(recency_after(date(2025, 2, 26)).abs() < EPSILON);
    assert!((recency_after(date(2025, 2, 16)) - 0.175).abs() < EPSILON);
    assert!((recency_after(date(2025, 1, 19)) - 0.35).abs() < EPSILON);

    let stats = ParticipationStats::build(&[], target());
    let never = calculator().explain(&ana, &usher_id(), target(), &stats);
    assert!(never.never_held_role);
    assert!((never.component(FairnessFactor::RoleRecency) - 0.35).abs() < EPSILON);
}

#[test]
fn recency_is_tracked_per_role() {
    let history = vec![past_event(date(2025, 2, 23), &["ana"], &usher())];
    let stats = ParticipationStats::build(&history, target());
    let ana = person("ana", &["usher", "reader"]);

    let as_reader = calculator().explain(&ana, &reader().id, target(), &stats);
    let as_usher = calculator().explain(&ana, &usher_id(), target(), &stats);

    assert!(as_reader.never_held_role);
    assert!(
        as_reader.component(FairnessFactor::RoleRecency)
            > as_usher.component(FairnessFactor::RoleRecency)
    );
}

#[test]
fn priority_bonus_is_small_and_clamped() {
    let stats = ParticipationStats::build(&[], target());
    let bonus_for = |priority| {
        let mut candidate = person("ana", &["usher"]);
        candidate.priority = priority;
        calculator()
            .explain(&candidate, &usher_id(), target(), &stats)
            .component(FairnessFactor::PriorityBonus)
    };

    assert!(bonus_for(5).abs() < EPSILON);
    assert!((bonus_for(10) - 0.05).abs() < EPSILON);
    assert!((bonus_for(1) + 0.04).abs() < EPSILON);
    assert!((bonus_for(0) - bonus_for(1)).abs() < EPSILON);
    assert!((bonus_for(200) - bonus_for(10)).abs() < EPSILON);
}

#[test]
fn load_is_neutral_at_the_window_average() {
    let history = vec![
        past_event(date(2025, 2, 23), &["ana", "ben"], &reader()),
        past_event(date(2025, 2, 9), &["ana", "ben"], &reader()),
    ];
    let stats = ParticipationStats::build(&history, target());
    let ana = person("ana", &["usher"]);

    let load = calculator()
        .explain(&ana, &usher_id(), target(), &stats)
        .component(FairnessFactor::LoadBalance);
    assert!(load.abs() < EPSILON);
}

#[test]
fn rank_orders_by_descending_score_then_person_id() {
    let history = vec![past_event(date(2025, 2, 23), &["busy"], &usher())];
    let stats = ParticipationStats::build(&history, target());
    let people = vec![
        person("busy", &["usher"]),
        person("zed", &["usher"]),
        person("amy", &["usher"]),
    ];

    let ranked = calculator().rank(&people, &usher_id(), target(), &stats);
    let order: Vec<&str> = ranked.iter().map(|entry| entry.person_id.as_str()).collect();

    assert_eq!(order, vec!["amy", "zed", "busy"]);
    assert!(ranked[0].total >= ranked[1].total);
    assert!(ranked[1].total > ranked[2].total);
}
