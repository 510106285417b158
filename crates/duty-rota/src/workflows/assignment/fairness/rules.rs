use chrono::NaiveDate;

use super::super::domain::{Person, RoleId, DEFAULT_PRIORITY};
use super::super::history::ParticipationStats;
use super::config::FairnessConfig;
use super::{FairnessFactor, ScoreComponent};

pub(crate) const LOAD_WEIGHT: f64 = 0.40;
pub(crate) const RECENCY_WEIGHT: f64 = 0.35;
pub(crate) const CONSECUTIVE_WEIGHT: f64 = 0.25;
pub(crate) const PRIORITY_WEIGHT: f64 = 0.10;

/// Penalty ratio indexed by consecutive-week streak; streaks of 3+ clamp to the last entry.
pub(crate) const CONSECUTIVE_PENALTIES: [f64; 4] = [0.0, 0.2, 0.6, 1.0];

/// Raw inputs read out of the participation statistics for one person and role.
pub(crate) struct ScoreSignals {
    pub participation_count: u32,
    pub average: f64,
    pub maximum: u32,
    pub weeks_since_role: Option<i64>,
    pub consecutive_weeks: u32,
    pub priority: u8,
}

/// Weighted contributions; the total is always their plain sum.
pub(crate) struct ComponentScores {
    pub load: f64,
    pub role_recency: f64,
    pub consecutive_penalty: f64,
    pub priority_bonus: f64,
}

impl ComponentScores {
    pub fn total(&self) -> f64 {
        self.load + self.role_recency + self.consecutive_penalty + self.priority_bonus
    }
}

pub(crate) fn gather_signals(
    person: &Person,
    role: &RoleId,
    target_date: NaiveDate,
    stats: &ParticipationStats,
) -> ScoreSignals {
    let weeks_since_role = stats
        .last_assignment(&person.id, role)
        .map(|last| (target_date - last).num_days().max(0).div_euclid(7));

    ScoreSignals {
        participation_count: stats.count_for(&person.id),
        average: stats.average(),
        maximum: stats.maximum(),
        weeks_since_role,
        consecutive_weeks: stats.streak_for(&person.id),
        priority: person.clamped_priority(),
    }
}

pub(crate) fn score_components(signals: &ScoreSignals, config: &FairnessConfig) -> ComponentScores {
    ComponentScores {
        load: load_component(signals.participation_count, signals.average, signals.maximum),
        role_recency: recency_component(signals.weeks_since_role, config.rotation_window_weeks),
        consecutive_penalty: consecutive_penalty(signals.consecutive_weeks),
        priority_bonus: priority_bonus(signals.priority),
    }
}

/// People below the window average score higher; normalized to roughly [-1, 1] before weighting.
pub(crate) fn load_component(count: u32, average: f64, maximum: u32) -> f64 {
    let spread = (f64::from(maximum) - average).max(average).max(1.0);
    let normalized = ((f64::from(count) - average) / spread).clamp(-1.0, 1.0);
    -normalized * LOAD_WEIGHT
}

pub(crate) fn recency_component(weeks_since_role: Option<i64>, rotation_window_weeks: u32) -> f64 {
    match weeks_since_role {
        None => RECENCY_WEIGHT,
        Some(weeks) => {
            let window = f64::from(rotation_window_weeks.max(1));
            (weeks as f64 / window).min(1.0) * RECENCY_WEIGHT
        }
    }
}

pub(crate) fn consecutive_penalty(streak: u32) -> f64 {
    let index = (streak as usize).min(CONSECUTIVE_PENALTIES.len() - 1);
    -CONSECUTIVE_PENALTIES[index] * CONSECUTIVE_WEIGHT
}

pub(crate) fn priority_bonus(priority: u8) -> f64 {
    ((f64::from(priority) - f64::from(DEFAULT_PRIORITY)) / 10.0) * PRIORITY_WEIGHT
}

pub(crate) fn describe(signals: &ScoreSignals, scores: &ComponentScores) -> Vec<ScoreComponent> {
    let recency_notes = match signals.weeks_since_role {
        None => "never held this role".to_string(),
        Some(weeks) => format!("{weeks} week(s) since last serving in this role"),
    };

    vec![
        ScoreComponent {
            factor: FairnessFactor::LoadBalance,
            value: scores.load,
            notes: format!(
                "{} assignment(s) against a window average of {:.2}",
                signals.participation_count, signals.average
            ),
        },
        ScoreComponent {
            factor: FairnessFactor::RoleRecency,
            value: scores.role_recency,
            notes: recency_notes,
        },
        ScoreComponent {
            factor: FairnessFactor::ConsecutivePenalty,
            value: scores.consecutive_penalty,
            notes: format!("{} consecutive week(s) served", signals.consecutive_weeks),
        },
        ScoreComponent {
            factor: FairnessFactor::PriorityBonus,
            value: scores.priority_bonus,
            notes: format!("manual priority {}", signals.priority),
        },
    ]
}
