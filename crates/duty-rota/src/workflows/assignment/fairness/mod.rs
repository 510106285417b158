//! Normalized fairness scoring used for diagnostics and equity breakdowns.
//!
//! The score combines workload balance, time away from the role, a
//! consecutive-week penalty and a small manual-priority adjustment. Every
//! component is bounded before weighting so the total stays inside
//! [`SCORE_RANGE`] and a person with no participation in the window always
//! outranks a busier peer with otherwise identical signals.

mod config;
mod rules;

pub use config::FairnessConfig;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Person, PersonId, RoleId};
use super::history::ParticipationStats;

/// Inclusive bounds of [`FairnessCalculator::score`] for priorities in 1..=10.
pub const SCORE_RANGE: (f64, f64) = (-1.35, 1.35);

/// Stateless calculator applying the fairness rubric.
#[derive(Debug, Clone, Default)]
pub struct FairnessCalculator {
    config: FairnessConfig,
}

impl FairnessCalculator {
    pub fn new(config: FairnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FairnessConfig {
        &self.config
    }

    /// Higher scores mean higher priority to be selected.
    pub fn score(
        &self,
        person: &Person,
        role: &RoleId,
        target_date: NaiveDate,
        stats: &ParticipationStats,
    ) -> f64 {
        let signals = rules::gather_signals(person, role, target_date, stats);
        rules::score_components(&signals, &self.config).total()
    }

    /// Same total as [`Self::score`], decomposed into named components.
    pub fn explain(
        &self,
        person: &Person,
        role: &RoleId,
        target_date: NaiveDate,
        stats: &ParticipationStats,
    ) -> ScoreBreakdown {
        let signals = rules::gather_signals(person, role, target_date, stats);
        let scores = rules::score_components(&signals, &self.config);

        ScoreBreakdown {
            person_id: person.id.clone(),
            person_name: person.full_name.clone(),
            role_id: role.clone(),
            total: scores.total(),
            components: rules::describe(&signals, &scores),
            participation_count: signals.participation_count,
            average_participation: signals.average,
            weeks_since_role: signals.weeks_since_role,
            never_held_role: signals.weeks_since_role.is_none(),
            consecutive_weeks: signals.consecutive_weeks,
        }
    }

    /// Explains every candidate and orders them by descending score, ties by person id.
    pub fn rank<'a, I>(
        &self,
        candidates: I,
        role: &RoleId,
        target_date: NaiveDate,
        stats: &ParticipationStats,
    ) -> Vec<ScoreBreakdown>
    where
        I: IntoIterator<Item = &'a Person>,
    {
        let mut ranked: Vec<ScoreBreakdown> = candidates
            .into_iter()
            .map(|person| self.explain(person, role, target_date, stats))
            .collect();

        ranked.sort_by(|left, right| {
            right
                .total
                .total_cmp(&left.total)
                .then_with(|| left.person_id.cmp(&right.person_id))
        });
        ranked
    }
}

/// Named contributor to a fairness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessFactor {
    LoadBalance,
    RoleRecency,
    ConsecutivePenalty,
    PriorityBonus,
}

impl FairnessFactor {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoadBalance => "Load balance",
            Self::RoleRecency => "Role recency",
            Self::ConsecutivePenalty => "Consecutive weeks",
            Self::PriorityBonus => "Manual priority",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: FairnessFactor,
    pub value: f64,
    pub notes: String,
}

/// Diagnostic view of one person's fairness score for a role and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub person_id: PersonId,
    pub person_name: String,
    pub role_id: RoleId,
    pub total: f64,
    pub components: Vec<ScoreComponent>,
    pub participation_count: u32,
    pub average_participation: f64,
    pub weeks_since_role: Option<i64>,
    pub never_held_role: bool,
    pub consecutive_weeks: u32,
}

impl ScoreBreakdown {
    pub fn component(&self, factor: FairnessFactor) -> f64 {
        self.components
            .iter()
            .find(|component| component.factor == factor)
            .map(|component| component.value)
            .unwrap_or(0.0)
    }
}
