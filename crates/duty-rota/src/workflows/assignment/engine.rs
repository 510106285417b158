//! Single-date assignment generation.
//!
//! Selection is random among a freshness-filtered pool: candidates not used
//! elsewhere in the current batch are preferred, then candidates with no
//! assignment in the recent window, and the final pool is shuffled with the
//! caller's RNG. The fairness score does not drive selection; it is recorded on
//! each assignment (and optionally as full breakdowns) for diagnostics.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::AssignmentConfig;
use super::domain::{
    AssignedPerson, Assignment, AssignmentOrigin, BackupPerson, EventRecord, EventType,
    GenerationWarning, Person, PersonId, RoleRef, RoleRequirement, WarningKind,
};
use super::fairness::{FairnessCalculator, ScoreBreakdown};
use super::history::ParticipationStats;

/// Everything one generation run reads. All inputs are call-scoped.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub event_type: &'a EventType,
    pub people: &'a [Person],
    /// Occurred events inside the lookback window, all strictly before `target_date`.
    pub history: &'a [EventRecord],
    pub target_date: NaiveDate,
    /// People already used elsewhere in the same batch.
    pub excluded: &'a HashSet<PersonId>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_assigned: u32,
    pub total_needed: u32,
    pub coverage_percent: u32,
    pub persons_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_breakdowns: Option<Vec<ScoreBreakdown>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub target_date: NaiveDate,
    pub assignments: Vec<Assignment>,
    pub warnings: Vec<GenerationWarning>,
    pub stats: GenerationStats,
}

impl GenerationOutcome {
    pub fn people_used(&self) -> HashSet<PersonId> {
        self.assignments
            .iter()
            .map(|assignment| assignment.person.id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentEngine {
    config: AssignmentConfig,
    fairness: FairnessCalculator,
}

impl AssignmentEngine {
    pub fn new(config: AssignmentConfig) -> Self {
        let fairness = FairnessCalculator::new(config.fairness());
        Self { config, fairness }
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    pub fn fairness(&self) -> &FairnessCalculator {
        &self.fairness
    }

    pub fn generate<R>(&self, input: GenerationInput<'_>, rng: &mut R) -> GenerationOutcome
    where
        R: Rng + ?Sized,
    {
        let GenerationInput {
            event_type,
            people,
            history,
            target_date,
            excluded,
            generated_at,
        } = input;

        let stats = ParticipationStats::build(history, target_date);
        let recent = recently_assigned(history, target_date, self.config.recent_assignment_days);
        let (sections, mut warnings) = ordered_sections(event_type, target_date);

        let mut assigned_in_event: HashSet<PersonId> = HashSet::new();
        let mut assignments = Vec::new();
        let mut breakdowns = Vec::new();
        let mut total_needed: u32 = 0;

        for (requirement, role) in sections {
            total_needed += requirement.people_needed;
            let needed = requirement.people_needed as usize;

            let candidates: Vec<&Person> = people
                .iter()
                .filter(|person| {
                    person.status.is_schedulable()
                        && person.holds_role(&role.id)
                        && !assigned_in_event.contains(&person.id)
                        && person.is_available_on(target_date)
                })
                .collect();

            if requirement.required && candidates.len() < needed {
                warnings.push(shortfall_warning(
                    requirement,
                    role,
                    target_date,
                    candidates.len() as u32,
                ));
            }

            let fresh = prefer(&candidates, &candidates, needed, |person| {
                !excluded.contains(&person.id)
            });
            let mut pool = prefer(&fresh, &candidates, needed, |person| {
                !recent.contains(&person.id)
            });
            pool.shuffle(rng);

            let take = needed.min(pool.len());
            let backup = pool.get(take).map(|person| BackupPerson {
                id: person.id.clone(),
                name: person.full_name.clone(),
            });

            debug!(
                section = %requirement.section_name,
                role = %role.name,
                needed,
                pool = pool.len(),
                "filling section"
            );

            for person in &pool[..take] {
                let score = self.fairness.score(person, &role.id, target_date, &stats);
                if self.config.include_score_breakdowns {
                    breakdowns.push(self.fairness.explain(person, &role.id, target_date, &stats));
                }

                assignments.push(Assignment {
                    section_name: requirement.section_name.clone(),
                    section_order: requirement.position,
                    role_id: role.id.clone(),
                    role_name: role.name.clone(),
                    person: AssignedPerson {
                        id: person.id.clone(),
                        name: person.full_name.clone(),
                        phone: person.phone.clone(),
                    },
                    backup: backup.clone(),
                    origin: AssignmentOrigin::Generated,
                    assigned_at: generated_at,
                    fairness_score: Some(score),
                });
                assigned_in_event.insert(person.id.clone());
            }
        }

        let total_assigned = assignments.len() as u32;
        let stats = GenerationStats {
            total_assigned,
            total_needed,
            coverage_percent: coverage_percent(total_assigned, total_needed),
            persons_used: assigned_in_event.len() as u32,
            scoring_breakdowns: self.config.include_score_breakdowns.then_some(breakdowns),
        };

        GenerationOutcome {
            target_date,
            assignments,
            warnings,
            stats,
        }
    }
}

/// Keeps the preferred members of `pool`; when fewer than `needed` remain the
/// whole `eligible` set is used instead.
fn prefer<'a, F>(
    pool: &[&'a Person],
    eligible: &[&'a Person],
    needed: usize,
    keep: F,
) -> Vec<&'a Person>
where
    F: Fn(&Person) -> bool,
{
    let preferred: Vec<&Person> = pool.iter().copied().filter(|person| keep(person)).collect();
    if preferred.len() >= needed {
        preferred
    } else {
        eligible.to_vec()
    }
}

fn recently_assigned(history: &[EventRecord], target_date: NaiveDate, days: u32) -> HashSet<PersonId> {
    let window_start = target_date - Duration::days(i64::from(days));
    history
        .iter()
        .filter(|event| event.date >= window_start && event.date < target_date)
        .flat_map(|event| event.assignments.iter())
        .map(|assignment| assignment.person.id.clone())
        .collect()
}

/// Drops sections without a usable role reference and orders the rest:
/// required before optional, then by ascending position.
pub(crate) fn ordered_sections(
    event_type: &EventType,
    target_date: NaiveDate,
) -> (Vec<(&RoleRequirement, &RoleRef)>, Vec<GenerationWarning>) {
    let mut sections = Vec::new();
    let mut warnings = Vec::new();

    for requirement in &event_type.sections {
        match requirement.resolved_role() {
            Some(role) => sections.push((requirement, role)),
            None => warnings.push(GenerationWarning {
                kind: WarningKind::InvalidRoleReference,
                role_name: String::new(),
                section_name: requirement.section_name.clone(),
                message: format!(
                    "section '{}' has no valid role reference and was skipped for {}",
                    requirement.section_name, target_date
                ),
                needed: requirement.people_needed,
                available: 0,
            }),
        }
    }

    if !warnings.is_empty() {
        warn!(
            event_type = %event_type.id,
            discarded = warnings.len(),
            "discarded sections with missing role references"
        );
    }

    sections.sort_by_key(|(requirement, _)| (!requirement.required, requirement.position));
    (sections, warnings)
}

fn shortfall_warning(
    requirement: &RoleRequirement,
    role: &RoleRef,
    target_date: NaiveDate,
    available: u32,
) -> GenerationWarning {
    let needed = requirement.people_needed;
    let (kind, message) = if available == 0 {
        (
            WarningKind::NoEligible,
            format!(
                "no eligible people for {} in '{}' on {} (needed {})",
                role.name, requirement.section_name, target_date, needed
            ),
        )
    } else {
        (
            WarningKind::InsufficientPersons,
            format!(
                "only {} of {} people available for {} in '{}' on {}",
                available, needed, role.name, requirement.section_name, target_date
            ),
        )
    };

    GenerationWarning {
        kind,
        role_name: role.name.clone(),
        section_name: requirement.section_name.clone(),
        message,
        needed,
        available,
    }
}

fn coverage_percent(assigned: u32, needed: u32) -> u32 {
    if needed == 0 {
        return 0;
    }
    (f64::from(assigned) / f64::from(needed) * 100.0).round() as u32
}
