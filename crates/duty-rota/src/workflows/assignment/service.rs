use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config::AssignmentConfig;
use super::domain::{
    EventId, EventRecord, EventStatus, EventType, EventTypeId, GenerationWarning, NewEvent,
    OrganizationId, Person, PersonId, RoleId,
};
use super::engine::{ordered_sections, AssignmentEngine, GenerationInput, GenerationOutcome};
use super::fairness::ScoreBreakdown;
use super::history::ParticipationStats;
use super::repository::{RepositoryError, SchedulingRepository};

/// Service composing the repository with the assignment engine.
pub struct AssignmentService<R> {
    repository: Arc<R>,
    engine: Arc<AssignmentEngine>,
}

impl<R> AssignmentService<R>
where
    R: SchedulingRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: AssignmentConfig) -> Self {
        let engine = Arc::new(AssignmentEngine::new(config));
        Self { repository, engine }
    }

    pub fn config(&self) -> &AssignmentConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &AssignmentEngine {
        &self.engine
    }

    /// RNG for callers that do not inject their own; seeded when configured.
    pub fn selection_rng(&self) -> StdRng {
        match self.config().random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Generates assignments for one date without persisting them.
    pub fn generate_one<G>(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        target_date: NaiveDate,
        excluded: &HashSet<PersonId>,
        rng: &mut G,
    ) -> Result<GenerationOutcome, AssignmentError>
    where
        G: Rng + ?Sized,
    {
        let event_type = self.load_event_type(organization, event_type)?;
        self.generate_for(&event_type, target_date, excluded, rng)
    }

    /// Generates and persists one draft event per date, strictly in order.
    ///
    /// People selected for earlier dates join the exclusion set for later ones.
    /// Existing events are checked for every date before anything is generated;
    /// per-date failures are recorded and the batch carries on.
    pub fn generate_batch<G>(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        dates: &[NaiveDate],
        rng: &mut G,
    ) -> Result<Vec<BatchResult>, AssignmentError>
    where
        G: Rng + ?Sized,
    {
        if dates.is_empty() {
            return Err(AssignmentError::EmptyBatch);
        }

        let event_type = self.load_event_type(organization, event_type)?;

        let mut existing = HashSet::new();
        for date in dates {
            if self
                .repository
                .event_exists(organization, &event_type.id, *date)?
            {
                existing.insert(*date);
            }
        }

        let mut excluded: HashSet<PersonId> = HashSet::new();
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(dates.len());

        for &date in dates {
            if existing.contains(&date) || !seen.insert(date) {
                results.push(BatchResult::failed(
                    date,
                    AssignmentError::DuplicateEvent { date }.to_string(),
                ));
                continue;
            }

            match self.create_event(&event_type, date, &excluded, rng) {
                Ok((record, outcome)) => {
                    excluded.extend(outcome.people_used());
                    results.push(BatchResult::created(record.id, outcome));
                }
                Err(err) => {
                    warn!(
                        organization = %organization,
                        event_type = %event_type.id,
                        %date,
                        error = %err,
                        "batch date failed"
                    );
                    results.push(BatchResult::failed(date, err.to_string()));
                }
            }
        }

        let created = results.iter().filter(|result| result.success).count();
        info!(
            organization = %organization,
            event_type = %event_type.id,
            requested = dates.len(),
            created,
            people_used = excluded.len(),
            "batch generation finished"
        );

        Ok(results)
    }

    /// Fairness breakdown for one person, role and date.
    pub fn explain(
        &self,
        organization: &OrganizationId,
        person: &PersonId,
        role: &RoleId,
        target_date: NaiveDate,
    ) -> Result<ScoreBreakdown, AssignmentError> {
        let (people, history) = self.load_inputs(organization, target_date)?;
        let person = people
            .iter()
            .find(|candidate| &candidate.id == person)
            .ok_or_else(|| AssignmentError::PersonNotFound {
                organization: organization.clone(),
                person: person.clone(),
            })?;

        let stats = ParticipationStats::build(&history, target_date);
        Ok(self
            .engine
            .fairness()
            .explain(person, role, target_date, &stats))
    }

    /// Ranks every eligible candidate of every section by fairness score.
    pub fn fairness_report(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        target_date: NaiveDate,
    ) -> Result<Vec<SectionRanking>, AssignmentError> {
        let event_type = self.load_event_type(organization, event_type)?;
        let (people, history) = self.load_inputs(organization, target_date)?;
        let stats = ParticipationStats::build(&history, target_date);
        let (sections, _) = ordered_sections(&event_type, target_date);

        Ok(sections
            .into_iter()
            .map(|(requirement, role)| {
                let candidates = people.iter().filter(|person| {
                    person.holds_role(&role.id) && person.is_available_on(target_date)
                });

                SectionRanking {
                    section_name: requirement.section_name.clone(),
                    position: requirement.position,
                    role_id: role.id.clone(),
                    role_name: role.name.clone(),
                    required: requirement.required,
                    people_needed: requirement.people_needed,
                    candidates: self.engine.fairness().rank(
                        candidates,
                        &role.id,
                        target_date,
                        &stats,
                    ),
                }
            })
            .collect())
    }

    fn create_event<G>(
        &self,
        event_type: &EventType,
        date: NaiveDate,
        excluded: &HashSet<PersonId>,
        rng: &mut G,
    ) -> Result<(EventRecord, GenerationOutcome), AssignmentError>
    where
        G: Rng + ?Sized,
    {
        let outcome = self.generate_for(event_type, date, excluded, rng)?;
        let record = self
            .repository
            .insert_event(NewEvent {
                organization_id: event_type.organization_id.clone(),
                event_type_id: event_type.id.clone(),
                date,
                status: EventStatus::Draft,
                assignments: outcome.assignments.clone(),
            })
            .map_err(|err| match err {
                RepositoryError::Conflict => AssignmentError::DuplicateEvent { date },
                other => AssignmentError::Repository(other),
            })?;

        Ok((record, outcome))
    }

    fn generate_for<G>(
        &self,
        event_type: &EventType,
        target_date: NaiveDate,
        excluded: &HashSet<PersonId>,
        rng: &mut G,
    ) -> Result<GenerationOutcome, AssignmentError>
    where
        G: Rng + ?Sized,
    {
        let (people, history) = self.load_inputs(&event_type.organization_id, target_date)?;

        let outcome = self.engine.generate(
            GenerationInput {
                event_type,
                people: &people,
                history: &history,
                target_date,
                excluded,
                generated_at: Utc::now(),
            },
            rng,
        );

        info!(
            organization = %event_type.organization_id,
            event_type = %event_type.id,
            date = %target_date,
            assigned = outcome.stats.total_assigned,
            needed = outcome.stats.total_needed,
            warnings = outcome.warnings.len(),
            history_events = history.len(),
            "generated assignments"
        );

        Ok(outcome)
    }

    fn load_event_type(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
    ) -> Result<EventType, AssignmentError> {
        self.repository
            .event_type(organization, event_type)?
            .ok_or_else(|| AssignmentError::EventTypeNotFound {
                organization: organization.clone(),
                event_type: event_type.clone(),
            })
    }

    fn load_inputs(
        &self,
        organization: &OrganizationId,
        target_date: NaiveDate,
    ) -> Result<(Vec<Person>, Vec<EventRecord>), AssignmentError> {
        let window_start =
            target_date - Duration::weeks(i64::from(self.config().lookback_weeks));

        let people = self
            .repository
            .eligible_people(organization)?
            .into_iter()
            .filter(|person| person.status.is_schedulable())
            .collect();

        let history = self
            .repository
            .occurred_events(organization, window_start, target_date)?
            .into_iter()
            .filter(|event| {
                event.status.has_occurred()
                    && event.date >= window_start
                    && event.date < target_date
            })
            .collect();

        Ok((people, history))
    }
}

/// Per-date outcome of a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub date: NaiveDate,
    pub success: bool,
    pub event_id: Option<EventId>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<GenerationWarning>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_percent: Option<u32>,
}

impl BatchResult {
    fn created(event_id: EventId, outcome: GenerationOutcome) -> Self {
        Self {
            date: outcome.target_date,
            success: true,
            event_id: Some(event_id),
            error: None,
            warnings: Some(outcome.warnings),
            coverage_percent: Some(outcome.stats.coverage_percent),
        }
    }

    fn failed(date: NaiveDate, error: String) -> Self {
        Self {
            date,
            success: false,
            event_id: None,
            error: Some(error),
            warnings: None,
            coverage_percent: None,
        }
    }
}

/// Candidates for one section ordered by fairness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRanking {
    pub section_name: String,
    pub position: u32,
    pub role_id: RoleId,
    pub role_name: String,
    pub required: bool,
    pub people_needed: u32,
    pub candidates: Vec<ScoreBreakdown>,
}

/// Error raised by the assignment service.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("event type {event_type} not found for organization {organization}")]
    EventTypeNotFound {
        organization: OrganizationId,
        event_type: EventTypeId,
    },
    #[error("person {person} is not an eligible member of organization {organization}")]
    PersonNotFound {
        organization: OrganizationId,
        person: PersonId,
    },
    #[error("an event already exists for this date")]
    DuplicateEvent { date: NaiveDate },
    #[error("at least one date is required")]
    EmptyBatch,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
