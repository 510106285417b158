use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use crate::workflows::assignment::domain::{
    AssignedPerson, Assignment, AssignmentOrigin, EventId, EventRecord, EventStatus, EventType,
    EventTypeId, MinistryStatus, NewEvent, OrganizationId, Person, PersonId, RoleId, RoleRef,
    RoleRequirement,
};
use crate::workflows::assignment::engine::{AssignmentEngine, GenerationInput, GenerationOutcome};
use crate::workflows::assignment::repository::{RepositoryError, SchedulingRepository};
use crate::workflows::assignment::{AssignmentConfig, AssignmentService};

pub(super) const ORG: &str = "grace-chapel";
pub(super) const SERVICE: &str = "sunday-service";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// First Sunday of March 2025; used as the default generation target.
pub(super) fn target() -> NaiveDate {
    date(2025, 3, 2)
}

pub(super) fn org() -> OrganizationId {
    OrganizationId::new(ORG)
}

pub(super) fn service_type_id() -> EventTypeId {
    EventTypeId::new(SERVICE)
}

pub(super) fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub(super) fn role(id: &str, name: &str) -> RoleRef {
    RoleRef {
        id: RoleId::new(id),
        name: name.to_string(),
    }
}

pub(super) fn usher() -> RoleRef {
    role("usher", "Usher")
}

pub(super) fn reader() -> RoleRef {
    role("reader", "Scripture Reader")
}

pub(super) fn person(id: &str, roles: &[&str]) -> Person {
    Person {
        id: PersonId::new(id),
        full_name: format!("Volunteer {id}"),
        phone: format!("555-{id}"),
        status: MinistryStatus::Active,
        roles: roles.iter().map(|role| RoleId::new(*role)).collect(),
        priority: 5,
        unavailable_on: BTreeSet::new(),
    }
}

pub(super) fn ushers(count: usize) -> Vec<Person> {
    (1..=count)
        .map(|index| person(&format!("u{index:02}"), &["usher"]))
        .collect()
}

pub(super) fn section(
    name: &str,
    position: u32,
    role: Option<RoleRef>,
    people_needed: u32,
    required: bool,
) -> RoleRequirement {
    RoleRequirement {
        section_name: name.to_string(),
        position,
        role,
        people_needed,
        required,
    }
}

pub(super) fn event_type(sections: Vec<RoleRequirement>) -> EventType {
    EventType {
        id: service_type_id(),
        organization_id: org(),
        name: "Sunday Service".to_string(),
        sections,
    }
}

pub(super) fn welcome_team(needed: u32) -> EventType {
    event_type(vec![section("Welcome", 1, Some(usher()), needed, true)])
}

pub(super) fn past_assignment(person: &str, role: &RoleRef) -> Assignment {
    Assignment {
        section_name: "Welcome".to_string(),
        section_order: 1,
        role_id: role.id.clone(),
        role_name: role.name.clone(),
        person: AssignedPerson {
            id: PersonId::new(person),
            name: format!("Volunteer {person}"),
            phone: String::new(),
        },
        backup: None,
        origin: AssignmentOrigin::Manual,
        assigned_at: Utc
            .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
        fairness_score: None,
    }
}

pub(super) fn past_event(on: NaiveDate, people: &[&str], role: &RoleRef) -> EventRecord {
    EventRecord {
        id: EventId::new(format!("evt-{on}")),
        organization_id: org(),
        event_type_id: service_type_id(),
        date: on,
        status: EventStatus::Completed,
        assignments: people
            .iter()
            .map(|person| past_assignment(person, role))
            .collect(),
    }
}

pub(super) fn generated_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 24, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn engine() -> AssignmentEngine {
    AssignmentEngine::new(AssignmentConfig::default())
}

pub(super) fn generate(
    engine: &AssignmentEngine,
    event_type: &EventType,
    people: &[Person],
    history: &[EventRecord],
    excluded: &HashSet<PersonId>,
    seed: u64,
) -> GenerationOutcome {
    engine.generate(
        GenerationInput {
            event_type,
            people,
            history,
            target_date: target(),
            excluded,
            generated_at: generated_at(),
        },
        &mut seeded(seed),
    )
}

pub(super) fn ids(outcome: &GenerationOutcome) -> Vec<String> {
    outcome
        .assignments
        .iter()
        .map(|assignment| assignment.person.id.to_string())
        .collect()
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) people: Mutex<Vec<Person>>,
    pub(super) event_types: Mutex<Vec<EventType>>,
    pub(super) events: Mutex<Vec<EventRecord>>,
    sequence: AtomicU64,
}

impl MemoryRepository {
    pub(super) fn seeded_with(people: Vec<Person>, event_type: EventType) -> Self {
        let repository = Self::default();
        *repository.people.lock().expect("people mutex poisoned") = people;
        repository
            .event_types
            .lock()
            .expect("event type mutex poisoned")
            .push(event_type);
        repository
    }

    pub(super) fn push_event(&self, event: EventRecord) {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
    }

    pub(super) fn stored_events(&self) -> Vec<EventRecord> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl SchedulingRepository for MemoryRepository {
    fn eligible_people(&self, organization: &OrganizationId) -> Result<Vec<Person>, RepositoryError> {
        if organization.as_str() != ORG {
            return Ok(Vec::new());
        }
        Ok(self.people.lock().expect("people mutex poisoned").clone())
    }

    fn event_type(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
    ) -> Result<Option<EventType>, RepositoryError> {
        let guard = self.event_types.lock().expect("event type mutex poisoned");
        Ok(guard
            .iter()
            .find(|candidate| {
                &candidate.organization_id == organization && &candidate.id == event_type
            })
            .cloned())
    }

    fn occurred_events(
        &self,
        organization: &OrganizationId,
        _window_start: NaiveDate,
        _before: NaiveDate,
    ) -> Result<Vec<EventRecord>, RepositoryError> {
        // Unfiltered; the service applies the window and status checks itself.
        let guard = self.events.lock().expect("event mutex poisoned");
        Ok(guard
            .iter()
            .filter(|event| &event.organization_id == organization)
            .cloned()
            .collect())
    }

    fn event_exists(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let guard = self.events.lock().expect("event mutex poisoned");
        Ok(guard.iter().any(|event| {
            &event.organization_id == organization
                && &event.event_type_id == event_type
                && event.date == date
        }))
    }

    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, RepositoryError> {
        let mut guard = self.events.lock().expect("event mutex poisoned");
        if guard.iter().any(|existing| {
            existing.organization_id == event.organization_id
                && existing.event_type_id == event.event_type_id
                && existing.date == event.date
        }) {
            return Err(RepositoryError::Conflict);
        }

        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let record = event.into_record(EventId(format!("evt-{id:04}")));
        guard.push(record.clone());
        Ok(record)
    }
}

/// Delegates to an in-memory store but refuses writes for one date.
pub(super) struct FlakyWriteRepository {
    pub(super) inner: MemoryRepository,
    pub(super) failing_date: NaiveDate,
}

impl SchedulingRepository for FlakyWriteRepository {
    fn eligible_people(&self, organization: &OrganizationId) -> Result<Vec<Person>, RepositoryError> {
        self.inner.eligible_people(organization)
    }

    fn event_type(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
    ) -> Result<Option<EventType>, RepositoryError> {
        self.inner.event_type(organization, event_type)
    }

    fn occurred_events(
        &self,
        organization: &OrganizationId,
        window_start: NaiveDate,
        before: NaiveDate,
    ) -> Result<Vec<EventRecord>, RepositoryError> {
        self.inner.occurred_events(organization, window_start, before)
    }

    fn event_exists(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        self.inner.event_exists(organization, event_type, date)
    }

    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, RepositoryError> {
        if event.date == self.failing_date {
            return Err(RepositoryError::Unavailable("database offline".to_string()));
        }
        self.inner.insert_event(event)
    }
}

pub(super) struct UnavailableRepository;

impl SchedulingRepository for UnavailableRepository {
    fn eligible_people(&self, _organization: &OrganizationId) -> Result<Vec<Person>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn event_type(
        &self,
        _organization: &OrganizationId,
        _event_type: &EventTypeId,
    ) -> Result<Option<EventType>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn occurred_events(
        &self,
        _organization: &OrganizationId,
        _window_start: NaiveDate,
        _before: NaiveDate,
    ) -> Result<Vec<EventRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn event_exists(
        &self,
        _organization: &OrganizationId,
        _event_type: &EventTypeId,
        _date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_event(&self, _event: NewEvent) -> Result<EventRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(
    people: Vec<Person>,
    event_type: EventType,
) -> (AssignmentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::seeded_with(people, event_type));
    let service = AssignmentService::new(repository.clone(), AssignmentConfig::default());
    (service, repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
