use chrono::NaiveDate;
use duty_rota::workflows::assignment::{
    EventId, EventRecord, EventType, EventTypeId, NewEvent, OrganizationId, Person,
    RepositoryError, SchedulingRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store backing the HTTP service and the CLI commands.
#[derive(Default, Clone)]
pub(crate) struct InMemorySchedulingRepository {
    rosters: Arc<Mutex<HashMap<OrganizationId, Vec<Person>>>>,
    event_types: Arc<Mutex<Vec<EventType>>>,
    events: Arc<Mutex<Vec<EventRecord>>>,
    sequence: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
}

impl InMemorySchedulingRepository {
    pub(crate) fn with_roster(
        self,
        organization: OrganizationId,
        people: Vec<Person>,
    ) -> Result<Self, RepositoryError> {
        lock(&self.rosters)?.insert(organization, people);
        Ok(self)
    }

    pub(crate) fn with_event_type(self, event_type: EventType) -> Result<Self, RepositoryError> {
        lock(&self.event_types)?.push(event_type);
        Ok(self)
    }

    /// Stores an already-identified event, e.g. seeded history.
    pub(crate) fn record_event(&self, event: EventRecord) -> Result<(), RepositoryError> {
        lock(&self.events)?.push(event);
        Ok(())
    }

    pub(crate) fn events(&self) -> Result<Vec<EventRecord>, RepositoryError> {
        Ok(lock(&self.events)?.clone())
    }
}

impl SchedulingRepository for InMemorySchedulingRepository {
    fn eligible_people(&self, organization: &OrganizationId) -> Result<Vec<Person>, RepositoryError> {
        let guard = lock(&self.rosters)?;
        Ok(guard
            .get(organization)
            .map(|people| {
                people
                    .iter()
                    .filter(|person| person.status.is_schedulable())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn event_type(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
    ) -> Result<Option<EventType>, RepositoryError> {
        let guard = lock(&self.event_types)?;
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
        window_start: NaiveDate,
        before: NaiveDate,
    ) -> Result<Vec<EventRecord>, RepositoryError> {
        let guard = lock(&self.events)?;
        Ok(guard
            .iter()
            .filter(|event| {
                &event.organization_id == organization
                    && event.status.has_occurred()
                    && event.date >= window_start
                    && event.date < before
            })
            .cloned()
            .collect())
    }

    fn event_exists(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let guard = lock(&self.events)?;
        Ok(guard.iter().any(|event| {
            &event.organization_id == organization
                && &event.event_type_id == event_type
                && event.date == date
        }))
    }

    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, RepositoryError> {
        let mut guard = lock(&self.events)?;
        let duplicate = guard.iter().any(|existing| {
            existing.organization_id == event.organization_id
                && existing.event_type_id == event.event_type_id
                && existing.date == event.date
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let record = event.into_record(EventId(format!("evt-{id:06}")));
        guard.push(record.clone());
        Ok(record)
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
