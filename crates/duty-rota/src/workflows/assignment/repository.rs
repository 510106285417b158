use chrono::NaiveDate;

use super::domain::{EventRecord, EventType, EventTypeId, NewEvent, OrganizationId, Person};

/// Storage abstraction so the service can be exercised against any backing store.
///
/// Implementations decide how queries are executed; the service still
/// re-applies status and window filters to whatever comes back.
pub trait SchedulingRepository: Send + Sync {
    /// People in the organization whose status is active or leader.
    fn eligible_people(&self, organization: &OrganizationId) -> Result<Vec<Person>, RepositoryError>;

    fn event_type(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
    ) -> Result<Option<EventType>, RepositoryError>;

    /// Occurred events dated in `[window_start, before)`.
    fn occurred_events(
        &self,
        organization: &OrganizationId,
        window_start: NaiveDate,
        before: NaiveDate,
    ) -> Result<Vec<EventRecord>, RepositoryError>;

    fn event_exists(
        &self,
        organization: &OrganizationId,
        event_type: &EventTypeId,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError>;

    /// Persists a new event and returns it with its assigned identifier.
    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
