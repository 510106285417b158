//! Volunteer assignment: history analysis, fairness scoring and generation.
//!
//! Generation picks randomly among freshness-filtered candidates; the fairness
//! score is computed alongside for explanation and equity reporting but does
//! not rank the selection.

pub mod config;
pub mod domain;
pub mod engine;
pub mod fairness;
pub mod history;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::AssignmentConfig;
pub use domain::{
    AssignedPerson, Assignment, AssignmentOrigin, BackupPerson, EventId, EventRecord,
    EventStatus, EventType, EventTypeId, GenerationWarning, MinistryStatus, NewEvent,
    OrganizationId, Person, PersonId, RoleId, RoleRef, RoleRequirement, WarningKind,
};
pub use engine::{AssignmentEngine, GenerationInput, GenerationOutcome, GenerationStats};
pub use fairness::{
    FairnessCalculator, FairnessConfig, FairnessFactor, ScoreBreakdown, ScoreComponent,
};
pub use history::{week_key, ParticipationStats, WeekKey};
pub use repository::{RepositoryError, SchedulingRepository};
pub use router::assignment_router;
pub use service::{AssignmentError, AssignmentService, BatchResult, SectionRanking};
