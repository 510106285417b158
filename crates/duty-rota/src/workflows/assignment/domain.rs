use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Tenant that owns people, event types and events.
    OrganizationId
);
identifier!(
    /// Identifier of a recurring event category (e.g. a weekly service).
    EventTypeId
);
identifier!(PersonId);
identifier!(
    /// Opaque role identity; roles are always compared by this value.
    RoleId
);
identifier!(EventId);

/// Membership classification; only active members and leaders are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinistryStatus {
    Active,
    Leader,
    Inactive,
    Visitor,
}

impl MinistryStatus {
    pub const fn is_schedulable(self) -> bool {
        matches!(self, Self::Active | Self::Leader)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Leader => "leader",
            Self::Inactive => "inactive",
            Self::Visitor => "visitor",
        }
    }
}

pub const DEFAULT_PRIORITY: u8 = 5;
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// Volunteer on an organization's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
    pub phone: String,
    pub status: MinistryStatus,
    pub roles: BTreeSet<RoleId>,
    /// Manual priority in 1..=10; only used as a fine-grained tie-break.
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub unavailable_on: BTreeSet<NaiveDate>,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Person {
    pub fn holds_role(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }

    /// Availability is authoritative and overrides every other eligibility signal.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        !self.unavailable_on.contains(&date)
    }

    pub fn clamped_priority(&self) -> u8 {
        self.priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
    }
}

/// Resolved role reference carried by a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: RoleId,
    pub name: String,
}

/// One slot group within an event type's program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRequirement {
    pub section_name: String,
    pub position: u32,
    #[serde(default)]
    pub role: Option<RoleRef>,
    pub people_needed: u32,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl RoleRequirement {
    /// Returns the role when the reference is present and non-blank.
    pub fn resolved_role(&self) -> Option<&RoleRef> {
        self.role
            .as_ref()
            .filter(|role| !role.id.as_str().trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub id: EventTypeId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub sections: Vec<RoleRequirement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Published,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Statuses that count as having happened for history purposes.
    pub const fn has_occurred(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOrigin {
    Generated,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedPerson {
    pub id: PersonId,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPerson {
    pub id: PersonId,
    pub name: String,
}

/// A single person placed in a section of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub section_name: String,
    pub section_order: u32,
    pub role_id: RoleId,
    pub role_name: String,
    pub person: AssignedPerson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupPerson>,
    pub origin: AssignmentOrigin,
    pub assigned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fairness_score: Option<f64>,
}

/// Persisted event instance, past or newly generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub organization_id: OrganizationId,
    pub event_type_id: EventTypeId,
    pub date: NaiveDate,
    pub status: EventStatus,
    pub assignments: Vec<Assignment>,
}

/// Event payload handed to the repository before it has an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub organization_id: OrganizationId,
    pub event_type_id: EventTypeId,
    pub date: NaiveDate,
    pub status: EventStatus,
    pub assignments: Vec<Assignment>,
}

impl NewEvent {
    pub fn into_record(self, id: EventId) -> EventRecord {
        EventRecord {
            id,
            organization_id: self.organization_id,
            event_type_id: self.event_type_id,
            date: self.date,
            status: self.status,
            assignments: self.assignments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    NoEligible,
    InsufficientPersons,
    InvalidRoleReference,
}

impl WarningKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoEligible => "NO_ELIGIBLE",
            Self::InsufficientPersons => "INSUFFICIENT_PERSONS",
            Self::InvalidRoleReference => "INVALID_ROLE_REFERENCE",
        }
    }
}

/// Non-fatal data-quality finding produced during generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub role_name: String,
    pub section_name: String,
    pub message: String,
    pub needed: u32,
    pub available: u32,
}
