use crate::infra::InMemorySchedulingRepository;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use duty_rota::config::AppConfig;
use duty_rota::error::AppError;
use duty_rota::workflows::assignment::{
    AssignedPerson, Assignment, AssignmentConfig, AssignmentError, AssignmentOrigin,
    AssignmentService, BatchResult, EventId, EventRecord, EventStatus, EventType, EventTypeId,
    GenerationOutcome, GenerationWarning, MinistryStatus, OrganizationId, Person, PersonId,
    RoleId, RoleRef, RoleRequirement, ScoreBreakdown, SectionRanking,
};
use duty_rota::workflows::roster_import::RosterImporter;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_ORGANIZATION: &str = "grace-chapel";
const DEMO_EVENT_TYPE: &str = "sunday-service";
const DEMO_HISTORY_WEEKS: i64 = 6;

#[derive(Args, Debug, Default)]
pub(crate) struct GenerateArgs {
    /// Target date (YYYY-MM-DD). Defaults to the coming Sunday.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Roster CSV replacing the built-in demo roster.
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
    /// Seed for reproducible selection.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Person ids to treat as already used elsewhere.
    #[arg(long = "exclude", value_delimiter = ',')]
    pub(crate) exclude: Vec<String>,
    /// Print the fairness breakdown of every selected person.
    #[arg(long)]
    pub(crate) breakdowns: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Dates to schedule, in order (YYYY-MM-DD). Repeat or comma-separate.
    #[arg(long = "date", required = true, value_delimiter = ',', value_parser = crate::infra::parse_date)]
    pub(crate) dates: Vec<NaiveDate>,
    /// Roster CSV replacing the built-in demo roster.
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
    /// Seed for reproducible selection.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct ExplainArgs {
    /// Person id from the roster.
    #[arg(long)]
    pub(crate) person: String,
    /// Role id, e.g. `usher`.
    #[arg(long)]
    pub(crate) role: String,
    /// Target date (YYYY-MM-DD). Defaults to the coming Sunday.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Roster CSV replacing the built-in demo roster.
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First Sunday of the demo (YYYY-MM-DD). Defaults to the coming Sunday.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Number of consecutive weeks to batch-schedule.
    #[arg(long, default_value_t = 4)]
    pub(crate) weeks: u32,
    /// Seed for reproducible selection.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Roster CSV replacing the built-in demo roster.
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
}

/// Demo organization wired to an in-memory store.
pub(crate) struct DemoContext {
    pub(crate) organization: OrganizationId,
    pub(crate) event_type: EventTypeId,
    pub(crate) roster: Vec<Person>,
    pub(crate) repository: Arc<InMemorySchedulingRepository>,
    pub(crate) service: AssignmentService<InMemorySchedulingRepository>,
}

impl DemoContext {
    /// Seeds a roster, the Sunday service and six weeks of history before `anchor`.
    pub(crate) fn seed(
        anchor: NaiveDate,
        roster: Option<Vec<Person>>,
        config: AssignmentConfig,
    ) -> Result<Self, AppError> {
        let organization = OrganizationId::new(DEMO_ORGANIZATION);
        let event_type = demo_event_type();
        let mut people = roster.unwrap_or_else(demo_roster);
        mark_unavailable(&mut people, "p06", anchor);

        let repository = InMemorySchedulingRepository::default()
            .with_roster(organization.clone(), people.clone())
            .and_then(|repository| repository.with_event_type(event_type.clone()))
            .map_err(AssignmentError::from)?;

        for event in demo_history(&event_type, &people, anchor) {
            repository
                .record_event(event)
                .map_err(AssignmentError::from)?;
        }

        let repository = Arc::new(repository);
        let service = AssignmentService::new(repository.clone(), config);

        Ok(Self {
            organization,
            event_type: event_type.id,
            roster: people,
            repository,
            service,
        })
    }

    fn drafted_people(&self) -> Result<HashSet<PersonId>, AppError> {
        let events = self.repository.events().map_err(AssignmentError::from)?;
        Ok(events
            .iter()
            .filter(|event| event.status == EventStatus::Draft)
            .flat_map(|event| event.assignments.iter())
            .map(|assignment| assignment.person.id.clone())
            .collect())
    }
}

pub(crate) fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    let GenerateArgs {
        date,
        roster_csv,
        seed,
        exclude,
        breakdowns,
    } = args;

    let date = date.unwrap_or_else(|| upcoming_sunday(Local::now().date_naive()));
    let config = cli_assignment_config(seed, breakdowns)?;
    let context = DemoContext::seed(date, load_roster(roster_csv)?, config)?;
    let excluded: HashSet<PersonId> = exclude.into_iter().map(PersonId).collect();

    let mut rng = context.service.selection_rng();
    let outcome = context.service.generate_one(
        &context.organization,
        &context.event_type,
        date,
        &excluded,
        &mut rng,
    )?;

    render_outcome(&outcome);
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let BatchArgs {
        dates,
        roster_csv,
        seed,
    } = args;

    let anchor = dates
        .iter()
        .min()
        .copied()
        .unwrap_or_else(|| upcoming_sunday(Local::now().date_naive()));
    let config = cli_assignment_config(seed, false)?;
    let context = DemoContext::seed(anchor, load_roster(roster_csv)?, config)?;

    let mut rng = context.service.selection_rng();
    let results =
        context
            .service
            .generate_batch(&context.organization, &context.event_type, &dates, &mut rng)?;

    render_batch(&results);
    println!(
        "Distinct volunteers across the batch: {}",
        context.drafted_people()?.len()
    );
    Ok(())
}

pub(crate) fn run_explain(args: ExplainArgs) -> Result<(), AppError> {
    let ExplainArgs {
        person,
        role,
        date,
        roster_csv,
    } = args;

    let date = date.unwrap_or_else(|| upcoming_sunday(Local::now().date_naive()));
    let config = cli_assignment_config(None, false)?;
    let context = DemoContext::seed(date, load_roster(roster_csv)?, config)?;

    let breakdown = context.service.explain(
        &context.organization,
        &PersonId(person),
        &RoleId(role),
        date,
    )?;

    println!("Fairness breakdown for {date}");
    render_breakdown(&breakdown);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        date,
        weeks,
        seed,
        roster_csv,
    } = args;

    let first = date.unwrap_or_else(|| upcoming_sunday(Local::now().date_naive()));
    let config = cli_assignment_config(seed, true)?;
    let context = DemoContext::seed(first, load_roster(roster_csv)?, config)?;

    println!(
        "Volunteer rota demo for {} ({} weeks of history)",
        context.organization, DEMO_HISTORY_WEEKS
    );
    for person in context
        .roster
        .iter()
        .filter(|person| !person.status.is_schedulable())
    {
        println!("- {} is not scheduled ({})", person.full_name, person.status.label());
    }

    let mut rng = context.service.selection_rng();
    let preview = context.service.generate_one(
        &context.organization,
        &context.event_type,
        first,
        &HashSet::new(),
        &mut rng,
    )?;
    println!("\nPreview (not saved)");
    render_outcome(&preview);

    let report =
        context
            .service
            .fairness_report(&context.organization, &context.event_type, first)?;
    render_fairness_report(&report, 3);

    let dates: Vec<NaiveDate> = (0..weeks.max(1))
        .map(|week| first + Duration::weeks(i64::from(week)))
        .collect();
    let results =
        context
            .service
            .generate_batch(&context.organization, &context.event_type, &dates, &mut rng)?;

    println!("\nBatch schedule");
    render_batch(&results);
    println!(
        "Distinct volunteers across the batch: {}",
        context.drafted_people()?.len()
    );

    Ok(())
}

fn cli_assignment_config(seed: Option<u64>, breakdowns: bool) -> Result<AssignmentConfig, AppError> {
    let mut config = AppConfig::load()?.assignment;
    if seed.is_some() {
        config.random_seed = seed;
    }
    if breakdowns {
        config.include_score_breakdowns = true;
    }
    Ok(config)
}

fn load_roster(path: Option<PathBuf>) -> Result<Option<Vec<Person>>, AppError> {
    match path {
        Some(path) => Ok(Some(RosterImporter::from_path(path)?)),
        None => Ok(None),
    }
}

/// Today when it is a Sunday, otherwise the next one.
pub(crate) fn upcoming_sunday(today: NaiveDate) -> NaiveDate {
    let offset = (7 - today.weekday().num_days_from_sunday()) % 7;
    today + Duration::days(i64::from(offset))
}

fn role(id: &str, name: &str) -> RoleRef {
    RoleRef {
        id: RoleId::new(id),
        name: name.to_string(),
    }
}

fn requirement(
    section_name: &str,
    position: u32,
    role: Option<RoleRef>,
    people_needed: u32,
    required: bool,
) -> RoleRequirement {
    RoleRequirement {
        section_name: section_name.to_string(),
        position,
        role,
        people_needed,
        required,
    }
}

pub(crate) fn demo_event_type() -> EventType {
    EventType {
        id: EventTypeId::new(DEMO_EVENT_TYPE),
        organization_id: OrganizationId::new(DEMO_ORGANIZATION),
        name: "Sunday Service".to_string(),
        sections: vec![
            requirement("Welcome Team", 1, Some(role("usher", "Usher")), 2, true),
            requirement(
                "Scripture Reading",
                2,
                Some(role("reader", "Scripture Reader")),
                1,
                true,
            ),
            requirement("Worship Band", 3, Some(role("musician", "Musician")), 3, true),
            requirement(
                "Kids Church",
                4,
                Some(role("kids", "Kids Ministry")),
                2,
                false,
            ),
            requirement(
                "Sound Desk",
                5,
                Some(role("av", "Sound & Projection")),
                1,
                true,
            ),
            requirement("Prayer Ministry", 6, None, 2, true),
        ],
    }
}

pub(crate) fn demo_roster() -> Vec<Person> {
    let entries: [(&str, &str, MinistryStatus, &[&str], u8); 15] = [
        ("p01", "Amara Okafor", MinistryStatus::Leader, &["usher", "reader"], 6),
        ("p02", "Ben Castillo", MinistryStatus::Active, &["usher"], 5),
        ("p03", "Chloe Nguyen", MinistryStatus::Active, &["usher", "kids"], 5),
        ("p04", "Daniel Reyes", MinistryStatus::Active, &["usher", "av"], 5),
        ("p05", "Esther Mwangi", MinistryStatus::Active, &["reader", "kids"], 5),
        ("p06", "Felix Hart", MinistryStatus::Active, &["musician"], 5),
        ("p07", "Grace Lindqvist", MinistryStatus::Leader, &["musician", "reader"], 7),
        ("p08", "Hiro Tanaka", MinistryStatus::Active, &["musician", "av"], 5),
        ("p09", "Isla Moreau", MinistryStatus::Active, &["musician"], 5),
        ("p10", "Jonah Adeyemi", MinistryStatus::Active, &["av"], 5),
        ("p11", "Kezia Brooks", MinistryStatus::Active, &["kids"], 5),
        ("p12", "Luca Romano", MinistryStatus::Active, &["usher", "musician"], 5),
        ("p13", "Maya Patel", MinistryStatus::Inactive, &["usher"], 5),
        ("p14", "Noah Fischer", MinistryStatus::Visitor, &[], 5),
        ("p15", "Olivia Chen", MinistryStatus::Active, &["kids", "usher"], 4),
    ];

    entries
        .iter()
        .map(|(id, name, status, roles, priority)| Person {
            id: PersonId::new(*id),
            full_name: name.to_string(),
            phone: format!("+1-555-01{}", &id[1..]),
            status: *status,
            roles: roles.iter().map(|role| RoleId::new(*role)).collect(),
            priority: *priority,
            unavailable_on: BTreeSet::new(),
        })
        .collect()
}

fn mark_unavailable(people: &mut [Person], id: &str, date: NaiveDate) {
    if let Some(person) = people.iter_mut().find(|person| person.id.as_str() == id) {
        person.unavailable_on.insert(date);
    }
}

/// Weekly completed services before `anchor`, filled by rotating through each role's holders.
pub(crate) fn demo_history(
    event_type: &EventType,
    people: &[Person],
    anchor: NaiveDate,
) -> Vec<EventRecord> {
    (1..=DEMO_HISTORY_WEEKS)
        .map(|week| {
            let date = anchor - Duration::weeks(week);
            let assigned_at = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
            let mut used: HashSet<&PersonId> = HashSet::new();
            let mut assignments = Vec::new();

            for requirement in &event_type.sections {
                let Some(role) = requirement.resolved_role() else {
                    continue;
                };
                let holders: Vec<&Person> = people
                    .iter()
                    .filter(|person| person.status.is_schedulable() && person.holds_role(&role.id))
                    .collect();

                let mut offset = week as usize;
                let mut placed = 0;
                for _ in 0..holders.len() {
                    if placed == requirement.people_needed {
                        break;
                    }
                    let person = holders[offset % holders.len()];
                    offset += 1;
                    if !used.insert(&person.id) {
                        continue;
                    }
                    placed += 1;
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
                        backup: None,
                        origin: AssignmentOrigin::Manual,
                        assigned_at,
                        fairness_score: None,
                    });
                }
            }

            EventRecord {
                id: EventId(format!("hist-{date}")),
                organization_id: event_type.organization_id.clone(),
                event_type_id: event_type.id.clone(),
                date,
                status: EventStatus::Completed,
                assignments,
            }
        })
        .collect()
}

fn render_outcome(outcome: &GenerationOutcome) {
    println!("Assignments for {}", outcome.target_date);
    if outcome.assignments.is_empty() {
        println!("- none");
    }
    for assignment in &outcome.assignments {
        let score = assignment
            .fairness_score
            .map(|score| format!(" [fairness {score:+.2}]"))
            .unwrap_or_default();
        println!(
            "- {} / {}: {}{}",
            assignment.section_name, assignment.role_name, assignment.person.name, score
        );
        if let Some(backup) = &assignment.backup {
            println!("    backup: {}", backup.name);
        }
    }

    let stats = &outcome.stats;
    println!(
        "Coverage: {}/{} ({}%) using {} people",
        stats.total_assigned, stats.total_needed, stats.coverage_percent, stats.persons_used
    );
    render_warnings(&outcome.warnings);

    if let Some(breakdowns) = &stats.scoring_breakdowns {
        println!("\nScore breakdowns");
        for breakdown in breakdowns {
            render_breakdown(breakdown);
        }
    }
}

fn render_warnings(warnings: &[GenerationWarning]) {
    if warnings.is_empty() {
        println!("Warnings: none");
        return;
    }

    println!("Warnings");
    for warning in warnings {
        println!("- {}: {}", warning.kind.label(), warning.message);
    }
}

fn render_breakdown(breakdown: &ScoreBreakdown) {
    println!(
        "{} as {}: total {:+.3} ({} assignment(s), {} consecutive week(s))",
        breakdown.person_name,
        breakdown.role_id,
        breakdown.total,
        breakdown.participation_count,
        breakdown.consecutive_weeks
    );
    for component in &breakdown.components {
        println!(
            "  - {}: {:+.3} ({})",
            component.factor.label(),
            component.value,
            component.notes
        );
    }
}

fn render_fairness_report(report: &[SectionRanking], top: usize) {
    println!("\nFairness ranking (top {top} per section)");
    for section in report {
        let flag = if section.required { "" } else { ", optional" };
        println!(
            "{} / {} (needs {}{})",
            section.section_name, section.role_name, section.people_needed, flag
        );
        for candidate in section.candidates.iter().take(top) {
            println!("  - {:<18} {:+.3}", candidate.person_name, candidate.total);
        }
    }
}

fn render_batch(results: &[BatchResult]) {
    for result in results {
        match (&result.event_id, &result.error) {
            (Some(event_id), _) => println!(
                "- {}: created {} ({}% coverage, {} warning(s))",
                result.date,
                event_id,
                result.coverage_percent.unwrap_or(0),
                result.warnings.as_ref().map(Vec::len).unwrap_or(0)
            ),
            (None, Some(error)) => println!("- {}: skipped ({})", result.date, error),
            (None, None) => println!("- {}: skipped", result.date),
        }
    }
}
