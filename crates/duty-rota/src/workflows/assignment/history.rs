//! Aggregates past event records into per-person participation statistics.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};

use super::domain::{EventRecord, PersonId, RoleId};

/// ISO-8601 `(year, week)` pair; late-December and early-January dates belong to
/// the year that owns the majority of their week.
pub type WeekKey = (i32, u32);

pub fn week_key(date: NaiveDate) -> WeekKey {
    let week = date.iso_week();
    (week.year(), week.week())
}

/// Participation derived from one lookback window. Built fresh for every
/// generation call and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipationStats {
    counts: HashMap<PersonId, u32>,
    average: f64,
    maximum: u32,
    last_role_dates: HashMap<(PersonId, RoleId), NaiveDate>,
    streaks: HashMap<PersonId, u32>,
}

impl ParticipationStats {
    /// Builds statistics from events that already fall inside the lookback
    /// window ending before `target_date`. No status filtering happens here.
    pub fn build(events: &[EventRecord], target_date: NaiveDate) -> Self {
        let mut counts: HashMap<PersonId, u32> = HashMap::new();
        let mut last_role_dates: HashMap<(PersonId, RoleId), NaiveDate> = HashMap::new();
        let mut weeks: HashMap<WeekKey, HashSet<PersonId>> = HashMap::new();

        for event in events {
            let bucket = weeks.entry(week_key(event.date)).or_default();
            for assignment in &event.assignments {
                let person = &assignment.person.id;
                *counts.entry(person.clone()).or_insert(0) += 1;
                bucket.insert(person.clone());

                last_role_dates
                    .entry((person.clone(), assignment.role_id.clone()))
                    .and_modify(|existing| {
                        if event.date > *existing {
                            *existing = event.date;
                        }
                    })
                    .or_insert(event.date);
            }
        }

        let maximum = counts.values().copied().max().unwrap_or(0);
        let average = if counts.is_empty() {
            0.0
        } else {
            counts.values().map(|count| f64::from(*count)).sum::<f64>() / counts.len() as f64
        };

        let streaks = counts
            .keys()
            .map(|person| (person.clone(), consecutive_weeks(person, &weeks, target_date)))
            .collect();

        Self {
            counts,
            average,
            maximum,
            last_role_dates,
            streaks,
        }
    }

    pub fn count_for(&self, person: &PersonId) -> u32 {
        self.counts.get(person).copied().unwrap_or(0)
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    pub fn last_assignment(&self, person: &PersonId, role: &RoleId) -> Option<NaiveDate> {
        self.last_role_dates
            .get(&(person.clone(), role.clone()))
            .copied()
    }

    pub fn streak_for(&self, person: &PersonId) -> u32 {
        self.streaks.get(person).copied().unwrap_or(0)
    }

    pub fn people(&self) -> impl Iterator<Item = &PersonId> {
        self.counts.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Counts unbroken weeks containing `person`, walking back from the week
/// before the target date's week and stopping at the first gap.
fn consecutive_weeks(
    person: &PersonId,
    weeks: &HashMap<WeekKey, HashSet<PersonId>>,
    target_date: NaiveDate,
) -> u32 {
    let mut streak = 0;
    let mut cursor = target_date - Duration::weeks(1);

    while weeks
        .get(&week_key(cursor))
        .is_some_and(|bucket| bucket.contains(person))
    {
        streak += 1;
        cursor -= Duration::weeks(1);
    }

    streak
}
