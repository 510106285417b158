use super::normalizer::{clean_cell, normalize_keyword, split_list};
use crate::workflows::assignment::domain::{
    MinistryStatus, Person, PersonId, RoleId, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::io::Read;

#[derive(Debug)]
pub(crate) enum ParsedRow {
    Person(Person),
    Invalid { line: usize, reason: String },
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Quoted cells may span lines; only fall back to counting when no position is known.
        let line = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(index + 2);
        let row: RosterRow = record.deserialize(Some(&headers))?;
        rows.push(match row.into_person() {
            Ok(person) => ParsedRow::Person(person),
            Err(reason) => ParsedRow::Invalid { line, reason },
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Person ID")]
    person_id: String,
    #[serde(rename = "Full Name")]
    full_name: String,
    #[serde(rename = "Phone", default)]
    phone: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Roles", default)]
    roles: String,
    #[serde(rename = "Priority", default, deserialize_with = "empty_string_as_none")]
    priority: Option<String>,
    #[serde(rename = "Unavailable", default)]
    unavailable: String,
}

impl RosterRow {
    fn into_person(self) -> Result<Person, String> {
        let id = clean_cell(&self.person_id);
        if id.is_empty() {
            return Err("missing person id".to_string());
        }

        let status = parse_status(&self.status)?;
        let priority = match self.priority.as_deref() {
            Some(raw) => {
                let value = clean_cell(raw)
                    .parse::<i64>()
                    .map_err(|_| format!("priority '{raw}' is not a whole number"))?;
                value.clamp(i64::from(MIN_PRIORITY), i64::from(MAX_PRIORITY)) as u8
            }
            None => DEFAULT_PRIORITY,
        };

        let roles: BTreeSet<RoleId> = split_list(&self.roles).into_iter().map(RoleId).collect();
        let unavailable_on = split_list(&self.unavailable)
            .into_iter()
            .map(|raw| parse_date(&raw))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Person {
            id: PersonId(id),
            full_name: clean_cell(&self.full_name),
            phone: clean_cell(&self.phone),
            status,
            roles,
            priority,
            unavailable_on,
        })
    }
}

fn parse_status(value: &str) -> Result<MinistryStatus, String> {
    match normalize_keyword(value).as_str() {
        "active" => Ok(MinistryStatus::Active),
        "leader" => Ok(MinistryStatus::Leader),
        "inactive" => Ok(MinistryStatus::Inactive),
        "visitor" => Ok(MinistryStatus::Visitor),
        other => Err(format!("unknown status '{other}'")),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("unavailable date '{value}' is not YYYY-MM-DD ({err})"))
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
