//! CSV import for organization rosters.
//!
//! Expected headers: `Person ID, Full Name, Phone, Status, Roles, Priority,
//! Unavailable`. Roles and unavailable dates are `;`-separated.

mod normalizer;
mod parser;

use crate::workflows::assignment::domain::{Person, PersonId};
use parser::ParsedRow;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, reason: String },
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::InvalidRow { line, reason } => {
                write!(f, "roster line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Person>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses every row; the first occurrence of a person id wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Person>, RosterImportError> {
        let mut seen: HashSet<PersonId> = HashSet::new();
        let mut people = Vec::new();

        for row in parser::parse_rows(reader)? {
            match row {
                ParsedRow::Person(person) => {
                    if seen.insert(person.id.clone()) {
                        people.push(person);
                    } else {
                        debug!(person = %person.id, "skipping duplicate roster row");
                    }
                }
                ParsedRow::Invalid { line, reason } => {
                    return Err(RosterImportError::InvalidRow { line, reason });
                }
            }
        }

        Ok(people)
    }
}
