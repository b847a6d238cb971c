//! One persisted row per completed intake.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::intake::model::Identity;
use crate::intake::script::ANSWER_COLUMNS;

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const NAME_COLUMN: &str = "Name";
pub const EMAIL_COLUMN: &str = "Email";
pub const UUID_COLUMN: &str = "UUID";

/// A completed intake ready to be written to the response store.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    /// Answers in script order.
    pub answers: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub identity: Option<Identity>,
    pub id: Uuid,
}

impl ResponseRecord {
    /// Stamp `answers` with the current time and a fresh v4 id.
    pub fn new(answers: Vec<String>, identity: Option<Identity>) -> Self {
        Self {
            answers,
            timestamp: Utc::now(),
            identity,
            id: Uuid::new_v4(),
        }
    }

    /// Cells in column order: answers, `Timestamp`, `Name`/`Email` when an
    /// identity was supplied, then `UUID`.
    ///
    /// Answers are zipped positionally against the answer columns.
    pub fn cells(&self) -> Vec<(String, String)> {
        let mut cells: Vec<(String, String)> = ANSWER_COLUMNS
            .iter()
            .zip(&self.answers)
            .map(|(column, answer)| (column.to_string(), answer.clone()))
            .collect();

        cells.push((
            TIMESTAMP_COLUMN.to_string(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        ));

        if let Some(ref identity) = self.identity {
            cells.push((
                NAME_COLUMN.to_string(),
                identity.name.clone().unwrap_or_default(),
            ));
            cells.push((
                EMAIL_COLUMN.to_string(),
                identity.email.clone().unwrap_or_default(),
            ));
        }

        cells.push((UUID_COLUMN.to_string(), self.id.to_string()));
        cells
    }
}
