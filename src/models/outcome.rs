// src/models/outcome.rs

use serde::{Deserialize, Serialize};

use crate::models::Record;

/// One line of the daily digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum DigestLine {
    /// Start a new paragraph
    Break,
    Entry(Record),
}

/// Something worth mentioning in the summary message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub source: String,
    pub message: String,
}

impl Problem {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Everything a daily run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub lines: Vec<DigestLine>,
    pub problems: Vec<Problem>,
}

impl RunOutcome {
    /// Records in digest order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.lines.iter().filter_map(|line| match line {
            DigestLine::Entry(record) => Some(record),
            DigestLine::Break => None,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.records().count()
    }

    pub fn puzzle_count(&self) -> usize {
        self.records().filter(|r| r.is_fetched()).count()
    }
}
