// src/digest/table.rs

//! Record table.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::RunOutcome;

const HEADER: [&str; 7] = ["name", "title", "author", "link", "puzfile", "formatted", "problem"];

#[derive(Serialize)]
struct Row<'a> {
    name: &'a str,
    title: &'a str,
    author: &'a str,
    link: &'a str,
    puzfile: String,
    formatted: &'a str,
    problem: &'a str,
}

/// One row per record, after a header line that is written even when
/// there are no records.
pub fn render_csv(outcome: &RunOutcome) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for record in outcome.records() {
        writer.serialize(Row {
            name: &record.name,
            title: &record.title,
            author: &record.author,
            link: &record.link,
            puzfile: record.file_name(),
            formatted: record.display.as_deref().unwrap_or_default(),
            problem: record.error.as_deref().unwrap_or_default(),
        })?;
    }

    let bytes = writer.into_inner().map_err(|e| AppError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
