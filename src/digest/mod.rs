// src/digest/mod.rs

//! Digest outputs for a finished run.
//!
//! Everything is written into the day's working directory; the directory
//! is then optionally zipped next to itself.

pub mod html;
pub mod message;
pub mod table;

use std::fmt::Write;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Config, RunOutcome};
use crate::storage::{LocalStorage, day_stamp};

pub use html::render_html;
pub use message::{subject, summary_message};
pub use table::render_csv;

pub const PAGE_FILE: &str = "index.html";
pub const RECORDS_FILE: &str = "records.json";
pub const MESSAGE_FILE: &str = "message.txt";

/// What a publish produced.
#[derive(Debug, Clone)]
pub struct Published {
    pub subject: String,
    pub message: String,
    pub page: PathBuf,
    pub archive: Option<PathBuf>,
}

/// Format a date with a strftime pattern, falling back to the raw
/// pattern when it contains an invalid specifier.
pub(crate) fn format_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        log::warn!("Invalid date pattern: {pattern}");
        return pattern.to_string();
    }
    out
}

/// Write the page, table, snapshot and message, then archive the day.
pub async fn publish(
    outcome: &RunOutcome,
    config: &Config,
    storage: &LocalStorage,
    today: NaiveDate,
) -> Result<Published> {
    let stamp = day_stamp(today);

    let page = storage
        .write_text(PAGE_FILE, &render_html(outcome, &config.digest, today))
        .await?;
    storage
        .write_text(&format!("{stamp}.csv"), &render_csv(outcome)?)
        .await?;
    storage.write_json(RECORDS_FILE, outcome).await?;

    let subject = subject(&config.digest, today);
    let message = summary_message(outcome, &config.digest, today);
    storage.write_text(MESSAGE_FILE, &message).await?;

    let archive = if config.output.archive {
        let dest = storage
            .root()
            .parent()
            .map(|parent| parent.join(format!("{stamp}.zip")))
            .unwrap_or_else(|| PathBuf::from(format!("{stamp}.zip")));
        Some(storage.archive(dest)?)
    } else {
        None
    };

    Ok(Published {
        subject,
        message,
        page,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use zip::ZipArchive;

    use super::*;
    use crate::models::{DigestLine, Problem, Record};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_format_date_falls_back() {
        assert_eq!(format_date(day(), "%Y-%m-%d"), "2026-10-18");
        assert_eq!(format_date(day(), "bad %Q"), "bad %Q");
    }

    #[tokio::test]
    async fn test_publish_writes_outputs_and_archive() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::for_day(tmp.path(), day()).unwrap();
        let puzzle = storage.save_puzzle("a.puz", b"puz").await.unwrap();

        let mut config = Config::default();
        config.digest.message = "{puzcount}/{entrycount}".into();
        let outcome = RunOutcome {
            lines: vec![DigestLine::Entry(Record {
                name: "Example".into(),
                display: Some("Example".into()),
                ..Record::with_file(puzzle)
            })],
            problems: vec![Problem::new("Other", "feed down")],
        };

        let published = publish(&outcome, &config, &storage, day()).await.unwrap();

        assert!(published.message.starts_with("1/1"));
        assert!(published.message.contains("- Other: feed down"));
        assert_eq!(published.page, storage.path(PAGE_FILE));
        for file in [PAGE_FILE, "20261018.csv", RECORDS_FILE, MESSAGE_FILE] {
            assert!(storage.path(file).is_file(), "{file} missing");
        }

        let snapshot: RunOutcome =
            serde_json::from_slice(&std::fs::read(storage.path(RECORDS_FILE)).unwrap()).unwrap();
        assert_eq!(snapshot, outcome);

        let archive = published.archive.unwrap();
        assert_eq!(archive, tmp.path().join("20261018.zip"));
        let zip = ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert!(names.contains(&"20261018/a.puz"));
        assert!(names.contains(&"20261018/index.html"));
    }

    #[tokio::test]
    async fn test_publish_without_archive() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::for_day(tmp.path(), day()).unwrap();
        let mut config = Config::default();
        config.output.archive = false;

        let published = publish(&RunOutcome::default(), &config, &storage, day())
            .await
            .unwrap();
        assert!(published.archive.is_none());
        assert!(!tmp.path().join("20261018.zip").exists());
    }
}
