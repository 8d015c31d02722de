// src/pipeline/cascade.rs

//! Per-source acquisition cascade.
//!
//! Discovery channels (feed, mailbox) run whenever they are configured.
//! The single scheduled technique runs only when discovery produced
//! nothing and the source is due today.

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{Record, SourceConfig};
use crate::services::{
    DirectDownload, FeedDiscovery, FetchContext, KeywordLookup, MailboxScan, PageScrape, Strategy,
};

/// Records found for one source plus the errors met along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acquisition {
    pub records: Vec<Record>,
    /// Newline-joined strategy errors, to be attached to every record
    pub error: Option<String>,
}

/// Ordered strategy lists.
pub struct Cascade {
    discovery: Vec<Box<dyn Strategy>>,
    scheduled: Vec<Box<dyn Strategy>>,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new(
            vec![Box::new(FeedDiscovery), Box::new(MailboxScan)],
            vec![
                Box::new(KeywordLookup),
                Box::new(DirectDownload),
                Box::new(PageScrape),
            ],
        )
    }
}

impl Cascade {
    pub fn new(discovery: Vec<Box<dyn Strategy>>, scheduled: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            discovery,
            scheduled,
        }
    }

    /// Run the cascade for one source.
    ///
    /// Strategy failures never escape; they are collected into
    /// `Acquisition::error`. A due source always yields at least one
    /// record, and so does a source whose discovery failed.
    pub async fn acquire(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Acquisition {
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for strategy in self.discovery.iter().filter(|s| s.applies(source)) {
            match strategy.attempt(ctx, source, today).await {
                Ok(found) => {
                    log::debug!(
                        "{} found {} records for {}",
                        strategy.name(),
                        found.len(),
                        source.name
                    );
                    records.extend(found);
                }
                Err(e) => {
                    log::warn!("{} failed for {}: {}", strategy.name(), source.name, e);
                    errors.push(e.to_string());
                }
            }
        }

        if records.is_empty() && source.schedule().is_due(today) {
            let mut record = Record::default();
            match self.scheduled.iter().find(|s| s.applies(source)) {
                Some(strategy) => match strategy.attempt(ctx, source, today).await {
                    Ok(found) if found.is_empty() => {
                        log::warn!("{} found nothing for {}", strategy.name(), source.name);
                        errors.push(AppError::NoPuzzleFound(source.name.clone()).to_string());
                    }
                    Ok(found) => record = found.into_iter().next().unwrap_or_default(),
                    Err(e) => {
                        log::warn!("{} failed for {}: {}", strategy.name(), source.name, e);
                        errors.push(e.to_string());
                    }
                },
                None => log::debug!("{} is due but has no technique", source.name),
            }
            records.push(record);
        }

        let error = (!errors.is_empty()).then(|| errors.join("\n"));
        if records.is_empty() && error.is_some() {
            records.push(Record::default());
        }

        for record in &mut records {
            apply_defaults(record, source);
        }

        Acquisition { records, error }
    }
}

/// Fill source-level fields a strategy left empty.
fn apply_defaults(record: &mut Record, source: &SourceConfig) {
    if record.name.is_empty() {
        record.name = source.name.clone();
    }
    record.homepage = source.homepage.clone();
    if record.link.is_empty() {
        record.link = source.direct_link().unwrap_or_default().to_string();
    }
}
