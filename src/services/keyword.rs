// src/services/keyword.rs

//! Keyword lookup through the external scraper.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Record, SourceConfig, Technique};
use crate::services::{FetchContext, Strategy};

/// Ask the external scraper for the puzzle named by the technique keyword.
pub struct KeywordLookup;

#[async_trait]
impl Strategy for KeywordLookup {
    fn name(&self) -> &'static str {
        "keyword lookup"
    }

    fn applies(&self, source: &SourceConfig) -> bool {
        matches!(source.technique, Technique::KeywordLookup(_))
    }

    async fn attempt(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        _today: NaiveDate,
    ) -> Result<Vec<Record>> {
        let Technique::KeywordLookup(keyword) = &source.technique else {
            return Ok(Vec::new());
        };

        log::info!("Looking up '{keyword}' for {}", source.name);
        let (puzzle, file_name) = ctx.scraper.fetch_by_keyword(keyword).await?;
        let path = puzzle.save(&ctx.storage, &file_name).await?;
        Ok(vec![Record::with_file(path)])
    }
}
