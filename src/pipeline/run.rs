// src/pipeline/run.rs

//! Daily run over every configured source.

use std::time::Duration;

use chrono::NaiveDate;

use crate::models::{
    Config, DigestLine, NormalizeConfig, Problem, Record, RunOutcome, SourceConfig,
};
use crate::pipeline::{Cascade, Normalizer};
use crate::services::FetchContext;
use crate::utils::log;

pub const HOMEPAGE_PROBLEM: &str = "No homepage specified: link likely broken";

/// Drives the cascade and normalizer source by source.
pub struct Runner {
    ctx: FetchContext,
    cascade: Cascade,
    normalize: NormalizeConfig,
    source_timeout: Duration,
    source_delay: Duration,
}

impl Runner {
    pub fn new(ctx: FetchContext, config: &Config) -> Self {
        Self {
            ctx,
            cascade: Cascade::default(),
            normalize: config.normalize.clone(),
            source_timeout: config.http.source_timeout(),
            source_delay: config.http.source_delay(),
        }
    }

    pub fn with_cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = cascade;
        self
    }

    /// Cascade plus normalization for a single source.
    pub async fn check_source(&self, source: &SourceConfig, today: NaiveDate) -> Vec<Record> {
        let acquisition = self.cascade.acquire(&self.ctx, source, today).await;
        let normalizer = Normalizer::new(&self.normalize, today);

        acquisition
            .records
            .into_iter()
            .map(|mut record| {
                normalizer.normalize(&mut record, source, acquisition.error.as_deref());
                record
            })
            .collect()
    }

    /// Check every source in order.
    ///
    /// A source that overruns its deadline is reported as a problem and
    /// the run moves on. Every record carrying an error is reported too.
    pub async fn run(&self, sources: &[SourceConfig], today: NaiveDate) -> RunOutcome {
        log::header(&format!("Checking {} sources for {}", sources.len(), today));

        let mut outcome = RunOutcome::default();
        for (index, source) in sources.iter().enumerate() {
            if index > 0 && !self.source_delay.is_zero() {
                tokio::time::sleep(self.source_delay).await;
            }
            log::step(index + 1, sources.len(), &format!("checking {}", source.name));

            if source.paragraph_break {
                outcome.lines.push(DigestLine::Break);
            }

            match tokio::time::timeout(self.source_timeout, self.check_source(source, today)).await
            {
                Ok(records) => {
                    for record in &records {
                        log::sub_item(&format!(
                            "{} {}",
                            if record.is_fetched() { "fetched" } else { "unfetched" },
                            record.file_name()
                        ));
                    }
                    outcome
                        .lines
                        .extend(records.into_iter().map(DigestLine::Entry));
                }
                Err(_) => {
                    log::warn(&format!("{} timed out", source.name));
                    outcome.problems.push(Problem::new(
                        &source.name,
                        format!("gave up after {}s", self.source_timeout.as_secs()),
                    ));
                }
            }

            if source.mentions_homepage() && source.homepage.trim().is_empty() {
                outcome
                    .problems
                    .push(Problem::new(&source.name, HOMEPAGE_PROBLEM));
            }
        }

        let record_problems: Vec<Problem> = outcome
            .records()
            .filter_map(|record| {
                record
                    .error
                    .as_ref()
                    .map(|error| Problem::new(&record.name, error.clone()))
            })
            .collect();
        outcome.problems.extend(record_problems);

        log::summary(
            "Run complete",
            &[
                ("Entries", outcome.entry_count().to_string()),
                ("Puzzles", outcome.puzzle_count().to_string()),
                ("Problems", outcome.problems.len().to_string()),
            ],
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Weekday;

    use super::*;
    use crate::error::Result;
    use crate::formats::puz::fixtures::puz_bytes;
    use crate::models::Technique;
    use crate::services::external::testing::StubScraper;
    use crate::services::testing::context;
    use crate::services::{DirectDownload, Strategy};
    use crate::utils::http::testing::StubFetcher;

    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.http.source_delay_ms = 0;
        config
    }

    fn direct(name: &str, link: &str) -> SourceConfig {
        SourceConfig {
            name: name.into(),
            homepage: "https://example.com".into(),
            direct_link: Some(link.into()),
            technique: Technique::DirectDownload,
            weekdays: vec![Weekday::Sun],
            ..SourceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_collects_lines_and_problems() {
        let fetcher = StubFetcher::new()
            .body("https://example.com/good.puz", puz_bytes("Good One", "By Ann"))
            .body("https://example.com/bad.puz", "<html>gone</html>");
        let (ctx, _tmp) = context(fetcher, StubScraper::new());
        let runner = Runner::new(ctx, &config());

        let sources = vec![
            direct("Good", "https://example.com/good.puz"),
            direct("Bad", "https://example.com/bad.puz"),
            SourceConfig {
                name: "No Home".into(),
                normal: Some("see %homepage".into()),
                paragraph_break: true,
                ..SourceConfig::default()
            },
        ];

        let outcome = runner.run(&sources, sunday()).await;

        assert_eq!(outcome.entry_count(), 2);
        assert_eq!(outcome.puzzle_count(), 1);
        assert_eq!(outcome.lines.last(), Some(&DigestLine::Break));

        let good = outcome.records().next().unwrap();
        assert_eq!(good.title, "Good One");
        assert_eq!(good.author, "Ann");

        assert_eq!(outcome.problems.len(), 2);
        assert_eq!(outcome.problems[0], Problem::new("No Home", HOMEPAGE_PROBLEM));
        assert_eq!(outcome.problems[1].source, "Bad");
        assert!(outcome.problems[1].message.contains("malformed"));
    }

    struct Stalls;

    #[async_trait]
    impl Strategy for Stalls {
        fn name(&self) -> &'static str {
            "stalls"
        }

        fn applies(&self, _source: &SourceConfig) -> bool {
            true
        }

        async fn attempt(
            &self,
            _ctx: &FetchContext,
            _source: &SourceConfig,
            _today: NaiveDate,
        ) -> Result<Vec<Record>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_slow_source_becomes_problem() {
        let fetcher = StubFetcher::new().body("https://example.com/good.puz", puz_bytes("T", "A"));
        let (ctx, _tmp) = context(fetcher, StubScraper::new());
        let mut config = config();
        config.http.source_timeout_secs = 1;
        let runner = Runner::new(ctx, &config).with_cascade(Cascade::new(
            vec![Box::new(Stalls)],
            vec![Box::new(DirectDownload)],
        ));

        let sources = vec![SourceConfig {
            name: "Slow".into(),
            ..SourceConfig::default()
        }];
        let outcome = runner.run(&sources, sunday()).await;

        assert_eq!(outcome.entry_count(), 0);
        assert_eq!(outcome.problems.len(), 1);
        assert_eq!(outcome.problems[0].source, "Slow");
        assert_eq!(outcome.problems[0].message, "gave up after 1s");
    }
}
