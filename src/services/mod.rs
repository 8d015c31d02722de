//! Fetch strategies.
//!
//! Each strategy turns a source into zero or more records:
//! - Feed discovery (`FeedDiscovery`)
//! - Mailbox scan (`MailboxScan`)
//! - Direct download (`DirectDownload`)
//! - Page scrape (`PageScrape`)
//! - Keyword lookup (`KeywordLookup`)

pub mod download;
pub mod external;
pub mod feed;
pub mod keyword;
pub mod mailbox;
pub mod page;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::Result;
use crate::models::{Config, Record, SourceConfig};
use crate::storage::LocalStorage;
use crate::utils::http::{Fetcher, RetryPolicy};

pub use download::{DirectDownload, download_puzzle};
pub use external::{CommandScraper, DisabledScraper, PuzzleScraper, ScrapedPuzzle};
pub use feed::{Feed, FeedDiscovery, FeedEntry, parse_feed};
pub use keyword::KeywordLookup;
pub use mailbox::{Mailbox, MailboxScan};
pub use page::{PageScrape, candidate_links, scrape_page};

/// Collaborators shared by every strategy during one run.
#[derive(Clone)]
pub struct FetchContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub scraper: Arc<dyn PuzzleScraper>,
    pub mailbox: Option<Arc<dyn Mailbox>>,
    pub storage: LocalStorage,
    pub retry: RetryPolicy,
    /// How far back a feed entry may be dated
    pub feed_window: TimeDelta,
    /// Reference instant for the feed window
    pub now: DateTime<Utc>,
}

impl FetchContext {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        scraper: Arc<dyn PuzzleScraper>,
        storage: LocalStorage,
    ) -> Self {
        Self {
            fetcher,
            scraper,
            mailbox: None,
            storage,
            retry: RetryPolicy::default(),
            feed_window: TimeDelta::seconds(86_400 + 120),
            now: Utc::now(),
        }
    }

    /// Apply the HTTP settings of a configuration.
    pub fn configured(mut self, config: &Config) -> Self {
        self.retry = RetryPolicy::from_config(&config.http);
        self.feed_window =
            TimeDelta::seconds(i64::try_from(config.http.feed_window_secs).unwrap_or(i64::MAX));
        self
    }

    pub fn with_mailbox(mut self, mailbox: Arc<dyn Mailbox>) -> Self {
        self.mailbox = Some(mailbox);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// One way of acquiring a source's puzzle.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy has what it needs in the source description.
    fn applies(&self, source: &SourceConfig) -> bool;

    async fn attempt(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Result<Vec<Record>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::external::testing::StubScraper;
    use super::*;
    use crate::utils::http::testing::StubFetcher;

    /// A context over stubs, saving into a fresh temporary directory.
    pub fn context(fetcher: StubFetcher, scraper: StubScraper) -> (FetchContext, TempDir) {
        shared_context(Arc::new(fetcher), Arc::new(scraper))
    }

    /// Like `context`, keeping handles on the stubs for call inspection.
    pub fn shared_context(
        fetcher: Arc<StubFetcher>,
        scraper: Arc<StubScraper>,
    ) -> (FetchContext, TempDir) {
        let tmp = TempDir::new().unwrap();
        let ctx = FetchContext::new(fetcher, scraper, LocalStorage::new(tmp.path())).with_retry(
            RetryPolicy {
                max_attempts: 3,
                base_delay: std::time::Duration::ZERO,
            },
        );
        (ctx, tmp)
    }
}
