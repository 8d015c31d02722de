// src/pipeline/daily.rs

//! Wiring a configuration into a full daily run.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::digest::{self, Published};
use crate::error::Result;
use crate::models::Config;
use crate::pipeline::Runner;
use crate::services::{FetchContext, PuzzleScraper, external};
use crate::storage::LocalStorage;
use crate::utils::http::{Fetcher, HttpClient};

/// Build the live collaborators for `today`: HTTP client, scraper,
/// mailbox (when configured) and the day's working directory.
pub fn build_context(config: &Config, today: NaiveDate) -> Result<FetchContext> {
    let storage = LocalStorage::for_day(&config.output.dir, today)?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new(&config.http)?);
    let scraper: Arc<dyn PuzzleScraper> = Arc::from(external::from_config(&config.scraper));

    let ctx = FetchContext::new(fetcher, scraper, storage).configured(config);
    Ok(attach_mailbox(ctx, config))
}

#[cfg(feature = "imap")]
fn attach_mailbox(ctx: FetchContext, config: &Config) -> FetchContext {
    use crate::services::mailbox::ImapMailbox;

    let Some(mail) = &config.mail else {
        return ctx;
    };
    match ImapMailbox::connect(mail) {
        Ok(mailbox) => ctx.with_mailbox(Arc::new(mailbox)),
        Err(e) => {
            log::warn!("Mailbox unavailable: {e}");
            ctx
        }
    }
}

#[cfg(not(feature = "imap"))]
fn attach_mailbox(ctx: FetchContext, config: &Config) -> FetchContext {
    if config.mail.is_some() {
        log::warn!("[mail] is configured but this build has no IMAP support");
    }
    ctx
}

/// Check every source, then publish the digest into the context's
/// working directory.
pub async fn run_daily(ctx: FetchContext, config: &Config, today: NaiveDate) -> Result<Published> {
    let storage = ctx.storage.clone();
    let runner = Runner::new(ctx, config);
    let outcome = runner.run(&config.sources, today).await;
    digest::publish(&outcome, config, &storage, today).await
}
