// src/services/page.rs

//! Page scrape.
//!
//! Finds puzzle links on an HTML page and downloads the first one that
//! works, falling back to the external scraper.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Record, SourceConfig, Technique};
use crate::services::{FetchContext, Strategy, download_puzzle};
use crate::utils::render;
use crate::utils::url::{get_domain, resolve, segment_after};

/// Link text that announces a puzzle download.
const LINK_PHRASES: [&str; 5] = [".puz", "acrosslite", "across lite", "puz file", "jpz"];

/// Across Lite's vendor site, linked from many puzzle pages.
const DECOY_DOMAIN: &str = "litsoft.com";

const CROSSHARE_PAGE: &str = "crosshare.org/crosswords";
const CROSSHARE_EMBED: &str = "crosshare.org/embed";
const CROSSHARE_API: &str = "https://crosshare.org/api/puz/";

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn is_decoy(link: &str) -> bool {
    get_domain(link).is_some_and(|domain| {
        domain == DECOY_DOMAIN || domain.ends_with(&format!(".{DECOY_DOMAIN}"))
    })
}

/// Puzzle download candidates on a page, most promising first.
///
/// Crosshare puzzles (the page itself or an embedded iframe) are turned
/// into API URLs and put ahead of the anchors found on the page.
pub fn candidate_links(page_url: &str, html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let anchors = parse_selector("a[href]")?;
    let iframes = parse_selector("iframe[src]")?;

    let mut candidates: Vec<String> = document
        .select(&anchors)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }

            let href_lower = href.to_lowercase();
            let text = anchor.text().collect::<String>().to_lowercase();
            let text = text.trim();
            let is_puzzle = href_lower.contains(".puz")
                || href_lower.contains(".jpz")
                || LINK_PHRASES.iter().any(|p| text.contains(p))
                || text == "puz";

            let link = resolve(page_url, href).unwrap_or_else(|| href.to_string());
            (is_puzzle && !is_decoy(&link)).then_some(link)
        })
        .collect();

    if page_url.contains(CROSSHARE_PAGE) {
        if let Some(id) = segment_after(page_url, "crosswords") {
            candidates.insert(0, format!("{CROSSHARE_API}{id}"));
        }
    }

    for iframe in document.select(&iframes) {
        let src = iframe.value().attr("src").unwrap_or_default();
        if !src.contains(CROSSHARE_EMBED) {
            continue;
        }
        if let Some(id) = segment_after(src, "embed") {
            candidates.insert(0, format!("{CROSSHARE_API}{id}"));
        }
    }

    Ok(candidates)
}

/// Scrape `link` for a puzzle file.
///
/// Each candidate is downloaded in turn; when none yields a puzzle the
/// external scraper gets the page URL. `None` means nothing was found.
pub async fn scrape_page(ctx: &FetchContext, link: &str) -> Result<Option<PathBuf>> {
    let page = ctx.fetcher.get(link).await?;
    let candidates = candidate_links(link, &page.text())?;
    log::debug!("{} candidate links on {}", candidates.len(), link);

    for candidate in &candidates {
        match download_puzzle(ctx, candidate).await {
            Ok(Some(path)) => return Ok(Some(path)),
            Ok(None) => {}
            Err(e) => log::debug!("Candidate {candidate} failed: {e}"),
        }
    }

    log::info!("Attempting external scrape of {link}");
    match ctx.scraper.fetch_by_url(link).await {
        Ok((puzzle, file_name)) => {
            let path = puzzle.save(&ctx.storage, &file_name).await?;
            Ok(Some(path))
        }
        Err(e) => {
            log::info!("No puzzle found at {link}: {e}");
            Ok(None)
        }
    }
}

/// Scrape the source's direct link (rendered for today) or its homepage.
pub struct PageScrape;

#[async_trait]
impl Strategy for PageScrape {
    fn name(&self) -> &'static str {
        "page scrape"
    }

    fn applies(&self, source: &SourceConfig) -> bool {
        source.technique == Technique::PageScrape
    }

    async fn attempt(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Result<Vec<Record>> {
        let link = source
            .direct_link()
            .map(|template| render(template, &Record::default(), today))
            .filter(|link| !link.trim().is_empty())
            .or_else(|| {
                let homepage = source.homepage.trim();
                (!homepage.is_empty()).then(|| homepage.to_string())
            })
            .ok_or_else(|| {
                AppError::config(format!("{} has no direct link or homepage", source.name))
            })?;

        log::info!("Scraping {link}");
        Ok(scrape_page(ctx, &link)
            .await?
            .map(Record::with_file)
            .into_iter()
            .collect())
    }
}
