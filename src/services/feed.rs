// src/services/feed.rs

//! Feed discovery.
//!
//! Reads RSS 2.0, RSS 1.0 (RDF) and Atom feeds. Each entry published
//! inside the freshness window becomes one record, with its link scraped
//! for a puzzle file.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AppError, Result};
use crate::models::{Record, SourceConfig};
use crate::services::{FetchContext, Strategy, scrape_page};
use crate::utils::http::get_with_retry;
use crate::utils::url::{cache_bust, strip_tracking};

const FEED_ROOTS: [&str; 3] = ["rss", "RDF", "feed"];
const ENTRY_TAGS: [&str; 2] = ["item", "entry"];

/// A parsed syndication feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct EntryBuilder {
    title: String,
    link: String,
    published: Option<String>,
    updated: Option<String>,
}

impl EntryBuilder {
    /// `field` is the qualified element name. Title and link come only
    /// from unprefixed (or `atom:`) elements; dates may be namespaced.
    fn text(&mut self, field: &str, value: &str) {
        let (plain, local) = split_name(field);
        match local {
            "title" if plain => self.title.push_str(value),
            "link" if plain && self.link.is_empty() => self.link = value.trim().to_string(),
            "pubDate" | "date" | "published" | "issued" => {
                self.published.get_or_insert_with(|| value.trim().to_string());
            }
            "updated" | "modified" => {
                self.updated.get_or_insert_with(|| value.trim().to_string());
            }
            _ => {}
        }
    }

    /// Atom links carry the URL in `href`; the alternate link wins.
    fn link_element(&mut self, element: &BytesStart<'_>) {
        let attr = |name: &str| {
            element
                .try_get_attribute(name)
                .ok()
                .flatten()
                .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
        };
        let Some(href) = attr("href") else {
            return;
        };
        let rel = attr("rel");
        if rel.as_deref().is_none_or(|r| r == "alternate")
            && (self.link.is_empty() || rel.is_some())
        {
            self.link = href.trim().to_string();
        }
    }

    fn build(self) -> FeedEntry {
        let published = [self.published.as_deref(), self.updated.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|value| {
                let date = parse_date(value);
                if date.is_none() {
                    log::debug!("Unparsed date '{value}' on feed entry '{}'", self.title.trim());
                }
                date
            });
        FeedEntry {
            title: self.title.trim().to_string(),
            link: self.link,
            published,
        }
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

fn qualified_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

/// Whether the name is unprefixed (or Atom-prefixed), and its local part.
fn split_name(qname: &str) -> (bool, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix == "atom", local),
        None => (true, qname),
    }
}

/// Parse a feed document.
///
/// Fails with `FeedUnavailable` when the body is empty, is not XML, or
/// is XML of some other kind.
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::feed("feed appears to be empty"));
    }

    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut root: Option<String> = None;
    let mut feed = Feed::default();
    let mut current: Option<EntryBuilder> = None;
    let mut entry_depth = 0;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::feed(format!("feed appears to be invalid: {e}")))?;

        match event {
            Event::Start(e) => {
                let qname = qualified_name(&e);
                let (plain, local) = split_name(&qname);
                root.get_or_insert_with(|| local.to_string());

                if current.is_none() && ENTRY_TAGS.contains(&local) {
                    current = Some(EntryBuilder::default());
                    entry_depth = path.len() + 1;
                } else if let Some(entry) = current.as_mut() {
                    if plain && local == "link" && path.len() == entry_depth {
                        entry.link_element(&e);
                    }
                }
                path.push(qname);
            }
            Event::Empty(e) => {
                let qname = qualified_name(&e);
                let (plain, local) = split_name(&qname);
                root.get_or_insert_with(|| local.to_string());
                if let Some(entry) = current.as_mut() {
                    if plain && local == "link" && path.len() == entry_depth {
                        entry.link_element(&e);
                    }
                }
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                take_text(&path, &value, &mut current, entry_depth, &mut feed);
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                take_text(&path, &value, &mut current, entry_depth, &mut feed);
            }
            Event::End(_) => {
                if path.len() == entry_depth {
                    if let Some(entry) = current.take() {
                        feed.entries.push(entry.build());
                    }
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match root.as_deref() {
        Some(r) if FEED_ROOTS.contains(&r) => {}
        Some(r) => {
            return Err(AppError::feed(format!(
                "feed appears to be invalid: unexpected root <{r}>"
            )));
        }
        None => return Err(AppError::feed("feed appears to be empty")),
    }
    if !path.is_empty() {
        return Err(AppError::feed("feed appears to be invalid: truncated document"));
    }

    feed.title = feed.title.trim().to_string();
    Ok(feed)
}

fn take_text(
    path: &[String],
    value: &str,
    current: &mut Option<EntryBuilder>,
    entry_depth: usize,
    feed: &mut Feed,
) {
    if let Some(entry) = current.as_mut() {
        if path.len() == entry_depth + 1 {
            if let Some(field) = path.last() {
                entry.text(field, value);
            }
        }
        return;
    }

    let names: Vec<(bool, &str)> = path.iter().map(|q| split_name(q)).collect();
    let is_feed_title = match names.as_slice() {
        [_, (_, "channel"), (true, "title")] => true,
        [(_, "feed"), (true, "title")] => true,
        _ => false,
    };
    if is_feed_title {
        feed.title.push_str(value);
    }
}

/// Cache-busting token in 100..1000 taken from the clock.
fn cache_token(now: DateTime<Utc>) -> u32 {
    now.timestamp_subsec_millis() % 900 + 100
}

/// Fresh feed entries, each scraped for a puzzle.
pub struct FeedDiscovery;

#[async_trait]
impl Strategy for FeedDiscovery {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn applies(&self, source: &SourceConfig) -> bool {
        source.feed_url().is_some()
    }

    async fn attempt(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        _today: NaiveDate,
    ) -> Result<Vec<Record>> {
        let Some(feed_url) = source.feed_url() else {
            return Ok(Vec::new());
        };

        let url = cache_bust(feed_url, cache_token(ctx.now));
        let response = get_with_retry(ctx.fetcher.as_ref(), &url, &ctx.retry).await?;
        let feed = parse_feed(&response.body)?;

        let cutoff = ctx.now - ctx.feed_window;
        let name = if source.name.trim().is_empty() {
            feed.title.clone()
        } else {
            source.name.clone()
        };

        let mut records = Vec::new();
        for entry in &feed.entries {
            if !entry.published.is_some_and(|p| p >= cutoff) {
                continue;
            }
            if entry.link.is_empty() {
                log::warn!("Feed entry '{}' in {feed_url} has no link", entry.title);
                continue;
            }

            let resolved = ctx.fetcher.resolve(&entry.link).await.unwrap_or_else(|e| {
                log::warn!("Could not follow {}: {e}", entry.link);
                entry.link.clone()
            });
            let link = strip_tracking(&resolved).to_string();
            log::info!("{}: {}", entry.title, link);

            let mut record = Record {
                name: name.clone(),
                link: link.clone(),
                page_title: entry.title.clone(),
                title: entry.title.clone(),
                ..Record::default()
            };
            match scrape_page(ctx, &link).await {
                Ok(path) => record.puzzle_file = path,
                Err(e) => record.push_error(e.to_string()),
            }
            records.push(record);
        }

        log::debug!(
            "{} of {} entries in {feed_url} are fresh",
            records.len(),
            feed.entries.len()
        );
        Ok(records)
    }
}
