//! Puzzle source descriptions and their publication schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One crossword outlet checked during the daily run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name (e.g., "Newsday")
    pub name: String,

    /// Outlet homepage
    #[serde(default)]
    pub homepage: String,

    /// Syndication feed announcing new puzzles
    #[serde(default)]
    pub feed: Option<String>,

    /// Sender address of puzzle newsletters
    #[serde(default)]
    pub email: Option<String>,

    /// Link to the puzzle file or page; may contain template tokens
    #[serde(default)]
    pub direct_link: Option<String>,

    /// Scheduled acquisition technique
    #[serde(default)]
    pub technique: Technique,

    /// Weekdays on which a puzzle is expected
    #[serde(default)]
    pub weekdays: Vec<Weekday>,

    /// Days of the month on which a puzzle is expected
    #[serde(default)]
    pub days_of_month: Vec<u32>,

    /// Bold template fragment overriding the default display template
    #[serde(default)]
    pub bold: Option<String>,

    /// Normal-weight template fragment following the bold one
    #[serde(default)]
    pub normal: Option<String>,

    /// Italic trailer
    #[serde(default)]
    pub italic: Option<String>,

    /// Start a new digest paragraph before this source
    #[serde(default)]
    pub paragraph_break: bool,
}

impl SourceConfig {
    pub fn feed_url(&self) -> Option<&str> {
        non_empty(&self.feed)
    }

    pub fn sender(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    pub fn direct_link(&self) -> Option<&str> {
        non_empty(&self.direct_link)
    }

    pub fn bold(&self) -> Option<&str> {
        non_empty(&self.bold)
    }

    pub fn normal(&self) -> Option<&str> {
        non_empty(&self.normal)
    }

    pub fn italic(&self) -> Option<&str> {
        non_empty(&self.italic)
    }

    /// Publication schedule derived from the weekday and day-of-month lists.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            weekdays: self.weekdays.clone(),
            days_of_month: self.days_of_month.clone(),
        }
    }

    /// Whether any display fragment references the homepage token.
    pub fn mentions_homepage(&self) -> bool {
        [self.bold(), self.normal(), self.italic()]
            .into_iter()
            .flatten()
            .any(|fragment| fragment.contains("%homepage"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Days on which a source is expected to publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub weekdays: Vec<Weekday>,
    pub days_of_month: Vec<u32>,
}

impl Schedule {
    /// A source is due when either the weekday or the day of month matches.
    pub fn is_due(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(&date.weekday()) || self.days_of_month.contains(&date.day())
    }
}

/// Scheduled technique used when no discovery channel produced anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Technique {
    /// Hand a keyword to the external scraper
    KeywordLookup(String),
    /// Download the direct link
    DirectDownload,
    /// Scrape the direct link (or homepage) for puzzle links
    PageScrape,
    #[default]
    None,
}

impl FromStr for Technique {
    type Err = AppError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let tag = tag.trim();
        let mut words = tag.split_whitespace();
        let head = words.next().unwrap_or("").to_lowercase();

        if head == "keyword" || head.contains("xword-dl") {
            return words
                .next()
                .map(|arg| Technique::KeywordLookup(arg.to_string()))
                .ok_or_else(|| {
                    AppError::config(format!("technique '{tag}' is missing its keyword"))
                });
        }

        match head.as_str() {
            "" | "none" => Ok(Technique::None),
            h if h.contains("direct") => Ok(Technique::DirectDownload),
            h if h.contains("page") => Ok(Technique::PageScrape),
            _ => Err(AppError::config(format!("unknown technique '{tag}'"))),
        }
    }
}

impl TryFrom<String> for Technique {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Technique> for String {
    fn from(value: Technique) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Technique::KeywordLookup(arg) => write!(f, "keyword {arg}"),
            Technique::DirectDownload => f.write_str("direct"),
            Technique::PageScrape => f.write_str("page"),
            Technique::None => f.write_str("none"),
        }
    }
}
