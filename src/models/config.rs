//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Mailbox used for newsletter-delivered puzzles
    #[serde(default)]
    pub mail: Option<MailConfig>,

    /// External puzzle scraper
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Where the day's files go
    #[serde(default)]
    pub output: OutputConfig,

    /// Record normalization rules
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Digest page and summary message
    #[serde(default)]
    pub digest: DigestConfig,

    /// Puzzle sources, in digest order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.source_timeout_secs == 0 {
            return Err(AppError::validation(
                "http.source_timeout_secs must be > 0",
            ));
        }
        if self.http.feed_retries == 0 {
            return Err(AppError::validation("http.feed_retries must be > 0"));
        }
        if let Some(mail) = &self.mail {
            if mail.server.trim().is_empty() || mail.username.trim().is_empty() {
                return Err(AppError::validation(
                    "mail.server and mail.username are required",
                ));
            }
        }
        for (index, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "source #{} has no name",
                    index + 1
                )));
            }
            if let Some(day) = source.days_of_month.iter().find(|d| !(1..=31).contains(*d)) {
                return Err(AppError::validation(format!(
                    "source '{}' has invalid day of month {}",
                    source.name, day
                )));
            }
        }
        for reminder in &self.digest.reminders {
            if let Some(day) = reminder.days_of_month.iter().find(|d| !(1..=31).contains(*d)) {
                return Err(AppError::validation(format!(
                    "reminder '{}' has invalid day of month {}",
                    reminder.text, day
                )));
            }
        }
        Ok(())
    }

    /// Find a source by case-insensitive name.
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// HTTP client and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Deadline for one source's whole cascade
    #[serde(default = "defaults::source_timeout")]
    pub source_timeout_secs: u64,

    /// Delay between sources in milliseconds
    #[serde(default = "defaults::source_delay")]
    pub source_delay_ms: u64,

    /// Attempts for a feed fetch before giving up
    #[serde(default = "defaults::feed_retries")]
    pub feed_retries: u32,

    /// Base delay of the feed retry backoff
    #[serde(default = "defaults::feed_backoff")]
    pub feed_backoff_ms: u64,

    /// How old a feed entry may be and still count as today's
    #[serde(default = "defaults::feed_window")]
    pub feed_window_secs: u64,
}

impl HttpConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn source_delay(&self) -> Duration {
        Duration::from_millis(self.source_delay_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            source_timeout_secs: defaults::source_timeout(),
            source_delay_ms: defaults::source_delay(),
            feed_retries: defaults::feed_retries(),
            feed_backoff_ms: defaults::feed_backoff(),
            feed_window_secs: defaults::feed_window(),
        }
    }
}

/// IMAP mailbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub server: String,

    #[serde(default = "defaults::imap_port")]
    pub port: u16,

    pub username: String,

    /// Environment variable holding the password
    #[serde(default = "defaults::password_env")]
    pub password_env: String,

    #[serde(default = "defaults::folder")]
    pub folder: String,
}

/// External scrape-by-keyword/URL program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Program to run; empty disables the scraper
    #[serde(default = "defaults::scraper_command")]
    pub command: String,

    #[serde(default = "defaults::scraper_timeout")]
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            command: defaults::scraper_command(),
            timeout_secs: defaults::scraper_timeout(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root for the per-day working directories
    #[serde(default = "defaults::output_dir")]
    pub dir: String,

    /// Zip the day's directory after the run
    #[serde(default = "defaults::archive")]
    pub archive: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            archive: defaults::archive(),
        }
    }
}

/// Record normalization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Sources whose titles arrive in inconsistent case
    #[serde(default = "defaults::titlecase_sources")]
    pub titlecase_sources: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            titlecase_sources: defaults::titlecase_sources(),
        }
    }
}

/// Digest page and summary message settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Message subject; strftime pattern
    #[serde(default = "defaults::subject")]
    pub subject: String,

    /// Message body; `{entrycount}` and `{puzcount}` are filled in
    #[serde(default = "defaults::message")]
    pub message: String,

    /// Lines appended to the digest page
    #[serde(default)]
    pub postscript: Vec<String>,

    /// Link lists appended after the postscript
    #[serde(default)]
    pub blocklists: Vec<Blocklist>,

    /// Monthly reminders added to the message
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            subject: defaults::subject(),
            message: defaults::message(),
            postscript: Vec::new(),
            blocklists: Vec::new(),
            reminders: Vec::new(),
        }
    }
}

/// A titled list of links shown below the puzzles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blocklist {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub entries: Vec<BlocklistEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlocklistEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub comment: String,
}

/// A note to include in the message on given days of the month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reminder {
    pub days_of_month: Vec<u32>,
    pub text: String,
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; xword-roundup/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn source_timeout() -> u64 {
        120
    }
    pub fn source_delay() -> u64 {
        1000
    }
    pub fn feed_retries() -> u32 {
        10
    }
    pub fn feed_backoff() -> u64 {
        200
    }
    pub fn feed_window() -> u64 {
        86_400 + 120
    }

    // Mail defaults
    pub fn imap_port() -> u16 {
        993
    }
    pub fn password_env() -> String {
        "ROUNDUP_MAIL_PASSWORD".into()
    }
    pub fn folder() -> String {
        "INBOX".into()
    }

    // Scraper defaults
    pub fn scraper_command() -> String {
        "xword-dl".into()
    }
    pub fn scraper_timeout() -> u64 {
        60
    }

    // Output defaults
    pub fn output_dir() -> String {
        "output".into()
    }
    pub fn archive() -> bool {
        true
    }

    // Normalization defaults
    pub fn titlecase_sources() -> Vec<String> {
        vec![
            "Newsday".into(),
            "USA Today".into(),
            "BEQ".into(),
            "New York Times".into(),
        ]
    }

    // Digest defaults
    pub fn subject() -> String {
        "Crossword roundup for %A, %B %-d".into()
    }
    pub fn message() -> String {
        "Found {puzcount} puzzle files across {entrycount} entries today.".into()
    }
}
