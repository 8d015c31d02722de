// src/services/external.rs

//! External puzzle scraper.
//!
//! Some outlets only publish through web apps that a dedicated
//! downloader understands. The scraper is handed a URL or a keyword and
//! returns the puzzle plus the file name it suggests.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::error::{AppError, Result};
use crate::formats::ContainerFormat;
use crate::models::ScraperConfig;
use crate::storage::LocalStorage;

/// A puzzle obtained by the external scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPuzzle {
    bytes: Vec<u8>,
}

impl ScrapedPuzzle {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Save the puzzle into the working directory.
    pub async fn save(&self, storage: &LocalStorage, file_name: &str) -> Result<PathBuf> {
        storage.save_puzzle(file_name, &self.bytes).await
    }
}

/// Scrape-by-URL and scrape-by-keyword capability.
#[async_trait]
pub trait PuzzleScraper: Send + Sync {
    async fn fetch_by_url(&self, url: &str) -> Result<(ScrapedPuzzle, String)>;

    async fn fetch_by_keyword(&self, keyword: &str) -> Result<(ScrapedPuzzle, String)>;
}

/// Build the scraper described by the configuration.
pub fn from_config(config: &ScraperConfig) -> Box<dyn PuzzleScraper> {
    match CommandScraper::new(&config.command, Duration::from_secs(config.timeout_secs)) {
        Some(scraper) => Box::new(scraper),
        None => Box::new(DisabledScraper),
    }
}

/// Runs a downloader program in a scratch directory and picks up the
/// puzzle file it writes.
///
/// The program receives the URL or keyword as its last argument.
#[derive(Debug, Clone)]
pub struct CommandScraper {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandScraper {
    /// `command` is split on whitespace into program and leading arguments.
    /// Returns `None` for an empty command.
    pub fn new(command: &str, timeout: Duration) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    async fn run(&self, argument: &str) -> Result<(ScrapedPuzzle, String)> {
        let scratch = TempDir::new()?;
        log::debug!("Running {} {:?} {}", self.program, self.args, argument);

        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(argument)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::scraper(format!("cannot start {}: {e}", self.program)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::scraper(format!(
                    "{} timed out after {:?} for {argument}",
                    self.program, self.timeout
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::scraper(format!(
                "{} exited with {} for {argument}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let mut produced: Vec<PathBuf> = std::fs::read_dir(scratch.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| ContainerFormat::from_path(p).is_some())
            .collect();
        produced.sort();

        let path = produced.into_iter().next().ok_or_else(|| {
            AppError::scraper(format!("{} produced no puzzle for {argument}", self.program))
        })?;
        let bytes = std::fs::read(&path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok((ScrapedPuzzle::new(bytes), file_name))
    }
}

#[async_trait]
impl PuzzleScraper for CommandScraper {
    async fn fetch_by_url(&self, url: &str) -> Result<(ScrapedPuzzle, String)> {
        self.run(url).await
    }

    async fn fetch_by_keyword(&self, keyword: &str) -> Result<(ScrapedPuzzle, String)> {
        self.run(keyword).await
    }
}

/// Scraper used when no downloader is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledScraper;

#[async_trait]
impl PuzzleScraper for DisabledScraper {
    async fn fetch_by_url(&self, url: &str) -> Result<(ScrapedPuzzle, String)> {
        Err(AppError::scraper(format!("no scraper configured for {url}")))
    }

    async fn fetch_by_keyword(&self, keyword: &str) -> Result<(ScrapedPuzzle, String)> {
        Err(AppError::scraper(format!("no scraper configured for '{keyword}'")))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Scraper answering from a fixed table of URLs and keywords.
    #[derive(Default)]
    pub struct StubScraper {
        puzzles: HashMap<String, (Vec<u8>, String)>,
        calls: Mutex<Vec<String>>,
    }

    impl StubScraper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, key: &str, file_name: &str, bytes: Vec<u8>) -> Self {
            self.puzzles
                .insert(key.to_string(), (bytes, file_name.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn lookup(&self, key: &str) -> Result<(ScrapedPuzzle, String)> {
            self.calls.lock().unwrap().push(key.to_string());
            self.puzzles
                .get(key)
                .map(|(bytes, name)| (ScrapedPuzzle::new(bytes.clone()), name.clone()))
                .ok_or_else(|| AppError::scraper(format!("nothing at {key}")))
        }
    }

    #[async_trait]
    impl PuzzleScraper for StubScraper {
        async fn fetch_by_url(&self, url: &str) -> Result<(ScrapedPuzzle, String)> {
            self.lookup(url)
        }

        async fn fetch_by_keyword(&self, keyword: &str) -> Result<(ScrapedPuzzle, String)> {
            self.lookup(keyword)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(timeout: Duration) -> CommandScraper {
        CommandScraper::new("sh -c", timeout).unwrap()
    }

    #[test]
    fn test_empty_command_disables() {
        assert!(CommandScraper::new("   ", Duration::from_secs(1)).is_none());
    }

    #[tokio::test]
    async fn test_command_output_is_picked_up() {
        let scraper = shell(Duration::from_secs(10));
        let (puzzle, name) = scraper
            .fetch_by_keyword("printf 'grid' > notes.txt; printf 'puzzle' > daily.puz")
            .await
            .unwrap();

        assert_eq!(name, "daily.puz");
        assert_eq!(puzzle.as_bytes(), b"puzzle");
    }

    #[tokio::test]
    async fn test_command_failure() {
        let scraper = shell(Duration::from_secs(10));
        let err = scraper.fetch_by_url("echo oops >&2; exit 3").await.unwrap_err();
        assert!(matches!(err, AppError::Scraper(ref m) if m.contains("oops")));
    }

    #[tokio::test]
    async fn test_command_without_puzzle() {
        let scraper = shell(Duration::from_secs(10));
        assert!(scraper.fetch_by_keyword("true").await.is_err());
    }

    #[tokio::test]
    async fn test_command_timeout() {
        let scraper = shell(Duration::from_millis(100));
        let err = scraper.fetch_by_keyword("sleep 5").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_save_scraped_puzzle() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let path = ScrapedPuzzle::new(b"abc".to_vec())
            .save(&storage, "x.jpz")
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }
}
