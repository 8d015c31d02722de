//! Acquisition records and puzzle metadata.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What was found for one source on one day.
///
/// Empty strings stand for "not known yet"; the cascade fills the
/// source-level defaults and the normalizer fills the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Source display name
    pub name: String,

    /// Source homepage
    pub homepage: String,

    /// Link to the puzzle or the post announcing it
    pub link: String,

    /// Title of the page, feed entry or email that led to the puzzle
    pub page_title: String,

    /// Puzzle title
    pub title: String,

    /// Puzzle author
    pub author: String,

    /// Saved puzzle file, if one was obtained
    pub puzzle_file: Option<PathBuf>,

    /// Rendered display string
    pub display: Option<String>,

    /// Errors collected while producing this record
    pub error: Option<String>,
}

impl Record {
    /// A record holding only a saved puzzle file.
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            puzzle_file: Some(path),
            ..Self::default()
        }
    }

    /// Whether a puzzle file was obtained.
    pub fn is_fetched(&self) -> bool {
        self.puzzle_file.is_some()
    }

    /// Append an error line, keeping earlier ones.
    pub fn push_error(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref().trim();
        if message.is_empty() {
            return;
        }
        match &mut self.error {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(message);
            }
            None => self.error = Some(message.to_string()),
        }
    }

    /// File name of the saved puzzle, for listings.
    pub fn file_name(&self) -> String {
        self.puzzle_file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Title and author recovered from a puzzle container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PuzzleMetadata {
    pub title: String,
    pub author: String,
}
