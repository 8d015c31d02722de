//! Puzzle container formats.
//!
//! - `puz`: Across Lite binary container
//! - `jpz`: Crossword Compiler XML container, zipped or bare

pub mod jpz;
pub mod puz;

use std::path::Path;

use crate::error::Result;
use crate::models::PuzzleMetadata;

/// Known puzzle container formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Binary,
    Xml,
}

impl ContainerFormat {
    /// Detect the format from a file name or URL path.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".puz") {
            Some(Self::Binary)
        } else if lower.ends_with(".jpz") {
            Some(Self::Xml)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_name)
    }

    /// Parse container bytes; `link` names the source in error messages.
    pub fn parse(self, bytes: &[u8], link: &str) -> Result<PuzzleMetadata> {
        match self {
            Self::Binary => puz::parse(bytes, link),
            Self::Xml => jpz::parse(bytes, link),
        }
    }

    /// Read a saved container and parse it.
    ///
    /// The file is read whole and closed before parsing starts.
    pub fn read_metadata(self, path: &Path, link: &str) -> Result<PuzzleMetadata> {
        let bytes = std::fs::read(path)?;
        self.parse(&bytes, link)
    }
}
