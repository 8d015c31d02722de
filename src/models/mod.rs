// src/models/mod.rs

//! Domain models for the roundup application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod outcome;
mod record;
mod source;

// Re-export all public types
pub use config::{
    Blocklist, BlocklistEntry, Config, DigestConfig, HttpConfig, MailConfig, NormalizeConfig,
    OutputConfig, Reminder, ScraperConfig,
};
pub use outcome::{DigestLine, Problem, RunOutcome};
pub use record::{PuzzleMetadata, Record};
pub use source::{Schedule, SourceConfig, Technique};
