// src/lib.rs

//! Crossword roundup library.
//!
//! Checks a roster of puzzle sources for the day's crosswords, saves the
//! puzzle files it finds and builds a digest of what was (and was not)
//! fetched.

pub mod digest;
pub mod error;
pub mod formats;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
