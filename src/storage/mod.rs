//! Storage for saved puzzles and the day's output files.

pub mod local;

pub use local::{LocalStorage, day_stamp};
