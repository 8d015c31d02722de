//! Pipeline entry points.
//!
//! - `Cascade`: acquire records for one source
//! - `Normalizer`: fill and tidy a record, render its display string
//! - `Runner`: check every source in order
//! - `run_daily`: full run plus digest outputs

pub mod cascade;
pub mod daily;
pub mod normalize;
pub mod run;

pub use cascade::{Acquisition, Cascade};
pub use daily::{build_context, run_daily};
pub use normalize::{Normalizer, display_template};
pub use run::{HOMEPAGE_PROBLEM, Runner};
