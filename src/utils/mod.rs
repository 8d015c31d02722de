//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod template;
pub mod text;
pub mod url;

pub use template::{PLACEHOLDER, render};
