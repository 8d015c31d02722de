// src/utils/log.rs

//! Sectioned progress output on top of the `log` facade.
//!
//! The binary decides where records go (`env_logger`); these helpers only
//! shape the run report into headers, steps and summaries.

/// Log a boxed section header.
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{border}");
    log::info!("  {title}");
    log::info!("{border}");
}

/// Log a numbered step of a run.
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {step_num}/{total}] {message}");
}

/// Log a warning.
pub fn warn(message: &str) {
    log::warn!("{message}");
}

/// Log an indented detail line.
pub fn sub_item(message: &str) {
    log::info!("    {message}");
}

/// Log a titled list of key/value pairs.
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        log::info!("    {key}: {value}");
    }
}
