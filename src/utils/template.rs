// src/utils/template.rs

//! Token substitution for links and display strings.
//!
//! Record tokens: `%link`, `%homepage`, `%sitename`, `%pagetitle`,
//! `%author`, `%puztitle`, `%blank`. Date tokens `%d %-d %m %-m %y %Y %B`
//! resolve against today, and each has a `%yest` form (`%yestd`,
//! `%yest-m`, ...) resolving against yesterday.
//!
//! Substitution is a single left-to-right pass. Replacement text is never
//! rescanned, so a title containing `%author` stays literal.

use chrono::{NaiveDate, TimeDelta};

use crate::models::Record;

/// Stand-in for a missing title or author.
pub const PLACEHOLDER: &str = "tktktk";

const DATE_TOKENS: [&str; 7] = ["d", "-d", "m", "-m", "y", "Y", "B"];

/// Render `template` against a record and a reference day.
pub fn render(template: &str, record: &Record, today: NaiveDate) -> String {
    let tokens = token_table(record, today);
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let matched = tokens
            .iter()
            .filter(|(token, _)| tail.starts_with(token.as_str()))
            .max_by_key(|(token, _)| token.len());

        match matched {
            Some((token, value)) => {
                out.push_str(value);
                rest = &tail[token.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn token_table(record: &Record, today: NaiveDate) -> Vec<(String, String)> {
    let or_placeholder = |value: &str| {
        if value.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            value.to_string()
        }
    };

    let link = if record.link.is_empty() {
        record.homepage.clone()
    } else {
        record.link.clone()
    };
    let page_title = if record.page_title.is_empty() {
        or_placeholder(&record.title)
    } else {
        record.page_title.clone()
    };

    let mut tokens = vec![
        ("%link".to_string(), link),
        ("%homepage".to_string(), record.homepage.clone()),
        ("%sitename".to_string(), record.name.clone()),
        ("%pagetitle".to_string(), page_title),
        ("%author".to_string(), or_placeholder(&record.author)),
        ("%puztitle".to_string(), or_placeholder(&record.title)),
        ("%blank".to_string(), String::new()),
    ];

    let yesterday = today - TimeDelta::days(1);
    for spec in DATE_TOKENS {
        let pattern = format!("%{spec}");
        tokens.push((pattern.clone(), today.format(&pattern).to_string()));
        tokens.push((
            format!("%yest{spec}"),
            yesterday.format(&pattern).to_string(),
        ));
    }
    tokens
}
