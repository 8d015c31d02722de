// src/digest/html.rs

//! Digest page.

use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::digest::format_date;
use crate::models::{Blocklist, DigestConfig, DigestLine, RunOutcome};

const INDENT: &str = "    ";

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>Crossword Roundup</title>
        <style>
            h1, p {
                margin-left: 40px;
            }
            a {
                color: #f90;
                text-decoration: none;
            }
            a:hover {
                text-decoration: underline;
            }
            body {
                width: 750px;
            }
            .unfetched:before, .fetched:before {
                display: inline-block;
                width: 30px;
                margin-left: -30px;
            }
            .unfetched:before {
                content: '❌';
            }
            .fetched:before {
                content: '✔️';
            }
        </style>
    </head>
    <body>
"#;

const TAIL: &str = "    </body>\n</html>\n";

/// Render the day's digest page.
///
/// Display strings and postscript lines are markup already and are
/// inserted as they are; blocklist text is escaped.
pub fn render_html(outcome: &RunOutcome, config: &DigestConfig, today: NaiveDate) -> String {
    let mut html = String::from(HEAD);
    let outer = INDENT.repeat(2);
    let inner = INDENT.repeat(3);

    html.push_str(&format!(
        "{outer}<h1>{}</h1>\n{outer}<p>\n",
        format_date(today, "%A, %B %-d, %Y")
    ));

    for line in &outcome.lines {
        match line {
            DigestLine::Break => html.push_str(&format!("{outer}</p>\n{outer}<p>\n")),
            DigestLine::Entry(record) => {
                let Some(display) = record.display.as_deref().filter(|d| !d.is_empty()) else {
                    continue;
                };
                let class = if record.is_fetched() { "fetched" } else { "unfetched" };
                html.push_str(&format!(
                    "{inner}<span class=\"{class}\">{display}</span><br />\n"
                ));
            }
        }
    }
    html.push_str(&format!("{outer}</p>\n"));

    for paragraph in &config.postscript {
        html.push_str(&format!("{outer}<p><em>{paragraph}</em></p>\n"));
    }
    for blocklist in &config.blocklists {
        html.push_str(&render_blocklist(blocklist));
    }

    html.push_str(TAIL);
    html
}

fn render_blocklist(blocklist: &Blocklist) -> String {
    let outer = INDENT.repeat(2);
    let mut html = String::new();

    if !blocklist.title.is_empty() {
        html.push_str(&format!(
            "{outer}<p><strong>{}</strong></p>\n\n",
            encode_text(&blocklist.title)
        ));
    }

    let entries: Vec<String> = blocklist
        .entries
        .iter()
        .map(|entry| {
            let mut item = match (entry.name.is_empty(), entry.link.is_empty()) {
                (false, false) => format!(
                    "<a href=\"{}\">{}</a>",
                    encode_double_quoted_attribute(&entry.link),
                    encode_text(&entry.name)
                ),
                (false, true) => encode_text(&entry.name).into_owned(),
                _ => String::new(),
            };
            if !entry.comment.is_empty() {
                item.push(' ');
                item.push_str(&encode_text(&entry.comment));
            }
            item
        })
        .collect();

    html.push_str(&format!("{outer}<p>{}</p>\n\n", entries.join(" | ")));
    html
}
