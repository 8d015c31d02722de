// src/utils/text.rs

//! Text cleanup for titles and bylines.

use scraper::Html;

const SMALL_WORDS: [&str; 21] = [
    "a", "an", "and", "as", "at", "but", "by", "en", "for", "if", "in", "of", "on", "or",
    "the", "to", "v", "v.", "via", "vs", "vs.",
];

const BYLINE_PREFIXES: [&str; 3] = ["by ", "By ", "BY "];

/// Text content of an HTML fragment.
pub fn strip_html(value: &str) -> String {
    if !value.contains('<') && !value.contains('&') {
        return value.to_string();
    }
    let fragment = Html::parse_fragment(value);
    fragment.root_element().text().collect()
}

/// Reduce a byline to the constructor's name.
///
/// Markup is removed, co-credits after `/` and editor credits after
/// `, edited` are dropped, and a leading "by" is removed.
pub fn clean_author(raw: &str) -> String {
    let text = strip_html(raw);
    let first = text.split('/').next().unwrap_or_default();
    let first = first.split(", edited").next().unwrap_or_default().trim();

    BYLINE_PREFIXES
        .iter()
        .find_map(|prefix| first.strip_prefix(prefix))
        .unwrap_or(first)
        .to_string()
}

/// Headline-style capitalization.
///
/// Small words stay lowercase except at the start, the end, or after a
/// colon. Words with inner capitals (acronyms, "iPhone") are kept as
/// written unless the whole title is shouted, in which case it is
/// lowercased first.
pub fn titlecase(title: &str) -> String {
    let shouted = title.chars().any(char::is_alphabetic)
        && !title.chars().any(char::is_lowercase);
    let source = if shouted {
        title.to_lowercase()
    } else {
        title.to_string()
    };

    let words: Vec<&str> = source.split(' ').collect();
    let last_word = words.iter().rposition(|w| !w.is_empty());
    let mut out = Vec::with_capacity(words.len());
    let mut starts_clause = true;

    for (index, word) in words.iter().enumerate() {
        if word.is_empty() {
            out.push(String::new());
            continue;
        }

        let bare = word
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
            .to_lowercase();
        let is_edge = starts_clause || Some(index) == last_word;

        let cased = if has_inner_capital(word) {
            word.to_string()
        } else if !is_edge && SMALL_WORDS.contains(&bare.as_str()) {
            word.to_lowercase()
        } else {
            word.split('-')
                .map(capitalize)
                .collect::<Vec<_>>()
                .join("-")
        };
        out.push(cased);
        starts_clause = word.ends_with(':');
    }

    out.join(" ")
}

fn has_inner_capital(word: &str) -> bool {
    word.chars()
        .skip_while(|c| !c.is_alphabetic())
        .skip(1)
        .any(char::is_uppercase)
}

fn capitalize(part: &str) -> String {
    let mut done = false;
    part.chars()
        .map(|c| {
            if !done && c.is_alphabetic() {
                done = true;
                c.to_uppercase().collect::<String>()
            } else {
                c.to_string()
            }
        })
        .collect()
}
