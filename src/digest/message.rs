// src/digest/message.rs

//! Summary message sent alongside the digest.

use chrono::{Datelike, NaiveDate};

use crate::digest::format_date;
use crate::models::{DigestConfig, RunOutcome};

/// Subject line: the configured pattern formatted with today's date.
pub fn subject(config: &DigestConfig, today: NaiveDate) -> String {
    format_date(today, &config.subject)
}

/// Message body with counts filled in, then any reminders due today,
/// then the problem list.
pub fn summary_message(outcome: &RunOutcome, config: &DigestConfig, today: NaiveDate) -> String {
    let mut message = config
        .message
        .replace("{entrycount}", &outcome.entry_count().to_string())
        .replace("{puzcount}", &outcome.puzzle_count().to_string());

    let reminders: Vec<&str> = config
        .reminders
        .iter()
        .filter(|reminder| reminder.days_of_month.contains(&today.day()))
        .map(|reminder| reminder.text.as_str())
        .collect();
    if !reminders.is_empty() {
        message.push_str("\n\nYou wanted me to remind you:\n");
        for text in reminders {
            message.push_str(&format!("- {text}\n"));
        }
    }

    if !outcome.problems.is_empty() {
        message.push_str("\n\nThe following sites may have had issues:\n");
        for problem in &outcome.problems {
            message.push_str(&format!("- {}: {}\n", problem.source, problem.message.trim()));
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::models::{DigestLine, Problem, Record, Reminder};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn outcome() -> RunOutcome {
        RunOutcome {
            lines: vec![
                DigestLine::Entry(Record::with_file(PathBuf::from("a.puz"))),
                DigestLine::Break,
                DigestLine::Entry(Record::default()),
            ],
            problems: vec![],
        }
    }

    #[test]
    fn test_subject() {
        let config = DigestConfig {
            subject: "Puzzles for %A, %B %-d".into(),
            ..DigestConfig::default()
        };
        assert_eq!(subject(&config, day()), "Puzzles for Sunday, October 18");
    }

    #[test]
    fn test_counts_only() {
        let config = DigestConfig {
            message: "{puzcount} of {entrycount} fetched.".into(),
            ..DigestConfig::default()
        };
        assert_eq!(summary_message(&outcome(), &config, day()), "1 of 2 fetched.");
    }

    #[test]
    fn test_reminders_and_problems() {
        let config = DigestConfig {
            message: "Done.".into(),
            reminders: vec![
                Reminder {
                    days_of_month: vec![1, 18],
                    text: "Renew the subscription".into(),
                },
                Reminder {
                    days_of_month: vec![2],
                    text: "Not today".into(),
                },
            ],
            ..DigestConfig::default()
        };
        let mut outcome = outcome();
        outcome
            .problems
            .push(Problem::new("Example", "  feed down\n"));

        assert_eq!(
            summary_message(&outcome, &config, day()),
            "Done.\n\nYou wanted me to remind you:\n- Renew the subscription\n\n\n\
             The following sites may have had issues:\n- Example: feed down\n"
        );
    }
}
