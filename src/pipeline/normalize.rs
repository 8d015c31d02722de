// src/pipeline/normalize.rs

//! Record normalization.
//!
//! Fills title and author from the saved container, tidies them, and
//! renders the display string.

use chrono::NaiveDate;

use crate::formats::ContainerFormat;
use crate::models::{NormalizeConfig, Record, SourceConfig};
use crate::utils::text::{clean_author, titlecase};
use crate::utils::{PLACEHOLDER, render};

const DEFAULT_TEMPLATE: &str =
    r#"<strong><a href="%link">%sitename</a>: %puztitle</strong> by %author."#;

/// Display template for a source: its bold/normal fragments if it has
/// any, otherwise the default, followed by the italic trailer.
pub fn display_template(source: &SourceConfig) -> String {
    let body = if source.bold().is_some() || source.normal().is_some() {
        format!(
            "<strong>{}</strong> {}",
            source.bold().unwrap_or_default(),
            source.normal().unwrap_or_default()
        )
    } else {
        DEFAULT_TEMPLATE.to_string()
    };
    format!("{body} <em>{}</em>", source.italic().unwrap_or(PLACEHOLDER))
}

/// Normalizes records for one day.
pub struct Normalizer<'a> {
    config: &'a NormalizeConfig,
    today: NaiveDate,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a NormalizeConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    /// Normalize one record in place.
    ///
    /// Metadata failures are attached to the record after `pending_error`;
    /// the saved file is kept either way.
    pub fn normalize(
        &self,
        record: &mut Record,
        source: &SourceConfig,
        pending_error: Option<&str>,
    ) {
        let link = render(&record.link, record, self.today);
        record.link = link;

        let metadata_error = self.read_metadata(record);

        if !record.author.is_empty() {
            record.author = clean_author(&record.author);
        }

        if self
            .config
            .titlecase_sources
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&record.name))
        {
            record.title = titlecase(&record.title);
        }

        let template = display_template(source);
        record.display = Some(render(&template, record, self.today));

        if let Some(error) = pending_error {
            record.push_error(error);
        }
        if let Some(error) = metadata_error {
            record.push_error(error);
        }
    }

    /// Fill title and author from the saved container. Returns the
    /// error message on failure.
    fn read_metadata(&self, record: &mut Record) -> Option<String> {
        let path = record.puzzle_file.clone()?;
        let Some(format) = ContainerFormat::from_path(&path) else {
            log::debug!("{} is not a known container", path.display());
            return None;
        };

        match format.read_metadata(&path, &record.link) {
            Ok(metadata) => {
                record.author = metadata.author;
                if !metadata.title.is_empty() {
                    record.title = metadata.title;
                }
                None
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                Some(match format {
                    ContainerFormat::Xml => format!("JPZ parsing issue: {e}"),
                    ContainerFormat::Binary => e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::formats::jpz::fixtures::{jpz_xml, zipped};
    use crate::formats::puz::fixtures::puz_bytes;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn source() -> SourceConfig {
        SourceConfig {
            name: "Example".into(),
            homepage: "https://example.com".into(),
            ..SourceConfig::default()
        }
    }

    fn saved(tmp: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_display_template() {
        assert_eq!(
            display_template(&source()),
            r#"<strong><a href="%link">%sitename</a>: %puztitle</strong> by %author. <em>tktktk</em>"#
        );

        let custom = SourceConfig {
            bold: Some("%sitename".into()),
            normal: Some("<a href=\"%link\">%pagetitle</a>".into()),
            italic: Some("Weekly".into()),
            ..source()
        };
        assert_eq!(
            display_template(&custom),
            r#"<strong>%sitename</strong> <a href="%link">%pagetitle</a> <em>Weekly</em>"#
        );
    }

    #[test]
    fn test_binary_metadata_and_display() {
        let tmp = TempDir::new().unwrap();
        let config = NormalizeConfig::default();
        let mut record = Record {
            name: "Example".into(),
            homepage: "https://example.com".into(),
            link: "https://example.com/%Y/%m/%d".into(),
            ..Record::with_file(saved(&tmp, "a.puz", &puz_bytes("Fall Colors", "By Jane Doe")))
        };

        Normalizer::new(&config, day()).normalize(&mut record, &source(), None);

        assert_eq!(record.link, "https://example.com/2026/10/18");
        assert_eq!(record.title, "Fall Colors");
        assert_eq!(record.author, "Jane Doe");
        assert_eq!(
            record.display.as_deref(),
            Some(
                r#"<strong><a href="https://example.com/2026/10/18">Example</a>: Fall Colors</strong> by Jane Doe. <em>tktktk</em>"#
            )
        );
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_empty_container_title_keeps_existing() {
        let tmp = TempDir::new().unwrap();
        let config = NormalizeConfig::default();
        let mut record = Record {
            title: "From the Feed".into(),
            ..Record::with_file(saved(&tmp, "a.puz", &puz_bytes("", "Someone")))
        };

        Normalizer::new(&config, day()).normalize(&mut record, &source(), None);
        assert_eq!(record.title, "From the Feed");
        assert_eq!(record.author, "Someone");
    }

    #[test]
    fn test_malformed_binary_keeps_file() {
        let tmp = TempDir::new().unwrap();
        let config = NormalizeConfig::default();
        let path = saved(&tmp, "broken.puz", b"<html>not a puzzle</html>");
        let mut record = Record::with_file(path.clone());

        Normalizer::new(&config, day()).normalize(&mut record, &source(), None);

        assert_eq!(record.puzzle_file, Some(path));
        assert!(record.title.is_empty());
        assert!(record.author.is_empty());
        assert!(
            record
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("Apparently malformed puzzle file"))
        );
    }

    #[test]
    fn test_xml_failure_is_prefixed() {
        let tmp = TempDir::new().unwrap();
        let config = NormalizeConfig::default();
        let xml = jpz_xml("puzzle", "T", "A");
        let mut record = Record::with_file(saved(&tmp, "x.jpz", xml.as_bytes()));

        Normalizer::new(&config, day()).normalize(&mut record, &source(), Some("feed down"));

        let error = record.error.unwrap();
        assert!(error.starts_with("feed down\nJPZ parsing issue: "));
        assert!(record.puzzle_file.is_some());
    }

    #[test]
    fn test_zipped_xml_and_titlecase() {
        let tmp = TempDir::new().unwrap();
        let config = NormalizeConfig::default();
        let bytes = zipped(&jpz_xml(
            "crossword-compiler-applet",
            "THE END OF THE LINE",
            "Pat Setter, edited by Someone Else",
        ));
        let mut record = Record {
            name: "Newsday".into(),
            ..Record::with_file(saved(&tmp, "nd.jpz", &bytes))
        };
        let newsday = SourceConfig {
            name: "Newsday".into(),
            ..SourceConfig::default()
        };

        Normalizer::new(&config, day()).normalize(&mut record, &newsday, None);
        assert_eq!(record.title, "The End of the Line");
        assert_eq!(record.author, "Pat Setter");
    }

    #[test]
    fn test_placeholder_record_renders() {
        let config = NormalizeConfig::default();
        let mut record = Record {
            name: "Example".into(),
            homepage: "https://example.com".into(),
            ..Record::default()
        };

        let normalizer = Normalizer::new(&config, day());
        normalizer.normalize(&mut record, &source(), Some("No puzzle today"));

        assert_eq!(
            record.display.as_deref(),
            Some(
                r#"<strong><a href="https://example.com">Example</a>: tktktk</strong> by tktktk. <em>tktktk</em>"#
            )
        );
        assert_eq!(record.error.as_deref(), Some("No puzzle today"));
    }
}
