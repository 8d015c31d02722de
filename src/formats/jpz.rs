//! Crossword Compiler XML container (`.jpz`).
//!
//! A `.jpz` is either a zip archive whose first entry is the XML document or
//! the bare XML document itself. Title and author live at
//! `<root>/rectangular-puzzle/metadata/{title,creator}` where the root is
//! `crossword-compiler` or `crossword-compiler-applet`.

use std::borrow::Cow;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::error::{AppError, Result};
use crate::models::PuzzleMetadata;

const ROOT_TAGS: [&str; 2] = ["crossword-compiler", "crossword-compiler-applet"];
const METADATA_PATH: [&str; 2] = ["rectangular-puzzle", "metadata"];

/// Local file header signature of a zip archive.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Read title and author from an XML container, zipped or bare.
pub fn parse(bytes: &[u8], link: &str) -> Result<PuzzleMetadata> {
    let document = extract_document(bytes, link)?;
    read_metadata(&document, link)
}

/// Whether the bytes look like a zip archive rather than raw XML.
pub fn is_zipped(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_SIGNATURE)
}

fn extract_document<'a>(bytes: &'a [u8], link: &str) -> Result<Cow<'a, [u8]>> {
    if !is_zipped(bytes) {
        return Ok(Cow::Borrowed(bytes));
    }

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| AppError::malformed(link, e))?;
    if archive.is_empty() {
        return Err(AppError::malformed(link, "archive has no entries"));
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| AppError::malformed(link, e))?;
    let mut document = Vec::new();
    entry
        .read_to_end(&mut document)
        .map_err(|e| AppError::malformed(link, e))?;
    Ok(Cow::Owned(document))
}

/// Which metadata field an element path points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Creator,
}

fn field_at(path: &[String]) -> Option<Field> {
    if path.len() < 4 || !ROOT_TAGS.contains(&path[0].as_str()) {
        return None;
    }
    if path[1] != METADATA_PATH[0] || path[2] != METADATA_PATH[1] {
        return None;
    }
    match path[3].as_str() {
        "title" => Some(Field::Title),
        "creator" => Some(Field::Creator),
        _ => None,
    }
}

fn read_metadata(document: &[u8], link: &str) -> Result<PuzzleMetadata> {
    let mut reader = Reader::from_reader(document);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut saw_element = false;
    let mut root: Option<String> = None;
    let mut title: Option<String> = None;
    let mut creator: Option<String> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| AppError::malformed(link, e))?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if path.is_empty() && root.is_none() {
                    root = Some(name.clone());
                }
                saw_element = true;
                path.push(name);
                open_field(&path, &mut title, &mut creator);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if path.is_empty() && root.is_none() {
                    root = Some(name.clone());
                }
                saw_element = true;
                path.push(name);
                open_field(&path, &mut title, &mut creator);
                path.pop();
            }
            Event::Text(text) => {
                if let Some(field) = field_at(&path) {
                    let text = text.unescape().map_err(|e| AppError::malformed(link, e))?;
                    append(field, &text, &mut title, &mut creator);
                }
            }
            Event::CData(data) => {
                if let Some(field) = field_at(&path) {
                    let raw = data.into_inner();
                    append(field, &String::from_utf8_lossy(&raw), &mut title, &mut creator);
                }
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_element {
        return Err(AppError::malformed(link, "not an XML document"));
    }
    if !path.is_empty() {
        return Err(AppError::malformed(link, "unexpected end of document"));
    }

    match root.as_deref() {
        Some(r) if ROOT_TAGS.contains(&r) => {}
        other => {
            return Err(AppError::metadata_missing(format!(
                "{link}: root element is {}, expected crossword-compiler",
                other.unwrap_or("missing")
            )));
        }
    }

    match (title, creator) {
        (Some(title), Some(author)) => Ok(PuzzleMetadata {
            title: title.trim().to_string(),
            author: author.trim().to_string(),
        }),
        (None, _) => Err(AppError::metadata_missing(format!(
            "{link}: no rectangular-puzzle/metadata/title"
        ))),
        (_, None) => Err(AppError::metadata_missing(format!(
            "{link}: no rectangular-puzzle/metadata/creator"
        ))),
    }
}

/// Mark a metadata field as present once its element opens, so that an
/// empty element yields an empty string rather than "missing".
fn open_field(path: &[String], title: &mut Option<String>, creator: &mut Option<String>) {
    if path.len() != 4 {
        return;
    }
    match field_at(path) {
        Some(Field::Title) => {
            title.get_or_insert_with(String::new);
        }
        Some(Field::Creator) => {
            creator.get_or_insert_with(String::new);
        }
        None => {}
    }
}

fn append(field: Field, text: &str, title: &mut Option<String>, creator: &mut Option<String>) {
    let target = match field {
        Field::Title => title,
        Field::Creator => creator,
    };
    let value = target.get_or_insert_with(String::new);
    if !value.is_empty() {
        value.push(' ');
    }
    value.push_str(text);
}


#[cfg(test)]
mod tests {
    use super::fixtures::{jpz_xml, zipped};
    use super::*;

    #[test]
    fn test_bare_xml() {
        let xml = jpz_xml("crossword-compiler", "Sunday Stroll", "Jane Doe");
        let meta = parse(xml.as_bytes(), "test").unwrap();
        assert_eq!(meta.title, "Sunday Stroll");
        assert_eq!(meta.author, "Jane Doe");
    }

    #[test]
    fn test_zipped_applet_root() {
        let xml = jpz_xml("crossword-compiler-applet", "Theme &amp; Variations", "A. Setter");
        let bytes = zipped(&xml);
        assert!(is_zipped(&bytes));

        let meta = parse(&bytes, "test").unwrap();
        assert_eq!(meta.title, "Theme & Variations");
        assert_eq!(meta.author, "A. Setter");
    }

    #[test]
    fn test_root_spelling_does_not_matter() {
        let a = parse(
            jpz_xml("crossword-compiler", "Same", "Person").as_bytes(),
            "test",
        )
        .unwrap();
        let b = parse(
            &zipped(&jpz_xml("crossword-compiler-applet", "Same", "Person")),
            "test",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cdata_title() {
        let xml = jpz_xml("crossword-compiler", "<![CDATA[Odds <and> Ends]]>", "Someone");
        let meta = parse(xml.as_bytes(), "test").unwrap();
        assert_eq!(meta.title, "Odds <and> Ends");
    }

    #[test]
    fn test_empty_creator_is_present() {
        let xml = jpz_xml("crossword-compiler", "Untitled", "");
        let meta = parse(xml.as_bytes(), "test").unwrap();
        assert_eq!(meta.author, "");
    }

    #[test]
    fn test_wrong_root_is_metadata_missing() {
        let xml = jpz_xml("puzzle", "Title", "Author");
        assert!(matches!(
            parse(xml.as_bytes(), "test"),
            Err(AppError::MetadataMissing(_))
        ));
    }

    #[test]
    fn test_missing_creator_is_metadata_missing() {
        let xml = r#"<crossword-compiler><rectangular-puzzle><metadata><title>T</title></metadata></rectangular-puzzle></crossword-compiler>"#;
        assert!(matches!(
            parse(xml.as_bytes(), "test"),
            Err(AppError::MetadataMissing(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse(b"this is not xml at all", "test"),
            Err(AppError::MalformedContainer { .. })
        ));
        assert!(matches!(
            parse(b"PK\x03\x04garbage", "test"),
            Err(AppError::MalformedContainer { .. })
        ));
        assert!(matches!(
            parse(b"<crossword-compiler><rectangular-puzzle>", "test"),
            Err(AppError::MalformedContainer { .. })
        ));
    }
}
