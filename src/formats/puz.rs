//! Across Lite binary container (`.puz`).
//!
//! ## Layout
//!
//! ```text
//! 0x00  u16    file checksum
//! 0x02  [12]   "ACROSS&DOWN\0"
//! 0x0E  ...    header checksums, version, scrambling info
//! 0x2C  u8     width
//! 0x2D  u8     height
//! 0x2E  u16    number of clues
//! 0x30  u16    bitmask
//! 0x32  u16    scrambled tag
//! 0x34  [w*h]  solution grid, then [w*h] fill grid
//! ...   NUL-terminated ISO-8859-1 strings:
//!       title, author, copyright, clues (n), notes
//! ```
//!
//! All integers are little-endian. Files in the wild sometimes carry a
//! preamble before the header, so the magic is searched for rather than
//! expected at offset 2.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{AppError, Result};
use crate::models::PuzzleMetadata;

const MAGIC: &[u8] = b"ACROSS&DOWN\0";
const MAGIC_OFFSET: usize = 0x02;
const DIMENSIONS_OFFSET: usize = 0x2C;
const HEADER_LEN: usize = 0x34;

/// A decoded binary puzzle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PuzFile {
    pub width: u8,
    pub height: u8,
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub clues: Vec<String>,
    pub notes: String,
}

impl PuzFile {
    pub fn metadata(&self) -> PuzzleMetadata {
        PuzzleMetadata {
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

/// Decode a binary container, reporting structural problems as
/// `MalformedContainer` against `link`.
pub fn decode(bytes: &[u8], link: &str) -> Result<PuzFile> {
    decode_inner(bytes).map_err(|message| AppError::malformed(link, message))
}

/// Read title and author from a binary container.
pub fn parse(bytes: &[u8], link: &str) -> Result<PuzzleMetadata> {
    decode(bytes, link).map(|puz| puz.metadata())
}

fn decode_inner(bytes: &[u8]) -> std::result::Result<PuzFile, String> {
    let magic_at = bytes
        .windows(MAGIC.len())
        .position(|w| w == MAGIC)
        .ok_or("missing ACROSS&DOWN header")?;
    let start = magic_at
        .checked_sub(MAGIC_OFFSET)
        .ok_or("header checksum truncated")?;
    let data = &bytes[start..];

    if data.len() < HEADER_LEN {
        return Err(format!(
            "header truncated ({} of {} bytes)",
            data.len(),
            HEADER_LEN
        ));
    }

    let mut header = Cursor::new(&data[DIMENSIONS_OFFSET..HEADER_LEN]);
    let width = header.read_u8().map_err(|e| e.to_string())?;
    let height = header.read_u8().map_err(|e| e.to_string())?;
    let clue_count = header
        .read_u16::<LittleEndian>()
        .map_err(|e| e.to_string())?;

    let cells = usize::from(width) * usize::from(height);
    if cells == 0 {
        return Err(format!("empty grid ({width}x{height})"));
    }

    let strings_at = HEADER_LEN + 2 * cells;
    if data.len() < strings_at {
        return Err(format!("grid truncated ({width}x{height})"));
    }

    let mut strings = Strings::new(&data[strings_at..]);
    let title = strings.next_required("title")?;
    let author = strings.next_required("author")?;
    let copyright = strings.next_required("copyright")?;
    let clues = (0..clue_count)
        .map(|n| strings.next_required(&format!("clue {}", n + 1)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let notes = strings.next().unwrap_or_default();

    Ok(PuzFile {
        width,
        height,
        title,
        author,
        copyright,
        clues,
        notes,
    })
}

/// Sequential reader over the NUL-terminated string section.
struct Strings<'a> {
    rest: &'a [u8],
}

impl<'a> Strings<'a> {
    fn new(rest: &'a [u8]) -> Self {
        Self { rest }
    }

    fn next(&mut self) -> Option<String> {
        let end = self.rest.iter().position(|b| *b == 0)?;
        let value = latin1(&self.rest[..end]);
        self.rest = &self.rest[end + 1..];
        Some(value)
    }

    fn next_required(&mut self, what: &str) -> std::result::Result<String, String> {
        self.next()
            .ok_or_else(|| format!("string section ends before {what}"))
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Build a minimal, structurally valid 3x3 puzzle.
    pub fn puz_bytes(title: &str, author: &str) -> Vec<u8> {
        let clues = ["Across one", "Down one"];
        let mut bytes = vec![0u8; 2];
        bytes.extend_from_slice(super::MAGIC);
        bytes.resize(super::DIMENSIONS_OFFSET, 0);
        bytes.push(3);
        bytes.push(3);
        bytes.extend_from_slice(&(clues.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&[1, 0, 0, 0]);
        bytes.extend_from_slice(b"CATA.EBED");
        bytes.extend_from_slice(b"---------");
        for s in [title, author, "(c) 2026"].iter().chain(clues.iter()) {
            bytes.extend(s.chars().map(|c| c as u8));
            bytes.push(0);
        }
        bytes.push(0); // notes
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::puz_bytes;
    use super::*;

    #[test]
    fn test_decode_valid() {
        let puz = decode(&puz_bytes("Monday Mini", "By Jane Doe"), "test").unwrap();
        assert_eq!(puz.width, 3);
        assert_eq!(puz.height, 3);
        assert_eq!(puz.title, "Monday Mini");
        assert_eq!(puz.author, "By Jane Doe");
        assert_eq!(puz.copyright, "(c) 2026");
        assert_eq!(puz.clues, vec!["Across one", "Down one"]);
    }

    #[test]
    fn test_decode_with_preamble_and_latin1() {
        let mut bytes = b"junk".to_vec();
        bytes.extend(puz_bytes("Caf\u{e9}", "Ren\u{e9}e"));
        let meta = parse(&bytes, "test").unwrap();
        assert_eq!(meta.title, "Café");
        assert_eq!(meta.author, "Renée");
    }

    #[test]
    fn test_empty_title_is_allowed() {
        let meta = parse(&puz_bytes("", "Someone"), "test").unwrap();
        assert_eq!(meta.title, "");
        assert_eq!(meta.author, "Someone");
    }

    #[test]
    fn test_missing_magic_is_malformed() {
        let err = parse(b"<html>not a puzzle</html>", "https://example.com/x.puz").unwrap_err();
        match err {
            AppError::MalformedContainer { link, .. } => {
                assert_eq!(link, "https://example.com/x.puz")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_strings_are_malformed() {
        let bytes = puz_bytes("Title", "Author");
        // cut inside the clue strings
        let cut = bytes.len() - 12;
        assert!(matches!(
            parse(&bytes[..cut], "test"),
            Err(AppError::MalformedContainer { .. })
        ));
    }

    #[test]
    fn test_truncated_grid_is_malformed() {
        let bytes = puz_bytes("Title", "Author");
        assert!(matches!(
            parse(&bytes[..HEADER_LEN + 4], "test"),
            Err(AppError::MalformedContainer { .. })
        ));
    }
}
