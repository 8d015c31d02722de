//! Local filesystem storage for the day's working directory.
//!
//! ## Layout
//!
//! ```text
//! {output.dir}/
//! ├── 20261018/             # Working directory for one run
//! │   ├── *.puz, *.jpz      # Saved puzzles
//! │   ├── index.html        # Digest page
//! │   ├── 20261018.csv      # Record table
//! │   ├── records.json      # Record snapshot
//! │   └── message.txt       # Summary message
//! └── 20261018.zip          # Archive of the directory above
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::utils::url::sanitize_file_name;

/// Directory-backed storage with atomic writes.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Create (if needed) the `YYYYMMDD` working directory under `output_dir`.
    pub fn for_day(output_dir: impl AsRef<Path>, date: NaiveDate) -> Result<Self> {
        let root = output_dir.as_ref().join(day_stamp(date));
        std::fs::create_dir_all(&root)?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path(&format!(".{key}.tmp"));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Save puzzle bytes under a sanitized form of the suggested name.
    pub async fn save_puzzle(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = sanitize_file_name(file_name);
        let path = self.write_bytes(&name, bytes).await?;
        log::info!("Saved puzzle as {}", path.display());
        Ok(path)
    }

    /// Write a text file.
    pub async fn write_text(&self, key: &str, text: &str) -> Result<PathBuf> {
        self.write_bytes(key, text.as_bytes()).await
    }

    /// Write JSON data.
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Zip every file of the working directory into `dest`.
    ///
    /// Entries are stored flat under the directory's name.
    pub fn archive(&self, dest: impl AsRef<Path>) -> Result<PathBuf> {
        let dest = dest.as_ref();
        let prefix = self
            .root_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut entries: Vec<PathBuf> = std::fs::read_dir(&self.root_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .filter(|p| {
                !p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            })
            .collect();
        entries.sort();

        let mut writer = ZipWriter::new(File::create(dest)?);
        let options = SimpleFileOptions::default();
        for path in &entries {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let entry_name = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            writer.start_file(entry_name, options)?;
            let mut source = File::open(path)?;
            io::copy(&mut source, &mut writer)?;
        }
        writer.finish()?.flush()?;

        log::info!(
            "Archived {} files to {}",
            entries.len(),
            dest.display()
        );
        Ok(dest.to_path_buf())
    }
}

/// `YYYYMMDD` stamp used for directory and file names.
pub fn day_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use tempfile::TempDir;
    use zip::ZipArchive;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_for_day_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::for_day(tmp.path(), day()).unwrap();
        assert!(storage.root().ends_with("20261018"));
        assert!(storage.root().is_dir());
    }

    #[tokio::test]
    async fn test_save_puzzle_sanitizes_name() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let path = storage.save_puzzle("../escape.puz", b"bytes").await.unwrap();
        assert_eq!(path, tmp.path().join("escape.puz"));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
        assert!(!tmp.path().join(".escape.puz.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_json() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_json("data.json", &vec![1, 2, 3]).await.unwrap();
        let back: Vec<i32> =
            serde_json::from_slice(&std::fs::read(tmp.path().join("data.json")).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_archive_contains_files() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::for_day(tmp.path(), day()).unwrap();
        storage.write_text("index.html", "<p>hi</p>").await.unwrap();
        storage.save_puzzle("a.puz", b"puz").await.unwrap();

        let dest = tmp.path().join("20261018.zip");
        storage.archive(&dest).unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut html = String::new();
        archive
            .by_name("20261018/index.html")
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert_eq!(html, "<p>hi</p>");
    }
}
