//! Flat-file show store: artifact naming, persistence, and "latest show"
//! resolution.
//!
//! Artifacts are named `show-<slug>-<lang>.{txt,mp3}` where the slug is a
//! 14-digit UTC timestamp. Because the slug is fixed-width and zero-padded,
//! a descending lexicographic sort of filenames is a descending sort by
//! creation time, which is all "latest" needs. Lookups are plain directory
//! scans; the artifact count stays small (one file per language per day) and
//! scanning keeps freshness tied to the actual filesystem state.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

use crate::utils::ensure_writable_dir;
use crate::BoxError;

/// Format a run identifier from a UTC instant (`YYYYMMDDHHMMSS`).
///
/// Generated once per orchestration run; strictly increasing across runs on
/// the same clock, so it doubles as the sort key for "latest."
pub fn timestamp_slug(t: DateTime<Utc>) -> String {
    t.format("%Y%m%d%H%M%S").to_string()
}

/// Handle on the script, audio, and prompt directories.
#[derive(Debug, Clone)]
pub struct ShowStore {
    pub data_dir: PathBuf,
    pub shows_dir: PathBuf,
    pub prompts_dir: PathBuf,
}

impl ShowStore {
    pub fn new(data_dir: &str, shows_dir: &str, prompts_dir: &str) -> Self {
        Self {
            data_dir: PathBuf::from(data_dir),
            shows_dir: PathBuf::from(shows_dir),
            prompts_dir: PathBuf::from(prompts_dir),
        }
    }

    /// Create all storage directories and verify they are writable.
    /// Idempotent; called at the start of every run and at server boot.
    pub async fn ensure(&self) -> Result<(), BoxError> {
        for dir in [&self.data_dir, &self.shows_dir, &self.prompts_dir] {
            ensure_writable_dir(&dir.to_string_lossy()).await?;
        }
        Ok(())
    }

    /// Write a text artifact, creating parent directories as needed.
    /// Overwrites an existing file at the same path.
    pub async fn write_text(&self, path: &Path, text: &str) -> Result<(), BoxError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, text).await?;
        Ok(())
    }

    /// Path of the newest audio artifact across all languages, or `None`
    /// when the shows directory is empty or unreadable.
    #[instrument(level = "debug", skip(self))]
    pub async fn latest(&self) -> Option<PathBuf> {
        self.latest_matching(|name| name.ends_with(".mp3")).await
    }

    /// Path of the newest audio artifact for one language.
    #[instrument(level = "debug", skip(self))]
    pub async fn latest_for_language(&self, lang: &str) -> Option<PathBuf> {
        let suffix = format!("-{lang}.mp3");
        self.latest_matching(move |name| name.ends_with(&suffix))
            .await
    }

    async fn latest_matching<F>(&self, keep: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> bool,
    {
        let mut entries = fs::read_dir(&self.shows_dir).await.ok()?;
        let mut newest: Option<String> = None;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !keep(&name) {
                continue;
            }
            if newest.as_deref().is_none_or(|n| name.as_str() > n) {
                newest = Some(name);
            }
        }
        debug!(newest = ?newest, "latest show scan");
        newest.map(|name| self.shows_dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store(dir: &Path) -> ShowStore {
        ShowStore {
            data_dir: dir.join("data"),
            shows_dir: dir.join("shows"),
            prompts_dir: dir.join("prompts"),
        }
    }

    async fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).await.unwrap();
        fs::write(dir.join(name), b"x").await.unwrap();
    }

    #[test]
    fn test_timestamp_slug_format() {
        let t = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(timestamp_slug(t), "20250102030405");
    }

    #[test]
    fn test_timestamp_slug_monotonic_as_string() {
        let a = timestamp_slug(Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 59).unwrap());
        let b = timestamp_slug(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap());
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_latest_none_when_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert!(s.latest().await.is_none());
        assert!(s.latest_for_language("en").await.is_none());
    }

    #[tokio::test]
    async fn test_latest_picks_newest_filename() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        touch(&s.shows_dir, "show-20250101000000-en.mp3").await;
        touch(&s.shows_dir, "show-20250102000000-en.mp3").await;
        touch(&s.shows_dir, "not-audio.txt").await;

        let latest = s.latest().await.unwrap();
        assert!(latest.ends_with("show-20250102000000-en.mp3"));
    }

    #[tokio::test]
    async fn test_latest_for_language_filters_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        touch(&s.shows_dir, "show-20250101000000-en.mp3").await;
        touch(&s.shows_dir, "show-20250102000000-en.mp3").await;
        touch(&s.shows_dir, "show-20250103000000-fr.mp3").await;

        let en = s.latest_for_language("en").await.unwrap();
        assert!(en.ends_with("show-20250102000000-en.mp3"));
        let fr = s.latest_for_language("fr").await.unwrap();
        assert!(fr.ends_with("show-20250103000000-fr.mp3"));
        assert!(s.latest_for_language("es").await.is_none());
    }

    #[tokio::test]
    async fn test_greeting_prompt_not_in_latest_scan() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        touch(&s.prompts_dir, "language-select.mp3").await;
        assert!(s.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_write_text_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let path = s.data_dir.join("show-20250101000000-en.txt");
        s.write_text(&path, "first").await.unwrap();
        s.write_text(&path, "second").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.ensure().await.unwrap();
        s.ensure().await.unwrap();
        assert!(s.shows_dir.is_dir() && s.data_dir.is_dir() && s.prompts_dir.is_dir());
    }
}
