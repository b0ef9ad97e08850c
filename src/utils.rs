//! Small helpers shared across the pipeline: log-safe truncation and
//! output-directory validation.

use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

use crate::BoxError;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes with an ellipsis and byte
/// count appended, so a full monologue script never floods the log. The cut
/// lands on a char boundary, since scripts are model output full of curly
/// quotes and other multibyte punctuation.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if missing, then performs a write test by creating
/// and immediately deleting a probe file. Safe to call repeatedly.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), BoxError> {
    fs::create_dir_all(path).await?;
    // Small sync probe write; simpler error surface than async here.
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
