//! Data models for stories, generated artifacts, and run reports.
//!
//! A generation run turns a batch of [`Story`] records into one
//! [`Artifact`] pair (script + audio) per configured language, all sharing
//! the run's timestamp slug. [`RunReport`] is the caller-facing record of
//! what a run produced, including an explicit per-language outcome so
//! secondary-language failures are observable and not just logged.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A trending story as returned by the feed source.
///
/// Immutable once fetched; `summary` is filled in by the optional
/// enrichment step and stays absent when enrichment is disabled or failed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub url: String,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A reader comment attached to a story.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
}

/// What kind of file an [`Artifact`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Script,
    Audio,
}

/// A persisted file belonging to one run and one language.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub lang: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Per-language result of a run's translate/synthesize stage.
///
/// The primary language never appears here as a failure (its failure aborts
/// the run); secondary languages report either their artifacts or the reason
/// they were skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LanguageOutcome {
    Ok {
        lang: String,
        artifacts: Vec<Artifact>,
    },
    Failed {
        lang: String,
        reason: String,
    },
}

impl LanguageOutcome {
    pub fn lang(&self) -> &str {
        match self {
            LanguageOutcome::Ok { lang, .. } => lang,
            LanguageOutcome::Failed { lang, .. } => lang,
        }
    }
}

/// The result of one end-to-end generation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Timestamp slug identifying the run (`YYYYMMDDHHMMSS`, UTC).
    pub run_id: String,
    /// Every artifact produced, across all languages that succeeded.
    pub artifacts: Vec<Artifact>,
    /// Outcome per configured language, primary first.
    pub languages: Vec<LanguageOutcome>,
}
