//! Freshness monitor: the scheduled "is there a current show?" check.
//!
//! Runs against the server's public interface rather than the filesystem,
//! since the scheduler may live in a different process or deployment than
//! the store. Every configured language is probed (no short-circuit, so the
//! report is complete); staleness is judged from the newest timestamp
//! embedded in any returned filename. A single trigger regenerates all
//! languages together, matching the orchestrator's all-languages-per-run
//! design. Note that one missing language forces a full regeneration even
//! when the newest present language is fresh; that is the intended policy.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::BoxError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

static SHOW_TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"show-(\d{14})").unwrap());

/// Probe result for one language.
#[derive(Debug, Clone, Serialize)]
pub struct LangStatus {
    pub lang: String,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Missing,
}

/// Status and body returned by the generation trigger.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerOutcome {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Full report of one freshness check.
#[derive(Debug, Clone, Serialize)]
pub struct FreshnessReport {
    pub should_generate: bool,
    pub results: Vec<LangStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_response: Option<TriggerOutcome>,
}

#[derive(Deserialize)]
struct LatestUrlBody {
    url: String,
}

/// Parse the 14-digit UTC timestamp embedded in a show filename or URL.
/// Malformed or absent slugs yield `None` rather than an error.
pub fn extract_timestamp(url: &str) -> Option<DateTime<Utc>> {
    let captures = SHOW_TIMESTAMP.captures(url)?;
    NaiveDateTime::parse_from_str(&captures[1], "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Decide whether a generation run is needed.
///
/// True when any language is missing, when no timestamp could be observed at
/// all, or when the newest observed show is older than 24 hours.
pub fn should_generate(results: &[LangStatus], now: DateTime<Utc>) -> bool {
    let any_missing = results.iter().any(|r| r.status == ProbeStatus::Missing);
    let newest = results
        .iter()
        .filter_map(|r| r.url.as_deref())
        .filter_map(extract_timestamp)
        .max();
    let stale = match newest {
        Some(newest) => now - newest > TimeDelta::hours(24),
        None => true,
    };
    any_missing || stale
}

/// Probe every configured language's latest-show endpoint and trigger one
/// generation run when the show set is missing or stale.
#[instrument(level = "info", skip_all)]
pub async fn check_and_maybe_trigger(config: &Config) -> Result<FreshnessReport, BoxError> {
    let admin_key = config
        .admin_api_key
        .as_deref()
        .ok_or("ADMIN_API_KEY is required for the freshness check")?;
    let base = &config.public_base_url;
    let http = reqwest::Client::new();

    let mut results = Vec::with_capacity(config.languages.len());
    for lang in &config.languages {
        let endpoint = format!("{base}/shows/latest-url/{lang}");
        let url = probe_latest_url(&http, &endpoint).await;
        match &url {
            Some(url) => info!(lang = %lang, url = %url, "Latest show present"),
            None => warn!(lang = %lang, "No show available"),
        }
        results.push(LangStatus {
            lang: lang.clone(),
            status: if url.is_some() {
                ProbeStatus::Ok
            } else {
                ProbeStatus::Missing
            },
            url,
        });
    }

    let trigger = should_generate(&results, Utc::now());
    let generate_response = if trigger {
        info!("Show set missing or stale; triggering generation");
        let response = http
            .post(format!("{base}/admin/generate"))
            .header("x-admin-key", admin_key)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::Value::String(text));
        info!(status, "Generation trigger finished");
        Some(TriggerOutcome { status, body })
    } else {
        info!("Latest show is fresh; nothing to do");
        None
    };

    Ok(FreshnessReport {
        should_generate: trigger,
        results,
        generate_response,
    })
}

/// One latest-url probe; every failure mode collapses to `None`.
async fn probe_latest_url(http: &reqwest::Client, endpoint: &str) -> Option<String> {
    let response = http
        .get(endpoint)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    response
        .json::<LatestUrlBody>()
        .await
        .ok()
        .map(|body| body.url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn status(lang: &str, url: Option<&str>) -> LangStatus {
        LangStatus {
            lang: lang.to_string(),
            status: if url.is_some() {
                ProbeStatus::Ok
            } else {
                ProbeStatus::Missing
            },
            url: url.map(String::from),
        }
    }

    #[test]
    fn test_extract_timestamp() {
        let t = extract_timestamp("https://x.test/shows/show-20250102030405-en.mp3").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn test_extract_timestamp_rejects_malformed() {
        assert!(extract_timestamp("show-2025010203-en.mp3").is_none());
        assert!(extract_timestamp("episode-20250102030405.mp3").is_none());
        assert!(extract_timestamp("show-99999999999999-en.mp3").is_none());
    }

    #[test]
    fn test_no_shows_always_triggers() {
        let now = Utc::now();
        assert!(should_generate(&[status("en", None), status("fr", None)], now));
        assert!(should_generate(&[], now));
    }

    #[test]
    fn test_fresh_show_does_not_trigger() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 23, 0, 0).unwrap();
        // Newest artifact is exactly 23 hours old.
        let results = [
            status("en", Some("https://x.test/shows/show-20250102000000-en.mp3")),
            status("fr", Some("https://x.test/shows/show-20250101000000-fr.mp3")),
        ];
        assert!(!should_generate(&results, now));
    }

    #[test]
    fn test_stale_show_triggers() {
        let now = Utc.with_ymd_and_hms(2025, 1, 3, 1, 0, 0).unwrap();
        // Newest artifact is exactly 25 hours old.
        let results = [status(
            "en",
            Some("https://x.test/shows/show-20250102000000-en.mp3"),
        )];
        assert!(should_generate(&results, now));
    }

    #[test]
    fn test_missing_language_triggers_despite_fresh_sibling() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 1, 0, 0).unwrap();
        let results = [
            status("en", Some("https://x.test/shows/show-20250102000000-en.mp3")),
            status("fr", None),
        ];
        assert!(should_generate(&results, now));
    }

    #[test]
    fn test_unparseable_url_counts_as_no_timestamp() {
        let now = Utc::now();
        // An "ok" probe whose filename has no usable slug still forces a
        // run, since no timestamp was observed at all.
        let results = [status("en", Some("https://x.test/shows/latest.mp3"))];
        assert!(should_generate(&results, now));
    }
}
