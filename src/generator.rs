//! Generation orchestrator: the end-to-end pipeline for one show run.
//!
//! Sequencing matters here. Fetch, enrichment, and composition happen once;
//! the primary language (first configured) is produced first and its failure
//! aborts the run. Secondary languages then fan out concurrently, and each
//! one is isolated: a failed French translation is recorded as a
//! [`LanguageOutcome::Failed`] without touching the English artifacts or the
//! sibling languages. The run id is generated exactly once, after
//! composition, so every artifact of a run shares one slug.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument};

use crate::api::ChatClient;
use crate::composer;
use crate::config::Config;
use crate::digg;
use crate::enrich;
use crate::models::{Artifact, ArtifactKind, LanguageOutcome, RunReport};
use crate::storage::{timestamp_slug, ShowStore};
use crate::translator;
use crate::tts::SpeechClient;
use crate::BoxError;

/// Stories fetched per run.
const STORY_BATCH: usize = 3;
/// Concurrent secondary-language translate+synthesize pairs.
const LANG_CONCURRENCY: usize = 4;

/// Run the full pipeline for every configured language.
#[instrument(level = "info", skip_all)]
pub async fn run_generate(
    config: &Config,
    chat: &ChatClient,
    speech: &SpeechClient,
    store: &ShowStore,
) -> Result<RunReport, BoxError> {
    store.ensure().await?;

    info!("Fetching trending stories");
    let mut stories = digg::fetch_top_stories(config, STORY_BATCH).await?;
    if stories.is_empty() {
        return Err("No stories available from the feed".into());
    }

    if config.fetch_article_content {
        info!("Enriching stories with article summaries");
        stories = enrich::enrich_stories(chat, config, stories).await;
    }

    info!("Composing show script");
    let script = composer::compose(chat, &stories).await?;

    let run_id = timestamp_slug(Utc::now());
    let base = format!("show-{run_id}");

    // Primary language first; its artifacts must exist before any secondary
    // work begins, and its failure is the run's failure.
    let primary = config.primary_language().to_string();
    info!(lang = %primary, run_id = %run_id, "Producing primary language");
    let primary_artifacts = produce_language(config, speech, store, &base, &primary, &script).await?;

    let secondary_langs: Vec<String> = config
        .languages
        .iter()
        .filter(|l| *l != &primary)
        .cloned()
        .collect();

    let mut outcomes = vec![LanguageOutcome::Ok {
        lang: primary.clone(),
        artifacts: primary_artifacts,
    }];
    let secondary = secondary_outcomes(&secondary_langs, |lang| {
        let script = script.clone();
        let base = base.clone();
        async move {
            info!(lang = %lang, "Translating script");
            let translated = translator::translate(chat, &script, &lang).await?;
            produce_language(config, speech, store, &base, &lang, &translated).await
        }
    })
    .await;
    outcomes.extend(secondary);

    let artifacts: Vec<Artifact> = outcomes
        .iter()
        .filter_map(|o| match o {
            LanguageOutcome::Ok { artifacts, .. } => Some(artifacts.clone()),
            LanguageOutcome::Failed { .. } => None,
        })
        .flatten()
        .collect();

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, LanguageOutcome::Failed { .. }))
        .count();
    info!(
        run_id = %run_id,
        artifacts = artifacts.len(),
        languages = outcomes.len(),
        failed,
        "Generation run complete"
    );

    Ok(RunReport {
        run_id,
        artifacts,
        languages: outcomes,
    })
}

/// Persist the script and synthesize the audio for one language.
async fn produce_language(
    config: &Config,
    speech: &SpeechClient,
    store: &ShowStore,
    base: &str,
    lang: &str,
    script: &str,
) -> Result<Vec<Artifact>, BoxError> {
    let script_path = store.data_dir.join(format!("{base}-{lang}.txt"));
    store.write_text(&script_path, script).await?;

    let voice = config.voice_for(lang);
    info!(lang = %lang, voice = %voice, "Synthesizing audio");
    let audio_path = speech
        .synthesize_show(script, &store.shows_dir, &format!("{base}-{lang}"), voice)
        .await?;

    Ok(vec![
        Artifact {
            lang: lang.to_string(),
            kind: ArtifactKind::Script,
            path: script_path,
        },
        Artifact {
            lang: lang.to_string(),
            kind: ArtifactKind::Audio,
            path: audio_path,
        },
    ])
}

/// Fan secondary languages out concurrently, isolating failures.
///
/// Results come back in configuration order regardless of completion order,
/// and every language yields an outcome: artifacts on success, a logged
/// reason on failure. One language's error never aborts its siblings.
async fn secondary_outcomes<F, Fut>(langs: &[String], produce: F) -> Vec<LanguageOutcome>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<Artifact>, BoxError>>,
{
    stream::iter(langs.iter().cloned())
        .map(|lang| {
            let fut = produce(lang.clone());
            async move {
                match fut.await {
                    Ok(artifacts) => LanguageOutcome::Ok { lang, artifacts },
                    Err(e) => {
                        error!(lang = %lang, error = %e, "Secondary language failed; skipping");
                        LanguageOutcome::Failed {
                            lang,
                            reason: e.to_string(),
                        }
                    }
                }
            }
        })
        .buffered(LANG_CONCURRENCY)
        .collect()
        .await
}
