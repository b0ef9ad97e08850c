//! Story source adapter for the Digg trending feed.
//!
//! The real feed API is not yet available, so mock mode (the default)
//! serves a canned batch of stories with top comments. With mock mode off
//! the adapter returns an empty list, which the orchestrator treats as a
//! fatal condition for the run.

use tracing::{info, instrument};

use crate::config::Config;
use crate::models::{Comment, Story};
use crate::BoxError;

/// Fetch up to `limit` trending stories with their top comments.
#[instrument(level = "info", skip(config))]
pub async fn fetch_top_stories(config: &Config, limit: usize) -> Result<Vec<Story>, BoxError> {
    if config.digg_use_mock {
        let mut stories = mock_stories();
        stories.truncate(limit);
        info!(count = stories.len(), "Serving mock trending stories");
        return Ok(stories);
    }

    // TODO: call the real feed endpoint once it ships; the response maps to
    // Story { id, title, url, comments: [{ author, text }] }.
    info!("Feed API unavailable and mock disabled; no stories");
    Ok(Vec::new())
}

fn comment(author: &str, text: &str) -> Comment {
    Comment {
        author: author.to_string(),
        text: text.to_string(),
    }
}

fn mock_stories() -> Vec<Story> {
    vec![
        Story {
            id: "1".into(),
            title: "Drew Barrymore Wants To Remake Cult Horror Comedy \"Death Becomes Her\""
                .into(),
            url: "https://gizmodo.com/drew-barrymore-wants-to-remake-cult-horror-comedy-death-becomes-her-with-adam-sandler-jennifer-anniston-2000651819".into(),
            comments: vec![
                comment("techfan88", "Please for the love of god stop remaking movies."),
                comment("skeptic42", "Bruce Willis was so terribly miscast in that film."),
            ],
            summary: None,
        },
        Story {
            id: "2".into(),
            title: "LEGO SEGA Genesis Controller Officially Announced".into(),
            url: "https://www.thebrickfan.com/lego-sega-genesis-controller-40769-officially-announced/".into(),
            comments: vec![
                comment("urbanist", "The Gameboy is damn impressive"),
                comment("commuter", "I like how creative they've been with items like this."),
            ],
            summary: None,
        },
        Story {
            id: "3".into(),
            title: "Scientists Detect Possible Signs of Life in Exoplanet Atmosphere".into(),
            url: "https://arstechnica.com/gaming/2025/09/over-30-years-later-a-rare-laserdisc-game-console-gets-its-first-pc-emulator/".into(),
            comments: vec![
                comment("astro_n00b", "This is like the pre-3DO."),
                comment(
                    "mathguy",
                    "I thought I had at least a passing familiarity with all of the retro consoles but this one is new to me.",
                ),
            ],
            summary: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn config(mock: bool) -> Config {
        let mock_arg = format!("--digg-use-mock={mock}");
        Config::from_opts(Cli::parse_from(["news_hotline", "serve", mock_arg.as_str()]).opts)
    }

    #[tokio::test]
    async fn test_mock_stories_respect_limit() {
        let stories = fetch_top_stories(&config(true), 2).await.unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, "1");
        assert_eq!(stories[0].comments.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_disabled_returns_empty() {
        let stories = fetch_top_stories(&config(false), 3).await.unwrap();
        assert!(stories.is_empty());
    }
}
