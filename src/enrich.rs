//! Optional content enrichment: fetch each story's linked article and
//! produce a short factual summary for the composer.
//!
//! Everything here degrades silently. A story whose article cannot be
//! fetched, parsed, or summarized simply proceeds without a summary; the
//! run itself is never aborted from this module.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::api::{ChatClient, ChatPrompt};
use crate::config::Config;
use crate::models::Story;
use crate::BoxError;

const SUMMARIZER_SYSTEM: &str =
    "You are a concise news editor who writes clear, reliable summaries for radio.";

/// How many article fetch+summarize tasks run at once. Order of results is
/// preserved so the composed script keeps the feed's story order.
const ENRICH_CONCURRENCY: usize = 4;

/// Extracted readable content of an article page.
#[derive(Debug, Default)]
pub struct ArticleContent {
    pub title: String,
    pub text: String,
}

/// Enrich each story with an article summary where possible.
#[instrument(level = "info", skip_all, fields(stories = stories.len()))]
pub async fn enrich_stories(chat: &ChatClient, config: &Config, stories: Vec<Story>) -> Vec<Story> {
    let enriched: Vec<Story> = stream::iter(stories)
        .map(|story| async move {
            match enrich_story(chat, config, &story).await {
                Some(summary) => Story {
                    summary: Some(summary),
                    ..story
                },
                None => story,
            }
        })
        .buffered(ENRICH_CONCURRENCY)
        .collect()
        .await;

    let summarized = enriched.iter().filter(|s| s.summary.is_some()).count();
    info!(total = enriched.len(), summarized, "Enrichment complete");
    enriched
}

async fn enrich_story(chat: &ChatClient, config: &Config, story: &Story) -> Option<String> {
    let article = match fetch_article_content(config, &story.url).await {
        Ok(article) => article,
        Err(e) => {
            warn!(url = %story.url, error = %e, "Article fetch failed; skipping summary");
            return None;
        }
    };
    if article.text.is_empty() {
        debug!(url = %story.url, "No readable article text");
        return None;
    }

    let title = if article.title.is_empty() {
        story.title.clone()
    } else {
        article.title
    };
    match summarize_article(chat, config, &title, &story.url, &article.text).await {
        Ok(summary) if !summary.is_empty() => Some(summary),
        Ok(_) => None,
        Err(e) => {
            warn!(url = %story.url, error = %e, "Summarization failed; skipping summary");
            None
        }
    }
}

/// Fetch an article page and extract its readable text.
#[instrument(level = "debug", skip(config))]
pub async fn fetch_article_content(config: &Config, url: &str) -> Result<ArticleContent, BoxError> {
    let client = reqwest::Client::builder()
        .user_agent(&config.fetch_user_agent)
        .timeout(Duration::from_millis(config.fetch_timeout_ms))
        .redirect(reqwest::redirect::Policy::limited(3))
        .build()?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(format!("article fetch failed with status {}", response.status()).into());
    }
    let html = response.text().await?;
    Ok(extract_readable(&html))
}

/// Pull a title and paragraph text out of an HTML document.
///
/// Prefers `<article>` content, falls back to `<main>` and then the whole
/// body, so the monologue summary isn't fed a nav bar. Whitespace is
/// collapsed to single spaces within paragraphs.
pub fn extract_readable(html: &str) -> ArticleContent {
    let document = Html::parse_document(html);
    let title_sel = Selector::parse("title").unwrap();

    let title = document
        .select(&title_sel)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<Vec<_>>().join(" ")))
        .unwrap_or_default();

    let mut text = String::new();
    for scope in ["article p", "main p", "body p"] {
        let sel = match Selector::parse(scope) {
            Ok(sel) => sel,
            Err(_) => continue,
        };
        let paragraphs: Vec<String> = document
            .select(&sel)
            .map(|p| collapse_whitespace(&p.text().collect::<Vec<_>>().join(" ")))
            .filter(|p| !p.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            text = paragraphs.join("\n");
            break;
        }
    }
    if text.is_empty() {
        // Last resort: all text nodes, flattened.
        let body_sel = Selector::parse("body").unwrap();
        if let Some(body) = document.select(&body_sel).next() {
            text = collapse_whitespace(&body.text().collect::<Vec<_>>().join(" "));
        }
    }

    ArticleContent { title, text }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Summarize an article excerpt for the radio host.
async fn summarize_article(
    chat: &ChatClient,
    config: &Config,
    title: &str,
    url: &str,
    text: &str,
) -> Result<String, BoxError> {
    let excerpt: String = text.chars().take(config.summary_max_chars).collect();
    if excerpt.is_empty() {
        return Ok(String::new());
    }

    let prompt = ChatPrompt {
        system: SUMMARIZER_SYSTEM.to_string(),
        user: format!(
            "Summarize the following news article for a radio host. Keep it factual and \
concise, capturing the main point, key context, and any implications listeners care about.

Constraints:
- 6–9 sentences total.
- Plain language, no bullet points, no brackets.
- Include context and why it matters for everyday listeners.
- Do not speculate beyond the excerpt.

Title: {}
URL: {url}
Excerpt:
\"\"\"
{excerpt}
\"\"\"",
            if title.is_empty() { "(untitled)" } else { title }
        ),
        temperature: Some(0.4),
    };
    chat.complete_with_backoff(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_readable_prefers_article_paragraphs() {
        let html = r#"<html><head><title> The   Big  Story </title></head>
            <body><nav><p>Menu item</p></nav>
            <article><p>First  paragraph.</p><p>Second paragraph.</p></article>
            </body></html>"#;
        let content = extract_readable(html);
        assert_eq!(content.title, "The Big Story");
        assert_eq!(content.text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_extract_readable_falls_back_to_body() {
        let html = "<html><body>Just loose text, no paragraphs</body></html>";
        let content = extract_readable(html);
        assert_eq!(content.text, "Just loose text, no paragraphs");
    }

    #[test]
    fn test_extract_readable_empty_document() {
        let content = extract_readable("");
        assert!(content.title.is_empty());
        assert!(content.text.is_empty());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
    }
}
