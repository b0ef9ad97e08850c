//! Script composer: turns a story batch into a single-voice radio monologue.
//!
//! The prompt instructs the model to write as one speaker, and
//! [`clean_to_single_voice`] is the safety net for the times it doesn't
//! listen: line-leading speaker labels are stripped and runs of blank lines
//! collapsed. The model remains the source of truth for content; the
//! post-pass only normalizes formatting.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument};

use crate::api::{ChatClient, ChatPrompt};
use crate::models::Story;
use crate::utils::truncate_for_log;
use crate::BoxError;

const COMPOSER_SYSTEM: &str = "You are a seasoned radio DJ who writes natural, engaging \
monologue scripts and speaks like a real person on air.";

/// Build the monologue prompt from the (possibly enriched) story batch.
///
/// Per story: title, the enrichment summary when present, and up to two
/// verbatim comments with `@handle` attribution.
pub fn build_prompt(stories: &[Story]) -> String {
    let items = stories
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let comments = s
                .comments
                .iter()
                .take(2)
                .map(|c| format!("- @{}: {}", c.author, c.text))
                .collect::<Vec<_>>()
                .join("\n");
            let summary_block = s
                .summary
                .as_deref()
                .map(|sum| format!("\nArticle summary:\n{sum}\n"))
                .unwrap_or_default();
            format!(
                "Story {}: {}\n{}Top comments:\n{}",
                idx + 1,
                s.title,
                summary_block,
                comments
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a seasoned radio DJ writing a real-to-life, single-voice monologue that reads and reacts to the latest headlines.

Goals:
- Sound human and in-the-moment: warm, wry, curious; morning-drive energy without hype.
- React naturally to each story with quick takes, light humor, or rhetorical questions.
- Use 1–2 brief listener quotes per story verbatim from the provided comments, with @handle attribution.
- Keep it accurate: do not invent facts beyond the provided stories/comments.

Style & pacing:
- Single speaker only. No speaker labels. No stage directions. No brackets.
- Short, varied sentences. Natural rhythm. Use punctuation for pacing (commas, dashes, ellipses).
- Avoid emojis and ALL CAPS. Keep buzzwords and corporate tone out.

Structure:
1) Quick hook/open welcome listeners to the proudly canadian operated Digg news hotline (1–2 lines).
2) For each story:
- plain-language headline,
- read the article summary and where appropriate give a one-sentence reaction to the story. Be funny and engaging with your reactions. Keep this listener entertained
- quick transition to the comments on the story and then read 1–2 listener quotes, give a quick reaction to the comments, then transition on.
3) Tight sign-off, end with a flattering Canadian compliment and tell the listeners to have a great day.

Length target: about 90–120 seconds when read aloud.

Important:
- You are provided per-story article summaries. Rely on them for factual content; do not invent details beyond the summaries and comments.

Stories and comments:
{items}"
    )
}

static SPEAKER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:Host(?:\s+[AB])?|DJ|Narrator|Speaker)\s*:\s*").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize model output to a single speaking voice.
///
/// Strips recognized line-leading speaker labels (Host, Host A/B, DJ,
/// Narrator, Speaker) while keeping the line content, and collapses three
/// or more consecutive newlines to a single blank line.
pub fn clean_to_single_voice(text: &str) -> String {
    let stripped = text
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            SPEAKER_LABEL.replace(line, "").into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS.replace_all(&stripped, "\n\n").trim().to_string()
}

/// Compose the monologue script for a story batch.
///
/// Fatal on completion failure or empty output: no script means no show.
#[instrument(level = "info", skip_all, fields(stories = stories.len()))]
pub async fn compose(chat: &ChatClient, stories: &[Story]) -> Result<String, BoxError> {
    let prompt = ChatPrompt {
        system: COMPOSER_SYSTEM.to_string(),
        user: build_prompt(stories),
        temperature: Some(0.7),
    };
    let raw = chat.complete_with_backoff(&prompt).await?;
    let cleaned = clean_to_single_voice(&raw);
    if cleaned.is_empty() {
        return Err("Empty script generated".into());
    }
    info!(
        chars = cleaned.len(),
        preview = %truncate_for_log(&cleaned, 200),
        "Composed show script"
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn story(title: &str, summary: Option<&str>, comments: &[(&str, &str)]) -> Story {
        Story {
            id: "s".into(),
            title: title.into(),
            url: "https://example.com".into(),
            comments: comments
                .iter()
                .map(|(a, t)| Comment {
                    author: a.to_string(),
                    text: t.to_string(),
                })
                .collect(),
            summary: summary.map(String::from),
        }
    }

    #[test]
    fn test_prompt_numbers_stories_and_quotes_comments() {
        let stories = vec![
            story("First headline", None, &[("alice", "wow"), ("bob", "meh")]),
            story("Second headline", None, &[]),
        ];
        let prompt = build_prompt(&stories);
        assert!(prompt.contains("Story 1: First headline"));
        assert!(prompt.contains("Story 2: Second headline"));
        assert!(prompt.contains("- @alice: wow"));
        assert!(prompt.contains("- @bob: meh"));
    }

    #[test]
    fn test_prompt_caps_comments_at_two() {
        let stories = vec![story(
            "Busy thread",
            None,
            &[("a", "1"), ("b", "2"), ("c", "3")],
        )];
        let prompt = build_prompt(&stories);
        assert!(prompt.contains("- @b: 2"));
        assert!(!prompt.contains("- @c: 3"));
    }

    #[test]
    fn test_prompt_includes_summary_block_when_present() {
        let with = build_prompt(&[story("T", Some("the gist"), &[])]);
        assert!(with.contains("Article summary:\nthe gist"));
        let without = build_prompt(&[story("T", None, &[])]);
        assert!(!without.contains("Article summary:"));
    }

    #[test]
    fn test_strip_speaker_labels() {
        assert_eq!(clean_to_single_voice("Host A: Good morning"), "Good morning");
        assert_eq!(clean_to_single_voice("host: hi"), "hi");
        assert_eq!(clean_to_single_voice("DJ:  spinning up"), "spinning up");
        assert_eq!(clean_to_single_voice("Narrator : once upon"), "once upon");
        assert_eq!(clean_to_single_voice("Speaker: hello"), "hello");
    }

    #[test]
    fn test_labels_only_stripped_at_line_start() {
        assert_eq!(
            clean_to_single_voice("thanks to our Host: the one and only"),
            "thanks to our Host: the one and only"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        let input = "intro\n\n\n\n\nsign-off";
        assert_eq!(clean_to_single_voice(input), "intro\n\nsign-off");
    }

    #[test]
    fn test_mixed_cleanup() {
        let input = "Host A: Good morning\n\n\n\nHost B: And welcome back\r\nplain line";
        assert_eq!(
            clean_to_single_voice(input),
            "Good morning\n\nAnd welcome back\nplain line"
        );
    }
}
