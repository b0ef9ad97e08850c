//! Runtime configuration, resolved once at startup.
//!
//! [`Config`] is built from the parsed CLI options and handed to components
//! by reference (or inside an `Arc` for the server), so there is a single
//! source of truth and no global mutable state.

use std::collections::HashMap;

use tracing::warn;

use crate::cli::Opts;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub public_base_url: String,
    pub admin_api_key: Option<String>,

    /// Configured language codes; the first entry is the primary language.
    pub languages: Vec<String>,

    pub digg_use_mock: bool,

    pub fetch_article_content: bool,
    pub fetch_timeout_ms: u64,
    pub fetch_user_agent: String,
    pub summary_max_chars: usize,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,

    pub eleven_api_key: String,
    pub eleven_voice_id: String,
    pub eleven_model_id: String,
    pub eleven_stability: f32,
    pub eleven_style: f32,
    lang_voice_map: HashMap<String, String>,

    pub greeting_text: String,
    pub greeting_voice_id: String,

    pub data_dir: String,
    pub shows_dir: String,
    pub prompts_dir: String,
}

impl Config {
    pub fn from_opts(opts: Opts) -> Self {
        let languages = parse_languages(&opts.languages);
        let lang_voice_map = parse_voice_map(&opts.lang_voice_map_json);

        Config {
            port: opts.port,
            public_base_url: opts.public_base_url.trim_end_matches('/').to_string(),
            admin_api_key: opts.admin_api_key.filter(|k| !k.is_empty()),
            languages,
            digg_use_mock: opts.digg_use_mock,
            fetch_article_content: opts.fetch_article_content,
            fetch_timeout_ms: opts.fetch_timeout_ms,
            fetch_user_agent: opts.fetch_user_agent,
            summary_max_chars: opts.summary_max_chars,
            openai_api_key: opts.openai_api_key,
            openai_model: opts.openai_model,
            openai_base_url: opts.openai_base_url.trim_end_matches('/').to_string(),
            eleven_api_key: opts.eleven_api_key,
            eleven_voice_id: opts.eleven_voice_id,
            eleven_model_id: opts.eleven_model_id,
            eleven_stability: opts.eleven_stability,
            eleven_style: opts.eleven_style,
            lang_voice_map,
            greeting_text: opts.greeting_text,
            greeting_voice_id: opts.greeting_voice_id,
            data_dir: opts.data_dir,
            shows_dir: opts.shows_dir,
            prompts_dir: opts.prompts_dir,
        }
    }

    /// The primary language: first configured entry, "en" if the list is
    /// somehow empty.
    pub fn primary_language(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or("en")
    }

    /// Resolve the synthesis voice for a language, falling back to the
    /// default voice id when no language-specific entry exists.
    pub fn voice_for(&self, lang: &str) -> &str {
        self.lang_voice_map
            .get(lang)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.eleven_voice_id)
    }

    /// Voice used for the greeting prompt: explicit override, then the
    /// primary-language voice, then the default voice id.
    pub fn greeting_voice(&self) -> &str {
        if !self.greeting_voice_id.is_empty() {
            &self.greeting_voice_id
        } else {
            self.voice_for(self.primary_language())
        }
    }
}

/// Parse a comma-separated language list, trimming whitespace and dropping
/// empties and duplicates while preserving order.
fn parse_languages(csv: &str) -> Vec<String> {
    let mut langs: Vec<String> = Vec::new();
    for part in csv.split(',') {
        let lang = part.trim();
        if !lang.is_empty() && !langs.iter().any(|l| l == lang) {
            langs.push(lang.to_string());
        }
    }
    if langs.is_empty() {
        langs.push("en".to_string());
    }
    langs
}

/// Parse the language→voice JSON map; a malformed value degrades to an
/// empty map rather than failing startup.
fn parse_voice_map(json: &str) -> HashMap<String, String> {
    match serde_json::from_str::<HashMap<String, String>>(json) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Invalid language voice map JSON; using empty map");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn config_from(args: &[&str]) -> Config {
        let mut argv = vec!["news_hotline", "serve"];
        argv.extend_from_slice(args);
        Config::from_opts(Cli::parse_from(argv).opts)
    }

    #[test]
    fn test_parse_languages_trims_and_dedupes() {
        assert_eq!(parse_languages("en, fr ,en,,es"), vec!["en", "fr", "es"]);
    }

    #[test]
    fn test_parse_languages_empty_defaults_to_en() {
        assert_eq!(parse_languages(" , "), vec!["en"]);
    }

    #[test]
    fn test_voice_fallbacks() {
        let cfg = config_from(&[
            "--eleven-voice-id",
            "default-voice",
            "--lang-voice-map-json",
            r#"{"fr":"voix-fr"}"#,
        ]);
        assert_eq!(cfg.voice_for("fr"), "voix-fr");
        assert_eq!(cfg.voice_for("en"), "default-voice");
        assert_eq!(cfg.voice_for("zz"), "default-voice");
        assert_eq!(cfg.greeting_voice(), "default-voice");
    }

    #[test]
    fn test_greeting_voice_override_wins() {
        let cfg = config_from(&[
            "--eleven-voice-id",
            "default-voice",
            "--greeting-voice-id",
            "greeter",
        ]);
        assert_eq!(cfg.greeting_voice(), "greeter");
    }

    #[test]
    fn test_bad_voice_map_degrades_to_empty() {
        let cfg = config_from(&[
            "--lang-voice-map-json",
            "not-json",
            "--eleven-voice-id",
            "v0",
        ]);
        assert_eq!(cfg.voice_for("fr"), "v0");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cfg = config_from(&["--public-base-url", "https://example.com/"]);
        assert_eq!(cfg.public_base_url, "https://example.com");
    }
}
