//! Script translation into secondary languages.
//!
//! A small fixed table maps the ISO-like codes we configure to full language
//! names for prompting. Unknown codes are passed through verbatim as the
//! "language name": the completion service usually infers the right language
//! from the code, so this degrades gracefully instead of failing the run.

use tracing::{info, instrument};

use crate::api::{ChatClient, ChatPrompt};
use crate::BoxError;

const TRANSLATOR_SYSTEM: &str = "You are a professional media translator. You translate \
scripts for radio, preserving tone and style while remaining natural and idiomatic.";

/// Full language name for a configured code, or the code itself when
/// unrecognized.
pub fn language_name(code: &str) -> &str {
    match code.to_lowercase().as_str() {
        "en" => "English",
        "fr" => "French",
        "es" => "Spanish",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        _ => code,
    }
}

/// Translate a composed monologue into the target language, preserving the
/// broadcast tone. Fails on completion failure or empty output.
#[instrument(level = "info", skip(chat, text))]
pub async fn translate(chat: &ChatClient, text: &str, target_lang: &str) -> Result<String, BoxError> {
    let lang_name = language_name(target_lang);
    let prompt = ChatPrompt {
        system: TRANSLATOR_SYSTEM.to_string(),
        user: format!(
            "Translate the following radio host monologue into {lang_name}. Keep a natural, \
broadcast-ready tone. Do not add headings or labels.\n\n\"\"\"\n{text}\n\"\"\""
        ),
        temperature: Some(0.3),
    };
    let out = chat.complete_with_backoff(&prompt).await?;
    if out.is_empty() {
        return Err("Empty translation".into());
    }
    info!(lang = %target_lang, chars = out.len(), "Translated script");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_names() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("FR"), "French");
        assert_eq!(language_name("zh"), "Chinese");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(language_name("tlh"), "tlh");
        assert_eq!(language_name(""), "");
    }
}
