//! Speech synthesis via the ElevenLabs text-to-speech API.
//!
//! One voice per artifact; multi-speaker mixing is deliberately out of
//! scope. [`SpeechClient::synthesize_prompt_once`] exists for the IVR
//! greeting: it is idempotent so the prompt is not re-billed on every boot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::BoxError;

const ELEVEN_API_URL: &str = "https://api.elevenlabs.io/v1";
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(serde::Serialize)]
struct SynthesisRequest<'a> {
    model_id: &'a str,
    voice_settings: VoiceSettings,
    text: &'a str,
}

#[derive(serde::Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// Client for the ElevenLabs v1 text-to-speech endpoint.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    api_key: String,
    model_id: String,
    stability: f32,
    style: f32,
    base_url: String,
}

impl SpeechClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.eleven_api_key.clone(),
            model_id: config.eleven_model_id.clone(),
            stability: config.eleven_stability,
            style: config.eleven_style,
            base_url: ELEVEN_API_URL.to_string(),
        }
    }

    /// Convert text to audio bytes with the given voice.
    ///
    /// Configuration errors (missing credential or voice id) are fatal and
    /// surface immediately; they are never retried.
    #[instrument(level = "info", skip(self, text), fields(chars = text.len()))]
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, BoxError> {
        if self.api_key.is_empty() {
            return Err("Missing ELEVENLABS_API_KEY".into());
        }
        if voice_id.is_empty() {
            return Err("Missing ELEVENLABS_VOICE_ID".into());
        }

        let url = format!("{}/text-to-speech/{voice_id}", self.base_url);
        let payload = SynthesisRequest {
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.style,
            },
            text,
        };

        debug!(url = %url, "speech synthesis request");
        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&payload)
            .timeout(SYNTHESIS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("speech API error ({status}): {body}").into());
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Synthesize a show segment into `<output_dir>/<filename_base>.mp3`
    /// and return the written path.
    #[instrument(level = "info", skip(self, text), fields(base = %filename_base))]
    pub async fn synthesize_show(
        &self,
        text: &str,
        output_dir: &Path,
        filename_base: &str,
        voice_id: &str,
    ) -> Result<PathBuf, BoxError> {
        fs::create_dir_all(output_dir).await?;
        let out_path = output_dir.join(format!("{filename_base}.mp3"));
        let audio = self.synthesize(text, voice_id).await?;
        fs::write(&out_path, &audio).await?;
        info!(path = %out_path.display(), bytes = audio.len(), "Wrote audio artifact");
        Ok(out_path)
    }

    /// Synthesize a one-off prompt, skipping the API call entirely when the
    /// destination file already exists.
    #[instrument(level = "info", skip(self, text), fields(path = %out_path.display()))]
    pub async fn synthesize_prompt_once(
        &self,
        text: &str,
        out_path: &Path,
        voice_id: &str,
    ) -> Result<PathBuf, BoxError> {
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(out_path).await? {
            debug!("Prompt already synthesized; skipping");
            return Ok(out_path.to_path_buf());
        }
        let audio = self.synthesize(text, voice_id).await?;
        fs::write(out_path, &audio).await?;
        info!(bytes = audio.len(), "Wrote prompt audio");
        Ok(out_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: &str) -> SpeechClient {
        SpeechClient {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model_id: "eleven_multilingual_v2".into(),
            stability: 0.5,
            style: 0.5,
            base_url: "http://localhost:0".into(),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let err = client("").synthesize("hi", "voice").await.unwrap_err();
        assert!(err.to_string().contains("ELEVENLABS_API_KEY"));
    }

    #[tokio::test]
    async fn test_missing_voice_is_fatal() {
        let err = client("key").synthesize("hi", "").await.unwrap_err();
        assert!(err.to_string().contains("ELEVENLABS_VOICE_ID"));
    }

    #[tokio::test]
    async fn test_prompt_once_skips_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("language-select.mp3");
        fs::write(&out, b"existing audio").await.unwrap();

        // No credential configured: a synthesis attempt would fail, so a
        // returned path proves the call short-circuited.
        let path = client("")
            .synthesize_prompt_once("greeting", &out, "voice")
            .await
            .unwrap();
        assert_eq!(path, out);
        assert_eq!(fs::read(&out).await.unwrap(), b"existing audio");
    }

    #[test]
    fn test_payload_shape() {
        let payload = SynthesisRequest {
            model_id: "eleven_multilingual_v2",
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
            text: "hello",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
        assert_eq!(json["voice_settings"]["similarity_boost"], 0.5);
        assert_eq!(json["text"], "hello");
    }
}
