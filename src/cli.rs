//! Command-line interface definitions.
//!
//! Every option can be provided as a flag or an environment variable, so the
//! same binary works from a shell, a systemd unit, or a container. The
//! resolved options are turned into a [`crate::config::Config`] once at
//! startup and passed by reference into each component.

use clap::{Parser, Subcommand};

/// Daily audio news hotline: generation pipeline plus HTTP/IVR server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub opts: Opts,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and telephony server
    Serve,
    /// Run the generation pipeline once and exit
    Generate,
    /// Synthesize the IVR greeting prompt once and exit
    Greeting,
    /// Run the freshness check against the configured base URL once
    Cron,
}

/// Runtime options, mirroring the deployment environment surface.
#[derive(clap::Args, Debug)]
pub struct Opts {
    /// Port for the HTTP server
    #[arg(long, global = true, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Public base URL used in generated links and TwiML
    #[arg(long, global = true, env = "PUBLIC_BASE_URL", default_value = "http://localhost:3000")]
    pub public_base_url: String,

    /// Shared secret required by POST /admin/generate (x-admin-key header)
    #[arg(long, global = true, env = "ADMIN_API_KEY")]
    pub admin_api_key: Option<String>,

    /// Comma-separated language codes; the first is the primary language
    #[arg(long, global = true, env = "LANGUAGES", default_value = "en,fr")]
    pub languages: String,

    /// Serve canned stories instead of calling the feed API
    #[arg(
        long,
        global = true,
        env = "DIGG_USE_MOCK",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub digg_use_mock: bool,

    /// Fetch and summarize linked articles before composing the script
    #[arg(
        long,
        global = true,
        env = "FETCH_ARTICLE_CONTENT",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub fetch_article_content: bool,

    /// Timeout for article fetches, in milliseconds
    #[arg(long, global = true, env = "FETCH_TIMEOUT_MS", default_value_t = 10_000)]
    pub fetch_timeout_ms: u64,

    /// User-Agent header for article fetches
    #[arg(
        long,
        global = true,
        env = "FETCH_USER_AGENT",
        default_value = "NewsHotline/0.1 (+https://example.com)"
    )]
    pub fetch_user_agent: String,

    /// Maximum article excerpt length passed to the summarizer
    #[arg(long, global = true, env = "SUMMARY_MAX_CHARS", default_value_t = 5000)]
    pub summary_max_chars: usize,

    /// OpenAI-compatible API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", default_value = "")]
    pub openai_api_key: String,

    /// Completion model
    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = "gpt-5")]
    pub openai_model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// ElevenLabs API key
    #[arg(long, global = true, env = "ELEVENLABS_API_KEY", default_value = "")]
    pub eleven_api_key: String,

    /// Default synthesis voice id
    #[arg(long, global = true, env = "ELEVENLABS_VOICE_ID", default_value = "")]
    pub eleven_voice_id: String,

    /// ElevenLabs model id
    #[arg(long, global = true, env = "ELEVENLABS_MODEL_ID", default_value = "eleven_multilingual_v2")]
    pub eleven_model_id: String,

    /// Voice stability setting (0.0 - 1.0)
    #[arg(long, global = true, env = "ELEVENLABS_VOICE_STABILITY", default_value_t = 0.5)]
    pub eleven_stability: f32,

    /// Voice style / similarity boost setting (0.0 - 1.0)
    #[arg(long, global = true, env = "ELEVENLABS_VOICE_STYLE", default_value_t = 0.5)]
    pub eleven_style: f32,

    /// JSON object mapping language codes to voice ids
    #[arg(long, global = true, env = "ELEVENLABS_LANG_VOICE_MAP_JSON", default_value = "{}")]
    pub lang_voice_map_json: String,

    /// Text spoken/played by the IVR language menu
    #[arg(
        long,
        global = true,
        env = "GREETING_TEXT",
        default_value = "Welcome to the Canadian-run Digg news hotline! For English, press 1. Pour le français, appuyez sur 2."
    )]
    pub greeting_text: String,

    /// Voice id override for the greeting prompt
    #[arg(long, global = true, env = "GREETING_VOICE_ID", default_value = "")]
    pub greeting_voice_id: String,

    /// Directory for script artifacts
    #[arg(long, global = true, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Directory for audio artifacts (served at /shows)
    #[arg(long, global = true, env = "SHOWS_DIR", default_value = "./public/shows")]
    pub shows_dir: String,

    /// Directory for IVR prompts (served at /prompts)
    #[arg(long, global = true, env = "PROMPTS_DIR", default_value = "./public/prompts")]
    pub prompts_dir: String,
}
