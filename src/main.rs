//! # News Hotline
//!
//! A daily audio "news show" generator and server. The pipeline pulls
//! trending stories with top comments from a feed source, composes a
//! single-voice radio monologue through an LLM, optionally translates it
//! into additional languages, synthesizes per-language audio, and serves
//! the newest show over HTTP and a Twilio voice menu.
//!
//! ## Usage
//!
//! ```sh
//! news_hotline serve      # HTTP + IVR server
//! news_hotline generate   # run the pipeline once
//! news_hotline greeting   # synthesize the IVR greeting prompt
//! news_hotline cron       # freshness check against PUBLIC_BASE_URL
//! ```
//!
//! ## Architecture
//!
//! One generation run is a strict sequence: fetch stories, optionally
//! enrich them with article summaries, compose one script, then produce a
//! script+audio artifact pair per configured language. The primary language
//! is produced first and is fatal on failure; secondary languages fan out
//! concurrently and fail independently. Artifacts are flat files named by a
//! per-run UTC timestamp slug, which is also how "latest show" is resolved.

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod composer;
mod config;
mod cron;
mod digg;
mod enrich;
mod generator;
mod models;
mod server;
mod storage;
mod translator;
mod tts;
mod twiml;
mod utils;

use api::ChatClient;
use cli::{Cli, Command};
use config::Config;
use server::AppState;
use storage::ShowStore;
use tts::SpeechClient;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    let config = Arc::new(Config::from_opts(args.opts));
    debug!(languages = ?config.languages, base_url = %config.public_base_url, "Configuration resolved");

    match args.command {
        Command::Serve => {
            info!("news_hotline server starting up");
            let state = Arc::new(AppState::new(config));
            server::serve(state).await
        }
        Command::Generate => {
            info!("Running generation pipeline once");
            let store = ShowStore::new(&config.data_dir, &config.shows_dir, &config.prompts_dir);
            let chat = ChatClient::new(&config);
            let speech = SpeechClient::new(&config);
            let report = generator::run_generate(&config, &chat, &speech, &store).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Greeting => {
            let store = ShowStore::new(&config.data_dir, &config.shows_dir, &config.prompts_dir);
            store.ensure().await?;
            let speech = SpeechClient::new(&config);
            let out_path = store.prompts_dir.join("language-select.mp3");
            let path = speech
                .synthesize_prompt_once(&config.greeting_text, &out_path, config.greeting_voice())
                .await?;
            info!(path = %path.display(), "Greeting prompt ready");
            info!(
                url = %format!("{}/prompts/language-select.mp3", config.public_base_url),
                "Greeting prompt URL"
            );
            Ok(())
        }
        Command::Cron => {
            info!("Running freshness check");
            let report = cron::check_and_maybe_trigger(&config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
