//! HTTP and telephony front end.
//!
//! Serves the latest-show lookups and static artifacts, exposes the
//! admin-triggered generation endpoint, and implements the Twilio voice
//! webhook flow. Admin endpoints return structured JSON errors; the voice
//! endpoints always answer with TwiML, degrading to a spoken apology on any
//! unexpected failure.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use crate::api::ChatClient;
use crate::config::Config;
use crate::generator;
use crate::storage::ShowStore;
use crate::tts::SpeechClient;
use crate::twiml;
use crate::BoxError;

const GREETING_PROMPT_FILE: &str = "language-select.mp3";

pub struct AppState {
    pub config: Arc<Config>,
    pub store: ShowStore,
    pub chat: ChatClient,
    pub speech: SpeechClient,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let store = ShowStore::new(&config.data_dir, &config.shows_dir, &config.prompts_dir);
        let chat = ChatClient::new(&config);
        let speech = SpeechClient::new(&config);
        Self {
            config,
            store,
            chat,
            speech,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let shows_dir = state.store.shows_dir.clone();
    let prompts_dir = state.store.prompts_dir.clone();

    Router::new()
        .route("/health", get(health))
        .route("/shows/latest-url", get(latest_url))
        .route("/shows/latest-url/{lang}", get(latest_url_for_lang))
        .route("/admin/generate", post(admin_generate))
        .route("/twilio/voice", post(twilio_voice))
        .route("/twilio/voice/route", post(twilio_voice_route))
        .route("/api/route", post(twilio_voice_route))
        .nest_service("/shows", ServeDir::new(shows_dir))
        .nest_service("/prompts", ServeDir::new(prompts_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and run the server, pre-generating the greeting prompt when the
/// speech service is configured (failure is non-fatal: the menu falls back
/// to a spoken greeting).
pub async fn serve(state: Arc<AppState>) -> Result<(), BoxError> {
    state.store.ensure().await?;

    match ensure_greeting_prompt(&state).await {
        Ok(path) => info!(path = %path.display(), "Greeting prompt ready"),
        Err(e) => warn!(error = %e, "Greeting prompt generation skipped or failed"),
    }

    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, base_url = %state.config.public_base_url, "Server listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn ensure_greeting_prompt(state: &AppState) -> Result<std::path::PathBuf, BoxError> {
    let out_path = state.store.prompts_dir.join(GREETING_PROMPT_FILE);
    state
        .speech
        .synthesize_prompt_once(
            &state.config.greeting_text,
            &out_path,
            state.config.greeting_voice(),
        )
        .await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn show_url(config: &Config, path: &std::path::Path) -> Option<String> {
    let file = path.file_name()?.to_string_lossy();
    Some(format!("{}/shows/{}", config.public_base_url, file))
}

async fn latest_url(State(state): State<Arc<AppState>>) -> Response {
    match state
        .store
        .latest()
        .await
        .and_then(|p| show_url(&state.config, &p))
    {
        Some(url) => Json(json!({ "url": url })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No show available" })),
        )
            .into_response(),
    }
}

async fn latest_url_for_lang(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
) -> Response {
    match state
        .store
        .latest_for_language(&lang)
        .await
        .and_then(|p| show_url(&state.config, &p))
    {
        Some(url) => Json(json!({ "url": url })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No show available for {lang}") })),
        )
            .into_response(),
    }
}

/// Run the generation pipeline synchronously on behalf of the scheduler.
#[instrument(level = "info", skip_all)]
async fn admin_generate(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(expected) = state.config.admin_api_key.as_deref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "ADMIN_API_KEY is not configured" })),
        )
            .into_response();
    };
    let provided = headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided != expected {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid admin key" })),
        )
            .into_response();
    }

    match generator::run_generate(&state.config, &state.chat, &state.speech, &state.store).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(error = %e, "Generation run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn xml_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

/// Initial voice webhook: play (or speak) the language menu and gather one
/// digit.
async fn twilio_voice(State(state): State<Arc<AppState>>) -> Response {
    let action = format!("{}/twilio/voice/route", state.config.public_base_url);
    let greeting = match ensure_greeting_prompt(&state).await {
        Ok(_) => twiml::Greeting::Play(format!(
            "{}/prompts/{GREETING_PROMPT_FILE}",
            state.config.public_base_url
        )),
        Err(e) => {
            warn!(error = %e, "Falling back to spoken greeting");
            twiml::Greeting::Say(state.config.greeting_text.clone())
        }
    };
    xml_response(twiml::voice_menu(&greeting, &action))
}

/// Digit-routing webhook: resolve the selected language to its latest show.
///
/// The digit may arrive in the form body or the query string. Both are taken
/// as raw bytes so a garbled or non-UTF-8 request still reaches the handler;
/// a missing or undecodable value degrades to the fallback language, and the
/// caller always hears TwiML.
async fn twilio_voice_route(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let digit = digits_param(&body, query.as_deref());
    let lang = twiml::route_digit(digit.trim(), &state.config.languages);
    info!(digit = %digit, lang = %lang, "Routing caller");

    let xml = match state.store.latest_for_language(lang).await {
        Some(path) => match show_url(&state.config, &path) {
            Some(url) => twiml::play_show(&url),
            None => {
                warn!(path = %path.display(), "Artifact path had no file name");
                twiml::apology()
            }
        },
        None => twiml::no_episode(lang),
    };
    xml_response(xml)
}

fn digits_param(body: &[u8], query: Option<&str>) -> String {
    find_digits(body)
        .or_else(|| find_digits(query.unwrap_or_default().as_bytes()))
        .unwrap_or_default()
}

/// Pull `Digits` out of a form-encoded byte string; percent sequences that
/// are not valid UTF-8 decode lossily instead of failing.
fn find_digits(form: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(form)
        .find(|(k, _)| k == "Digits")
        .map(|(_, v)| v.into_owned())
}
