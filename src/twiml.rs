//! TwiML documents and DTMF call routing for the telephone front end.
//!
//! Every caller-facing path resolves to a well-formed TwiML document; the
//! voice flow never surfaces a raw error. Documents are built with the
//! `quick-xml` writer so greeting text and URLs are escaped properly.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::BoxError;

/// Hand-written minimal document used if the XML writer itself fails,
/// which should not happen for in-memory writes.
const APOLOGY_FALLBACK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Response><Say>Sorry, an error occurred. Please try again later.</Say></Response>";

/// What the language menu plays inside its `<Gather>`.
#[derive(Debug, Clone)]
pub enum Greeting {
    /// Synthesized prompt audio is available at this URL.
    Play(String),
    /// No prompt audio; speak the greeting text instead.
    Say(String),
}

/// Map a DTMF digit to a configured language code.
///
/// "1" and "2" default to "en"/"fr" when the slots are unset; "3" and "4"
/// use the third/fourth configured language verbatim. Any other digit, or a
/// digit whose slot is not configured, falls back to "en".
pub fn route_digit<'a>(digit: &str, languages: &'a [String]) -> &'a str {
    let slot = |idx: usize, default: Option<&'a str>| {
        languages
            .get(idx)
            .map(String::as_str)
            .or(default)
    };
    let lang = match digit {
        "1" => slot(0, Some("en")),
        "2" => slot(1, Some("fr")),
        "3" => slot(2, None),
        "4" => slot(3, None),
        _ => None,
    };
    lang.unwrap_or("en")
}

/// Language-selection menu: gather one digit, posting it to `action`.
pub fn voice_menu(greeting: &Greeting, action: &str) -> String {
    build(|w| {
        let mut gather = BytesStart::new("Gather");
        gather.push_attribute(("input", "dtmf"));
        gather.push_attribute(("timeout", "5"));
        gather.push_attribute(("numDigits", "1"));
        gather.push_attribute(("action", action));
        gather.push_attribute(("method", "POST"));
        w.write_event(Event::Start(gather))?;
        match greeting {
            Greeting::Play(url) => write_play(w, url)?,
            Greeting::Say(text) => write_say(w, text, None)?,
        }
        w.write_event(Event::End(BytesEnd::new("Gather")))?;
        write_say(w, "No input received. Goodbye.", None)
    })
}

/// Play the resolved show URL.
pub fn play_show(url: &str) -> String {
    build(|w| write_play(w, url))
}

/// Localized "no episode available" message. French callers get the
/// Canadian-French variant; every other language falls back to English.
pub fn no_episode(lang: &str) -> String {
    build(|w| {
        if lang == "fr" {
            write_say(
                w,
                "Aucun épisode n'est disponible pour le moment. Veuillez rappeler plus tard.",
                Some("fr-CA"),
            )
        } else {
            write_say(
                w,
                "No episode is available right now. Please call back later.",
                None,
            )
        }
    })
}

/// Generic spoken apology for unexpected routing failures.
pub fn apology() -> String {
    build(|w| write_say(w, "Sorry, an error occurred. Please try again later.", None))
}

fn write_say(
    w: &mut Writer<Vec<u8>>,
    text: &str,
    language: Option<&str>,
) -> Result<(), BoxError> {
    let mut say = BytesStart::new("Say");
    say.push_attribute(("voice", "alice"));
    if let Some(language) = language {
        say.push_attribute(("language", language));
    }
    w.write_event(Event::Start(say))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new("Say")))?;
    Ok(())
}

fn write_play(w: &mut Writer<Vec<u8>>, url: &str) -> Result<(), BoxError> {
    w.write_event(Event::Start(BytesStart::new("Play")))?;
    w.write_event(Event::Text(BytesText::new(url)))?;
    w.write_event(Event::End(BytesEnd::new("Play")))?;
    Ok(())
}

fn build<F>(body: F) -> String
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<(), BoxError>,
{
    let result = (|| {
        let mut w = Writer::new(Vec::new());
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        w.write_event(Event::Start(BytesStart::new("Response")))?;
        body(&mut w)?;
        w.write_event(Event::End(BytesEnd::new("Response")))?;
        Ok::<_, BoxError>(w.into_inner())
    })();
    match result.map(String::from_utf8) {
        Ok(Ok(xml)) => xml,
        _ => APOLOGY_FALLBACK.to_string(),
    }
}
