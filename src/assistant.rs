//! The assistant event loop
//!
//! Wires the platform capabilities into a [`Session`] and drives it from
//! typed input, recognition events, voice-list changes and finished turns.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::conversation::{ConversationLog, TerminalView};
use crate::encyclopedia::WikipediaClient;
use crate::intent::{Capabilities, IntentResolver};
use crate::platform::{NetworkProbe, SystemBrowser, SystemClock};
use crate::session::Session;
use crate::voice::{
    AudioCapture, RecognitionEvent, RecognitionEvents, SpeechToText, SystemSynthesizer,
    VoiceOutput, VoiceSelection, WakeWord, WhisperRecognizer,
};
use crate::Result;

/// A line of typed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Text to resolve
    Text(String),
    /// Restart speech recognition (the microphone button)
    Listen,
    /// End the session
    Quit,
}

impl Input {
    /// Interpret a typed line
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/listen" | "/mic" => Self::Listen,
            "/quit" | "/exit" => Self::Quit,
            text => Self::Text(text.to_string()),
        }
    }
}

/// Build the resolver from configuration with the real platform capabilities
#[must_use]
pub fn build_resolver(config: &Config) -> IntentResolver {
    let caps = Capabilities {
        connectivity: Arc::new(NetworkProbe::new(
            config.connectivity.probe_addr.clone(),
            config.connectivity.timeout,
        )),
        encyclopedia: Arc::new(WikipediaClient::new(
            config.encyclopedia.base_url.clone(),
            config.encyclopedia.timeout,
        )),
        opener: Arc::new(SystemBrowser),
        clock: Arc::new(SystemClock::new(config.time_format.clone())),
    };

    IntentResolver::new(&config.wake_word, caps)
}

/// Build voice output backed by the platform synthesizer
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn build_voice(config: &Config) -> VoiceOutput {
    let synth = SystemSynthesizer::new(&config.language);
    let selection = VoiceSelection::new(
        config.voice.male_preferences.clone(),
        config.voice.female_preferences.clone(),
    );
    VoiceOutput::new(Box::new(synth), selection).with_enabled(config.voice.enabled)
}

/// Build a session, with a recognizer when `listen` is set and the platform supports it
///
/// # Errors
///
/// Returns error if the wake word is invalid
pub fn build_session(config: &Config, listen: bool) -> Result<(Session, Option<RecognitionEvents>)> {
    let wake = WakeWord::new(&config.wake_word)?;
    let log = ConversationLog::new(Box::new(TerminalView::new(config.wake_word.clone())));
    let session = Session::new(wake, build_resolver(config), log, build_voice(config));

    if !listen {
        return Ok((session.without_listening(), None));
    }

    if !config.recognition.is_available() {
        tracing::info!("speech recognition unavailable: enable it and set OPENAI_API_KEY");
        return Ok((session, None));
    }

    if !AudioCapture::has_input_device() {
        tracing::info!("speech recognition unavailable: no input device");
        return Ok((session, None));
    }

    let api_key = config.recognition.openai_api_key.clone().unwrap_or_default();
    let stt = SpeechToText::new_whisper(
        api_key,
        config.recognition.stt_model.clone(),
        config.language_code(),
    )?;
    let (recognizer, events) = WhisperRecognizer::new(stt);

    Ok((session.with_recognizer(Box::new(recognizer)), Some(events)))
}

/// Run the session until the user quits, stdin closes or Ctrl-C
///
/// # Errors
///
/// Returns error if reading typed input fails
pub async fn run(mut session: Session, mut events: Option<RecognitionEvents>) -> Result<()> {
    let mut voices = session.watch_voices();
    let mut voices_open = true;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    session.start_recognition();

    let interrupted = loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("input closed");
                    break false;
                };
                match Input::parse(&line) {
                    Input::Quit => break false,
                    Input::Listen => session.listen(),
                    Input::Text(text) => session.on_typed_input(&text),
                }
            }
            Some(event) = next_event(&mut events) => session.on_recognition_event(event),
            reply = session.next_reply() => session.deliver(reply),
            changed = voices.changed(), if voices_open => {
                if changed.is_ok() {
                    session.reload_voices();
                } else {
                    voices_open = false;
                }
            }
            _ = tokio::signal::ctrl_c() => break true,
        }
    };

    session.shutdown();

    if !interrupted {
        session.settle().await;
        session.finish_speaking().await;
    }

    tracing::info!("session ended");
    Ok(())
}

async fn next_event(events: &mut Option<RecognitionEvents>) -> Option<RecognitionEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_parse() {
        assert_eq!(Input::parse(" /listen "), Input::Listen);
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(
            Input::parse("who is ada lovelace"),
            Input::Text("who is ada lovelace".to_string())
        );
    }
}
