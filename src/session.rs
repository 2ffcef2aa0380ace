//! A single conversation session
//!
//! Owns the wake-word flag, the conversation log, cached voices and the
//! recognizer handle. All mutation
//! happens on the task that drives the session; resolution turns run as
//! independent futures so a slow lookup never blocks new input.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;

use crate::conversation::{ConversationLog, Sender};
use crate::intent::IntentResolver;
use crate::voice::{
    Persona, RecognitionEvent, SpeechRecognizer, TranscriptAction, Voice, VoiceOutput, WakeWord,
};

/// Logged when the wake word is heard
pub const WAKE_ACK_LOGGED: &str = "Yes, I'm listening 👂";
/// Spoken when the wake word is heard
pub const WAKE_ACK_SPOKEN: &str = "Yes, I'm listening";
/// Status shown when recognition fails
pub const RECOGNITION_ERROR_STATUS: &str = "Error with speech recognition.";
/// Spoken when recognition fails
pub const RECOGNITION_APOLOGY: &str = "Sorry, I couldn't hear you.";
/// Status shown when listening is (re)started
pub const LISTENING_STATUS: &str = "Listening...";
/// Alert shown when no recognizer is available
pub const UNSUPPORTED_ALERT: &str = "Your system does not support speech recognition 😢";
/// Status shown on `/listen` when listening was turned off at startup
pub const LISTENING_OFF_STATUS: &str = "Listening is turned off.";

/// A resolved response waiting to be logged and spoken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response text
    pub text: String,
    /// Persona to speak it with
    pub persona: Persona,
}

/// Conversation state and its collaborators
pub struct Session {
    wake: WakeWord,
    resolver: Arc<IntentResolver>,
    log: ConversationLog,
    voice: VoiceOutput,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    listening_wanted: bool,
    pending: FuturesUnordered<BoxFuture<'static, Reply>>,
}

impl Session {
    /// Create a session without speech recognition
    #[must_use]
    pub fn new(
        wake: WakeWord,
        resolver: IntentResolver,
        log: ConversationLog,
        voice: VoiceOutput,
    ) -> Self {
        Self {
            wake,
            resolver: Arc::new(resolver),
            log,
            voice,
            recognizer: None,
            listening_wanted: true,
            pending: FuturesUnordered::new(),
        }
    }

    /// Attach a speech recognizer
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Listening was turned off by the user; no unsupported alert is shown
    #[must_use]
    pub fn without_listening(mut self) -> Self {
        self.listening_wanted = false;
        self
    }

    /// Start listening at session start, or tell the user listening is unavailable
    pub fn start_recognition(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            if self.listening_wanted {
                self.log.alert(UNSUPPORTED_ALERT);
            } else {
                tracing::debug!("listening turned off");
            }
            return;
        };

        if let Err(e) = recognizer.start() {
            self.on_recognition_error(&e.to_string());
        }
    }

    /// Manually (re)start listening, e.g. after a recognition error
    pub fn listen(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            if self.listening_wanted {
                self.log.alert(UNSUPPORTED_ALERT);
            } else {
                self.log.set_status(LISTENING_OFF_STATUS);
            }
            return;
        };

        if recognizer.is_running() {
            self.log.set_status(LISTENING_STATUS);
            return;
        }

        match recognizer.start() {
            Ok(()) => self.log.set_status(LISTENING_STATUS),
            Err(e) => self.on_recognition_error(&e.to_string()),
        }
    }

    /// Handle an event from the recognizer
    pub fn on_recognition_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Started => tracing::debug!("recognizer listening"),
            RecognitionEvent::Result(transcript) => self.on_transcript(&transcript),
            RecognitionEvent::Error(detail) => self.on_recognition_error(&detail),
        }
    }

    /// Handle a final recognized transcript
    pub fn on_transcript(&mut self, transcript: &str) {
        tracing::info!(transcript, "heard");

        match self.wake.classify(transcript) {
            TranscriptAction::Wake => {
                self.log.append(Sender::Bot, WAKE_ACK_LOGGED);
                self.voice.speak(WAKE_ACK_SPOKEN, Persona::Female);
            }
            TranscriptAction::Command { utterance, persona } => {
                self.log.append(Sender::User, utterance.as_str());
                self.submit(utterance, persona);
            }
        }
    }

    /// Handle text typed by the user; blank input is ignored
    pub fn on_typed_input(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.log.append(Sender::User, text);
        self.submit(text.to_string(), Persona::Male);
    }

    /// Surface a recognition failure; recognition stays stopped
    pub fn on_recognition_error(&mut self, detail: &str) {
        tracing::warn!(detail, "speech recognition error");
        self.log.set_status(RECOGNITION_ERROR_STATUS);
        self.voice.speak(RECOGNITION_APOLOGY, Persona::Female);
    }

    fn submit(&mut self, utterance: String, persona: Persona) {
        let resolver = Arc::clone(&self.resolver);
        self.pending.push(Box::pin(async move {
            let text = resolver.resolve(&utterance).await;
            Reply { text, persona }
        }));
    }

    /// Wait for the next resolution turn to finish
    ///
    /// Turns complete in whatever order their lookups finish. Never
    /// resolves while nothing is pending.
    pub async fn next_reply(&mut self) -> Reply {
        match self.pending.next().await {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }

    /// Log a reply, then speak it
    pub fn deliver(&mut self, reply: Reply) {
        self.log.append(Sender::Bot, reply.text.as_str());
        self.voice.speak(&reply.text, reply.persona);
    }

    /// Deliver every pending turn
    pub async fn settle(&mut self) {
        while let Some(reply) = self.pending.next().await {
            self.deliver(reply);
        }
    }

    /// Whether any turn is still resolving
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Rebuild persona voices after the synthesizer's list changed
    pub fn reload_voices(&mut self) {
        self.voice.reload_voices();
    }

    /// Receiver that fires when the synthesizer's voice list changes
    #[must_use]
    pub fn watch_voices(&self) -> watch::Receiver<Vec<Voice>> {
        self.voice.watch_voices()
    }

    /// Wait for the current utterance to finish playing
    pub async fn finish_speaking(&mut self) {
        self.voice.wait_until_silent().await;
    }

    /// Stop recognition
    pub fn shutdown(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
    }

    /// The conversation so far
    #[must_use]
    pub const fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Wake-word state
    #[must_use]
    pub const fn wake(&self) -> &WakeWord {
        &self.wake
    }

    /// Voice output
    #[must_use]
    pub const fn voice(&self) -> &VoiceOutput {
        &self.voice
    }
}
