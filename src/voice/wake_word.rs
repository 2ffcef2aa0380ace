//! Wake word handling for recognized speech
//!
//! Saying the wake word arms the assistant: the next utterance is answered
//! with the female persona, after which the flag resets.

use super::Persona;
use crate::{Error, Result};

/// What to do with a recognized transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptAction {
    /// The transcript contained the wake word; acknowledge and wait
    Wake,
    /// Resolve the (lowercased) utterance and answer with `persona`
    Command {
        /// Lowercased transcript
        utterance: String,
        /// Persona to answer with
        persona: Persona,
    },
}

/// Wake word detector with a single-turn armed flag
#[derive(Debug, Clone)]
pub struct WakeWord {
    word: String,
    armed: bool,
}

impl WakeWord {
    /// Create a detector for `word`
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is empty after trimming
    pub fn new(word: &str) -> Result<Self> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }

        tracing::debug!(wake_word = %word, "wake word detector initialized");

        Ok(Self { word, armed: false })
    }

    /// Classify a final transcript, updating the armed flag
    pub fn classify(&mut self, transcript: &str) -> TranscriptAction {
        let utterance = transcript.to_lowercase();

        if utterance.contains(&self.word) {
            tracing::info!(wake_word = %self.word, transcript, "wake word detected");
            self.armed = true;
            return TranscriptAction::Wake;
        }

        let persona = if self.armed {
            self.armed = false;
            Persona::Female
        } else {
            Persona::Male
        };

        TranscriptAction::Command { utterance, persona }
    }

    /// Whether the next utterance will use the female persona
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// The normalized wake word
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }
}
