//! Voice processing module
//!
//! Speech synthesis and speech recognition sit behind narrow capability
//! traits so the session can be driven by fakes in tests:
//! - [`SpeechSynthesizer`]: enumerate voices, speak, cancel
//! - [`SpeechRecognizer`]: start/stop, results delivered as [`RecognitionEvent`]s

mod capture;
mod output;
mod recognition;
mod segmenter;
mod selection;
mod stt;
mod system;
mod wake_word;

use tokio::sync::{mpsc, watch};

use crate::Result;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use output::VoiceOutput;
pub use recognition::WhisperRecognizer;
pub use segmenter::{SegmenterState, SpeechSegmenter};
pub use selection::{DEFAULT_FEMALE_PREFERENCES, DEFAULT_MALE_PREFERENCES, VoiceSelection};
pub use stt::SpeechToText;
pub use system::SystemSynthesizer;
pub use wake_word::{TranscriptAction, WakeWord};

/// Which voice a response is spoken with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Default persona for un-armed utterances and typed input
    Male,
    /// Persona armed by the wake word
    Female,
}

impl Persona {
    /// Pitch multiplier for this persona
    #[must_use]
    pub const fn pitch(self) -> f32 {
        match self {
            Self::Male => 1.0,
            Self::Female => 1.1,
        }
    }
}

/// A voice installed on the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Human-readable name used for preference matching
    pub name: String,
    /// Language tag reported by the synthesizer
    pub language: String,
    /// Identifier passed back to the synthesizer when speaking
    pub id: String,
}

/// A single request to speak text
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to speak
    pub text: String,
    /// Voice to use; `None` means the synthesizer default
    pub voice: Option<Voice>,
    /// Speech rate multiplier (1.0 is neutral)
    pub rate: f32,
    /// Pitch multiplier (1.0 is neutral)
    pub pitch: f32,
}

/// Platform speech synthesis capability
pub trait SpeechSynthesizer: Send {
    /// Whether anything can actually be spoken
    fn is_available(&self) -> bool {
        true
    }

    /// Voices currently known to the synthesizer (may be empty while loading)
    fn voices(&self) -> Vec<Voice>;

    /// Receiver that changes whenever the voice list changes
    fn watch_voices(&self) -> watch::Receiver<Vec<Voice>>;

    /// Stop whatever is currently being spoken
    fn cancel(&mut self);

    /// Start speaking an utterance without waiting for it to finish
    ///
    /// # Errors
    ///
    /// Returns error if the utterance cannot be handed to the platform
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    /// Whether an utterance is still being spoken
    fn is_speaking(&mut self) -> bool {
        false
    }
}

/// Event emitted by a speech recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Recognizer began listening
    Started,
    /// A final transcript
    Result(String),
    /// Recognition failed; the recognizer has stopped
    Error(String),
}

/// Receiving half of a recognizer's event stream
pub type RecognitionEvents = mpsc::UnboundedReceiver<RecognitionEvent>;

/// Platform speech recognition capability
pub trait SpeechRecognizer: Send {
    /// Begin continuous recognition; a no-op if already running
    ///
    /// # Errors
    ///
    /// Returns error if recognition cannot be started
    fn start(&mut self) -> Result<()>;

    /// Stop recognition
    fn stop(&mut self);

    /// Whether recognition is currently running
    fn is_running(&self) -> bool;
}
