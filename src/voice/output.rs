//! Spoken responses

use std::time::Duration;

use tokio::sync::watch;

use super::{Persona, SpeechSynthesizer, Utterance, Voice, VoiceSelection};

/// Neutral speech rate
const RATE: f32 = 1.0;

/// How often to check whether playback has finished
const SILENCE_POLL: Duration = Duration::from_millis(50);

/// Speaks responses with the voice cached for each persona
pub struct VoiceOutput {
    synth: Box<dyn SpeechSynthesizer>,
    selection: VoiceSelection,
    enabled: bool,
}

impl VoiceOutput {
    /// Wrap a synthesizer and select voices from whatever it has loaded so far
    #[must_use]
    pub fn new(synth: Box<dyn SpeechSynthesizer>, selection: VoiceSelection) -> Self {
        let mut output = Self {
            synth,
            selection,
            enabled: true,
        };
        output.reload_voices();
        output
    }

    /// Turn speaking on or off (messages are still logged)
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Re-read the synthesizer's voice list and rebuild the selection
    pub fn reload_voices(&mut self) {
        let voices = self.synth.voices();
        self.selection.populate(&voices);
    }

    /// Receiver that fires when the synthesizer's voice list changes
    #[must_use]
    pub fn watch_voices(&self) -> watch::Receiver<Vec<Voice>> {
        self.synth.watch_voices()
    }

    /// Whether the synthesizer can speak at all
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.synth.is_available()
    }

    /// Current persona voices
    #[must_use]
    pub const fn selection(&self) -> &VoiceSelection {
        &self.selection
    }

    /// Speak `text`, interrupting anything currently being spoken
    ///
    /// Empty text is ignored. Before voices have loaded the synthesizer
    /// default voice is used.
    pub fn speak(&mut self, text: &str, persona: Persona) {
        if text.is_empty() || !self.enabled {
            return;
        }

        let voice = self.selection.voice_for(persona).cloned();
        if voice.is_none() {
            tracing::debug!(?persona, "no voice selected yet, using synthesizer default");
        }

        let utterance = Utterance {
            text: text.to_string(),
            voice,
            rate: RATE,
            pitch: persona.pitch(),
        };

        self.synth.cancel();
        if let Err(e) = self.synth.speak(utterance) {
            tracing::warn!(error = %e, "failed to speak response");
        }
    }

    /// Wait until the synthesizer has finished the current utterance
    pub async fn wait_until_silent(&mut self) {
        while self.synth.is_speaking() {
            tokio::time::sleep(SILENCE_POLL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::Result;

    #[derive(Debug, PartialEq)]
    enum Call {
        Cancel,
        Speak(Utterance),
    }

    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
        voices: watch::Sender<Vec<Voice>>,
    }

    impl SpeechSynthesizer for Recorder {
        fn voices(&self) -> Vec<Voice> {
            self.voices.borrow().clone()
        }

        fn watch_voices(&self) -> watch::Receiver<Vec<Voice>> {
            self.voices.subscribe()
        }

        fn cancel(&mut self) {
            self.calls.lock().unwrap().push(Call::Cancel);
        }

        fn speak(&mut self, utterance: Utterance) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Speak(utterance));
            Ok(())
        }
    }

    fn voice(name: &str) -> Voice {
        Voice {
            name: name.to_string(),
            language: "en".to_string(),
            id: name.to_lowercase(),
        }
    }

    fn output(voices: Vec<Voice>) -> (VoiceOutput, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (tx, _rx) = watch::channel(voices);
        let synth = Recorder {
            calls: Arc::clone(&calls),
            voices: tx,
        };
        let selection = VoiceSelection::new(
            vec!["alex".to_string()],
            vec!["samantha".to_string()],
        );
        (VoiceOutput::new(Box::new(synth), selection), calls)
    }

    #[test]
    fn test_cancels_before_speaking_with_persona_voice() {
        let (mut out, calls) = output(vec![voice("Alex"), voice("Samantha")]);

        out.speak("hello", Persona::Female);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Cancel);
        let Call::Speak(utterance) = &calls[1] else {
            panic!("expected speak");
        };
        assert_eq!(utterance.voice.as_ref().unwrap().name, "Samantha");
        assert!((utterance.pitch - 1.1).abs() < f32::EPSILON);
        assert!((utterance.rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_text_is_noop() {
        let (mut out, calls) = output(vec![voice("Alex")]);
        out.speak("", Persona::Male);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_speaks_with_default_voice_before_voices_load() {
        let (mut out, calls) = output(Vec::new());
        out.speak("hi there", Persona::Male);

        let calls = calls.lock().unwrap();
        let Call::Speak(utterance) = &calls[1] else {
            panic!("expected speak");
        };
        assert!(utterance.voice.is_none());
    }

    #[test]
    fn test_disabled_output_is_silent() {
        let (out, calls) = output(vec![voice("Alex")]);
        let mut out = out.with_enabled(false);
        out.speak("hello", Persona::Male);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_late_voices_are_picked_up_on_reload() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (tx, _rx) = watch::channel(Vec::new());
        let synth = Recorder {
            calls: Arc::clone(&calls),
            voices: tx.clone(),
        };
        let selection = VoiceSelection::new(vec!["alex".to_string()], vec!["samantha".to_string()]);
        let mut out = VoiceOutput::new(Box::new(synth), selection);
        assert!(!out.selection().is_populated());

        let changes = out.watch_voices();
        tx.send_replace(vec![voice("Samantha"), voice("Alex")]);
        assert!(changes.has_changed().unwrap());

        out.reload_voices();
        assert_eq!(out.selection().voice_for(Persona::Male).unwrap().name, "Alex");
        assert_eq!(
            out.selection().voice_for(Persona::Female).unwrap().name,
            "Samantha"
        );

        // The recorder never reports ongoing playback
        assert!(out.is_available());
        tokio_test::block_on(out.wait_until_silent());
    }
}
