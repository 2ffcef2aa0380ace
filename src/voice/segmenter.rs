//! Energy-based speech segmentation
//!
//! Splits a continuous microphone stream into utterance-sized segments that
//! are sent for transcription one at a time.

use super::SAMPLE_RATE;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech in a segment (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends a segment (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Longest segment sent for transcription, even without a pause
const MAX_SEGMENT_SAMPLES: usize = 30 * SAMPLE_RATE as usize;

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Speech detected, accumulating a segment
    Speaking,
}

/// Accumulates speech between silences
#[derive(Debug)]
pub struct SpeechSegmenter {
    state: SegmenterState,
    buffer: Vec<f32>,
    speech: usize,
    silence: usize,
}

impl Default for SpeechSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSegmenter {
    /// Create an idle segmenter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            speech: 0,
            silence: 0,
        }
    }

    /// Feed captured samples
    ///
    /// Returns a complete segment once enough speech has been followed by
    /// enough silence.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech = samples.len();
                    self.silence = 0;
                    tracing::trace!(energy, "speech detected");
                }
                None
            }
            SegmenterState::Speaking => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech += samples.len();
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                let full = self.buffer.len() >= MAX_SEGMENT_SAMPLES;
                if self.silence <= SILENCE_SAMPLES && !full {
                    return None;
                }

                if self.speech < MIN_SPEECH_SAMPLES {
                    tracing::trace!(speech = self.speech, "discarding noise blip");
                    self.reset();
                    return None;
                }

                if full {
                    tracing::debug!(samples = self.buffer.len(), "no pause, flushing full segment");
                } else {
                    tracing::debug!(samples = self.buffer.len(), "speech segment complete");
                }
                self.state = SegmenterState::Idle;
                self.speech = 0;
                self.silence = 0;
                Some(std::mem::take(&mut self.buffer))
            }
        }
    }

    /// Drop any partial segment
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.buffer.clear();
        self.speech = 0;
        self.silence = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Samples accumulated for the current segment
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
