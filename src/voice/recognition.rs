//! Continuous speech recognition from the microphone
//!
//! A capture thread (cpal streams are not `Send`) segments the microphone
//! stream by energy and hands each segment to an async task that transcribes
//! it with Whisper. Transcripts and failures are delivered as
//! [`RecognitionEvent`]s. Any failure stops recognition until `start` is
//! called again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::{
    AudioCapture, RecognitionEvent, RecognitionEvents, SAMPLE_RATE, SpeechRecognizer,
    SpeechSegmenter, SpeechToText, samples_to_wav,
};
use crate::{Error, Result};

/// How often the capture thread drains the microphone buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type EventSender = mpsc::UnboundedSender<RecognitionEvent>;

/// Microphone + Whisper speech recognizer
pub struct WhisperRecognizer {
    stt: Arc<SpeechToText>,
    events: EventSender,
    running: Arc<AtomicBool>,
    runtime: Handle,
}

impl WhisperRecognizer {
    /// Create a recognizer and the receiver for its events
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(stt: SpeechToText) -> (Self, RecognitionEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let recognizer = Self {
            stt: Arc::new(stt),
            events,
            running: Arc::new(AtomicBool::new(false)),
            runtime: Handle::current(),
        };
        (recognizer, rx)
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            tracing::debug!("recognition already running");
            return Ok(());
        }

        // Each run owns its flag; a stale capture thread stays stopped
        self.running = Arc::new(AtomicBool::new(true));
        let (segments_tx, segments_rx) = mpsc::unbounded_channel();

        let running = Arc::clone(&self.running);
        let events = self.events.clone();
        let spawned = std::thread::Builder::new()
            .name("karen-capture".to_string())
            .spawn(move || capture_loop(&running, &segments_tx, &events));

        if let Err(e) = spawned {
            self.running.store(false, Ordering::SeqCst);
            return Err(Error::Recognition(format!(
                "failed to start capture thread: {e}"
            )));
        }

        self.runtime.spawn(transcribe_loop(
            Arc::clone(&self.stt),
            segments_rx,
            self.events.clone(),
            Arc::clone(&self.running),
        ));

        tracing::info!("speech recognition started");
        Ok(())
    }

    fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("speech recognition stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for WhisperRecognizer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn capture_loop(
    running: &AtomicBool,
    segments: &mpsc::UnboundedSender<Vec<f32>>,
    events: &EventSender,
) {
    let mut capture = match AudioCapture::new().and_then(|mut capture| {
        capture.start()?;
        Ok(capture)
    }) {
        Ok(capture) => capture,
        Err(e) => {
            fail(running, events, &e);
            return;
        }
    };

    let _ = events.send(RecognitionEvent::Started);
    let mut segmenter = SpeechSegmenter::new();

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);

        let samples = capture.take_buffer();
        if let Some(segment) = segmenter.push(&samples) {
            if segments.send(segment).is_err() {
                break;
            }
        }
    }

    capture.stop();
}

async fn transcribe_loop(
    stt: Arc<SpeechToText>,
    mut segments: mpsc::UnboundedReceiver<Vec<f32>>,
    events: EventSender,
    running: Arc<AtomicBool>,
) {
    while let Some(segment) = segments.recv().await {
        let transcript: Result<String> = async {
            let wav = samples_to_wav(&segment, SAMPLE_RATE)?;
            stt.transcribe(wav).await
        }
        .await;

        match transcript {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::debug!("empty transcript, ignoring");
                    continue;
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let _ = events.send(RecognitionEvent::Result(text.to_string()));
            }
            Err(e) => {
                fail(&running, &events, &e);
                break;
            }
        }
    }
}

fn fail(running: &AtomicBool, events: &EventSender, error: &Error) {
    tracing::error!(error = %error, "speech recognition failed");
    running.store(false, Ordering::SeqCst);
    let _ = events.send(RecognitionEvent::Error(error.to_string()));
}
