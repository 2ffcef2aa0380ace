//! Microphone capture at the rate Whisper expects

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig, SupportedStreamConfigRange};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Shared between the cpal callback and the capture thread
type SampleBuffer = Arc<Mutex<Vec<f32>>>;

/// Mono 16kHz capture from the default input device
///
/// cpal streams are not `Send`, so a capture is created, started and drained
/// on one thread.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    samples: SampleBuffer,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if there is no input device or it cannot record 16kHz mono
    pub fn new() -> Result<Self> {
        let device = default_input()?;

        let range = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(records_speech)
            .ok_or_else(|| Error::Audio("input device cannot record 16kHz mono".to_string()))?;
        let config = range.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Whether speech recognition has a microphone to listen on
    #[must_use]
    pub fn has_input_device() -> bool {
        default_input().is_ok()
    }

    /// Begin recording into the shared buffer; a no-op while recording
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let samples = Arc::clone(&self.samples);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = samples.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        self.stream = Some(stream);
        tracing::debug!("recording");
        Ok(())
    }

    /// Stop recording; buffered samples are kept until taken
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("recording stopped");
        }
    }

    /// Take the samples recorded since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.samples
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

fn default_input() -> Result<Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))
}

fn records_speech(range: &SupportedStreamConfigRange) -> bool {
    accepts(range.channels(), range.min_sample_rate().0, range.max_sample_rate().0)
}

/// Mono with 16kHz inside the supported rate range
const fn accepts(channels: u16, min_rate: u32, max_rate: u32) -> bool {
    channels == 1 && min_rate <= SAMPLE_RATE && SAMPLE_RATE <= max_rate
}

/// Encode mono f32 samples as 16-bit PCM WAV for upload
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_err = |e: hound::Error| Error::Audio(e.to_string());

    let mut out = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut out, spec).map_err(wav_err)?;
    for &sample in samples {
        writer.write_sample(to_pcm16(sample)).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)?;

    Ok(out.into_inner())
}

#[allow(clippy::cast_possible_truncation)]
fn to_pcm16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}
