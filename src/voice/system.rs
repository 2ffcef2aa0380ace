//! Speech synthesis through the platform's command-line synthesizer
//!
//! Uses `espeak-ng` (or `espeak`) on Linux and `say` on macOS. Voices are
//! enumerated in a background task and published on a watch channel, so the
//! first responses may be spoken before any voice has been selected.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tokio::sync::watch;

use super::{SpeechSynthesizer, Utterance, Voice};
use crate::{Error, Result};

/// espeak words-per-minute at rate 1.0
const BASE_WPM: f32 = 175.0;

/// espeak pitch at multiplier 1.0 (range 0-99)
const BASE_PITCH: f32 = 50.0;

#[derive(Debug, Clone)]
enum Backend {
    Espeak(PathBuf),
    Say(PathBuf),
    Silent,
}

/// Synthesizer backed by a platform speech binary
pub struct SystemSynthesizer {
    backend: Backend,
    voices: watch::Sender<Vec<Voice>>,
    current: Option<Child>,
}

impl SystemSynthesizer {
    /// Locate the platform synthesizer and start loading its voices
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(language: &str) -> Self {
        let backend = detect_backend();
        let (voices, _) = watch::channel(Vec::new());

        match &backend {
            Backend::Silent => {
                tracing::warn!("no speech synthesizer found, responses will not be spoken");
            }
            backend => {
                tracing::debug!(?backend, "speech synthesizer found");
                let backend = backend.clone();
                let language = language.to_lowercase();
                let tx = voices.clone();
                tokio::spawn(async move {
                    match load_voices(&backend, &language).await {
                        Ok(list) => {
                            tracing::debug!(count = list.len(), "voices loaded");
                            tx.send_replace(list);
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to enumerate voices"),
                    }
                });
            }
        }

        Self {
            backend,
            voices,
            current: None,
        }
    }

    fn command(&self, utterance: &Utterance) -> Option<Command> {
        match &self.backend {
            Backend::Espeak(bin) => {
                let mut cmd = Command::new(bin);
                if let Some(voice) = &utterance.voice {
                    cmd.arg("-v").arg(&voice.id);
                }
                cmd.arg("-s")
                    .arg(espeak_rate(utterance.rate).to_string())
                    .arg("-p")
                    .arg(espeak_pitch(utterance.pitch).to_string())
                    .arg("--stdin");
                Some(cmd)
            }
            Backend::Say(bin) => {
                let mut cmd = Command::new(bin);
                if let Some(voice) = &utterance.voice {
                    cmd.arg("-v").arg(&voice.id);
                }
                cmd.arg("-r").arg(espeak_rate(utterance.rate).to_string());
                Some(cmd)
            }
            Backend::Silent => None,
        }
    }

    /// Text written to the synthesizer's stdin
    ///
    /// `say` has no pitch flag, so the pitch is embedded as a `[[pbas]]`
    /// command. Neural macOS voices ignore embedded commands.
    fn spoken_text(&self, utterance: &Utterance) -> String {
        match &self.backend {
            Backend::Say(_) => match say_pitch_offset(utterance.pitch) {
                0 => utterance.text.clone(),
                offset => format!("[[pbas {offset:+}]] {}", utterance.text),
            },
            Backend::Espeak(_) | Backend::Silent => utterance.text.clone(),
        }
    }
}

impl SpeechSynthesizer for SystemSynthesizer {
    fn is_available(&self) -> bool {
        !matches!(self.backend, Backend::Silent)
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.borrow().clone()
    }

    fn watch_voices(&self) -> watch::Receiver<Vec<Voice>> {
        self.voices.subscribe()
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            if matches!(child.try_wait(), Ok(None)) {
                tracing::debug!(pid = child.id(), "cancelling utterance");
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        let Some(mut cmd) = self.command(&utterance) else {
            tracing::info!(text = %utterance.text, "no synthesizer, not speaking");
            return Ok(());
        };

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Voice(format!("failed to start synthesizer: {e}")))?;

        let stdin = child.stdin.take();
        self.current = Some(child);

        if let Some(mut stdin) = stdin {
            let text = self.spoken_text(&utterance);
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                self.cancel();
                return Err(Error::Voice(format!(
                    "failed to send text to synthesizer: {e}"
                )));
            }
        }

        tracing::trace!(
            voice = ?utterance.voice.as_ref().map(|v| &v.id),
            chars = utterance.text.len(),
            "speaking"
        );
        Ok(())
    }

    fn is_speaking(&mut self) -> bool {
        self.current
            .as_mut()
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }
}

impl Drop for SystemSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn detect_backend() -> Backend {
    if cfg!(target_os = "macos") {
        if let Ok(bin) = which::which("say") {
            return Backend::Say(bin);
        }
    }

    which::which("espeak-ng")
        .or_else(|_| which::which("espeak"))
        .map_or(Backend::Silent, Backend::Espeak)
}

async fn load_voices(backend: &Backend, language: &str) -> Result<Vec<Voice>> {
    match backend {
        Backend::Espeak(bin) => {
            let base = run_listing(bin, &[format!("--voices={language}")]).await?;
            let variants = run_listing(bin, &["--voices=variant".to_string()]).await?;

            let mut voices = parse_espeak_voices(&base);
            voices.extend(parse_espeak_variants(&variants, language));
            Ok(voices)
        }
        Backend::Say(bin) => {
            let listing = run_listing(bin, &["-v".to_string(), "?".to_string()]).await?;
            Ok(parse_say_voices(&listing))
        }
        Backend::Silent => Ok(Vec::new()),
    }
}

async fn run_listing(bin: &Path, args: &[String]) -> Result<String> {
    let output = tokio::process::Command::new(bin).args(args).output().await?;
    if !output.status.success() {
        return Err(Error::Voice(format!(
            "{} exited with {}",
            bin.display(),
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn espeak_rate(rate: f32) -> u32 {
    (BASE_WPM * rate).round().max(1.0) as u32
}

/// Semitone offset for `[[pbas]]` equivalent to a pitch multiplier
#[allow(clippy::cast_possible_truncation)]
fn say_pitch_offset(pitch: f32) -> i32 {
    if pitch <= 0.0 {
        return 0;
    }
    (12.0 * pitch.log2()).round() as i32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn espeak_pitch(pitch: f32) -> u8 {
    (BASE_PITCH * pitch).round().clamp(0.0, 99.0) as u8
}

/// Parse `espeak-ng --voices=<lang>` output
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us            --/M      English_(America)  gmw/en-US            (en 2)
/// ```
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            Some(Voice {
                name: fields[3].replace('_', " "),
                language: fields[1].to_string(),
                id: fields[1].to_string(),
            })
        })
        .collect()
}

/// Parse `espeak-ng --voices=variant` output; variants are spoken as `<base>+<variant>`
fn parse_espeak_variants(listing: &str, base: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            let variant = fields[4].rsplit('/').next().unwrap_or(fields[4]);
            Some(Voice {
                name: fields[3].replace('_', " "),
                language: base.to_string(),
                id: format!("{base}+{variant}"),
            })
        })
        .collect()
}

/// Parse `say -v ?` output
///
/// ```text
/// Alex                en_US    # Most people recognize me by my voice.
/// Bad News            en_US    # The light you see at the end of the tunnel...
/// ```
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, language) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Voice {
                name: name.to_string(),
                language: language.to_string(),
                id: name.to_string(),
            })
        })
        .collect()
}
