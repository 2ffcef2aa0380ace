//! Configuration management for the assistant

pub mod file;

use std::time::Duration;

use crate::voice::{DEFAULT_FEMALE_PREFERENCES, DEFAULT_MALE_PREFERENCES};
use crate::{Error, Result};

use file::KarenConfigFile;

/// Wake word used when none is configured
pub const DEFAULT_WAKE_WORD: &str = "karen";

/// Recognition locale used when none is configured
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// en-US rendering of a local time, e.g. "3:04:05 PM"
pub const DEFAULT_TIME_FORMAT: &str = "%-I:%M:%S %p";

/// Wikipedia REST summary endpoint
pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

/// Address probed to decide whether the network is reachable
pub const DEFAULT_PROBE_ADDR: &str = "en.wikipedia.org:443";

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Normalized (trimmed, lowercase) wake word
    pub wake_word: String,

    /// Recognition locale (e.g. "en-US")
    pub language: String,

    /// chrono format string for the time intent
    pub time_format: String,

    /// Voice output configuration
    pub voice: VoiceConfig,

    /// Speech recognition configuration
    pub recognition: RecognitionConfig,

    /// Encyclopedia lookup configuration
    pub encyclopedia: EncyclopediaConfig,

    /// Connectivity probe configuration
    pub connectivity: ConnectivityConfig,
}

/// Voice output configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Speak responses aloud
    pub enabled: bool,

    /// Name substrings preferred for the male persona
    pub male_preferences: Vec<String>,

    /// Name substrings preferred for the female persona
    pub female_preferences: Vec<String>,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Listen on the microphone
    pub enabled: bool,

    /// Whisper model identifier
    pub stt_model: String,

    /// `OpenAI` API key (required for Whisper)
    pub openai_api_key: Option<String>,
}

impl RecognitionConfig {
    /// Whether recognition can be wired at all
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.enabled && self.openai_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Encyclopedia lookup configuration
#[derive(Debug, Clone)]
pub struct EncyclopediaConfig {
    /// Summary endpoint base URL, without trailing slash
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,
}

/// Connectivity probe configuration
#[derive(Debug, Clone)]
pub struct ConnectivityConfig {
    /// `host:port` to probe
    pub probe_addr: String,

    /// Probe timeout
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load(disable_voice: bool) -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok(), disable_voice)
    }

    /// Resolve configuration with priority env > file > default
    ///
    /// # Errors
    ///
    /// Returns error if the wake word is empty
    pub fn from_sources<F>(fc: KarenConfigFile, env: F, disable_voice: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let wake_word = env("KAREN_WAKE_WORD")
            .or(fc.wake_word)
            .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string())
            .trim()
            .to_lowercase();

        if wake_word.is_empty() {
            return Err(Error::Config("wake word must not be empty".to_string()));
        }

        let language = env("KAREN_LANGUAGE")
            .or(fc.language)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let time_format = env("KAREN_TIME_FORMAT")
            .or(fc.time_format)
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());

        let env_disabled = env("KAREN_DISABLE_VOICE")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        if disable_voice {
            tracing::info!("voice explicitly disabled via --no-voice");
        }

        let voice = VoiceConfig {
            enabled: !(disable_voice || env_disabled) && fc.voice.enabled.unwrap_or(true),
            male_preferences: fc
                .voice
                .male_preferences
                .unwrap_or_else(|| to_owned_list(DEFAULT_MALE_PREFERENCES)),
            female_preferences: fc
                .voice
                .female_preferences
                .unwrap_or_else(|| to_owned_list(DEFAULT_FEMALE_PREFERENCES)),
        };

        let recognition = RecognitionConfig {
            enabled: fc.recognition.enabled.unwrap_or(true),
            stt_model: env("KAREN_STT_MODEL")
                .or(fc.recognition.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            openai_api_key: env("OPENAI_API_KEY").or(fc.recognition.openai_api_key),
        };

        let encyclopedia = EncyclopediaConfig {
            base_url: env("KAREN_WIKIPEDIA_URL")
                .or(fc.encyclopedia.base_url)
                .unwrap_or_else(|| DEFAULT_WIKIPEDIA_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(fc.encyclopedia.timeout_secs.unwrap_or(10)),
        };

        let connectivity = ConnectivityConfig {
            probe_addr: env("KAREN_CONNECTIVITY_PROBE")
                .or(fc.connectivity.probe_addr)
                .unwrap_or_else(|| DEFAULT_PROBE_ADDR.to_string()),
            timeout: Duration::from_millis(fc.connectivity.timeout_ms.unwrap_or(2000)),
        };

        Ok(Self {
            wake_word,
            language,
            time_format,
            voice,
            recognition,
            encyclopedia,
            connectivity,
        })
    }

    /// Two-letter language code for STT (e.g. "en" for "en-US")
    #[must_use]
    pub fn language_code(&self) -> String {
        self.language
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .to_lowercase()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            voice: VoiceConfig {
                enabled: true,
                male_preferences: to_owned_list(DEFAULT_MALE_PREFERENCES),
                female_preferences: to_owned_list(DEFAULT_FEMALE_PREFERENCES),
            },
            recognition: RecognitionConfig {
                enabled: true,
                stt_model: "whisper-1".to_string(),
                openai_api_key: None,
            },
            encyclopedia: EncyclopediaConfig {
                base_url: DEFAULT_WIKIPEDIA_URL.to_string(),
                timeout: Duration::from_secs(10),
            },
            connectivity: ConnectivityConfig {
                probe_addr: DEFAULT_PROBE_ADDR.to_string(),
                timeout: Duration::from_millis(2000),
            },
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = Config::from_sources(KarenConfigFile::default(), env_from(&[]), false).unwrap();

        assert_eq!(config.wake_word, "karen");
        assert_eq!(config.language, "en-US");
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert!(config.voice.enabled);
        assert_eq!(config.encyclopedia.base_url, DEFAULT_WIKIPEDIA_URL);
        assert!(!config.recognition.is_available());
    }

    #[test]
    fn test_env_overrides_file() {
        let fc: KarenConfigFile = toml::from_str(
            r#"
            wake_word = "jarvis"
            [encyclopedia]
            base_url = "http://file.example/summary/"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            fc,
            env_from(&[("KAREN_WAKE_WORD", "  Friday ")]),
            false,
        )
        .unwrap();

        assert_eq!(config.wake_word, "friday");
        assert_eq!(config.encyclopedia.base_url, "http://file.example/summary");
    }

    #[test]
    fn test_voice_disabled_by_flag_or_env() {
        let config = Config::from_sources(KarenConfigFile::default(), env_from(&[]), true).unwrap();
        assert!(!config.voice.enabled);

        let config = Config::from_sources(
            KarenConfigFile::default(),
            env_from(&[("KAREN_DISABLE_VOICE", "TRUE")]),
            false,
        )
        .unwrap();
        assert!(!config.voice.enabled);
    }

    #[test]
    fn test_empty_wake_word_rejected() {
        let result = Config::from_sources(
            KarenConfigFile::default(),
            env_from(&[("KAREN_WAKE_WORD", "   ")]),
            false,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_recognition_needs_api_key() {
        let config = Config::from_sources(
            KarenConfigFile::default(),
            env_from(&[("OPENAI_API_KEY", "sk-test")]),
            false,
        )
        .unwrap();
        assert!(config.recognition.is_available());
    }

    #[test]
    fn test_language_code() {
        let mut config = Config::default();
        assert_eq!(config.language_code(), "en");

        config.language = "pt_BR".to_string();
        assert_eq!(config.language_code(), "pt");
    }
}
