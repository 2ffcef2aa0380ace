//! TOML configuration file loading
//!
//! Supports `~/.config/karen/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct KarenConfigFile {
    /// Wake word that arms the female persona (e.g. "karen")
    #[serde(default)]
    pub wake_word: Option<String>,

    /// Recognition locale (e.g. "en-US")
    #[serde(default)]
    pub language: Option<String>,

    /// chrono format string used to render the current time
    #[serde(default)]
    pub time_format: Option<String>,

    /// Voice output configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Speech recognition configuration
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Encyclopedia lookup configuration
    #[serde(default)]
    pub encyclopedia: EncyclopediaFileConfig,

    /// Connectivity probe configuration
    #[serde(default)]
    pub connectivity: ConnectivityFileConfig,
}

/// Voice output configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable spoken responses
    pub enabled: Option<bool>,

    /// Name substrings preferred for the male persona, in order
    pub male_preferences: Option<Vec<String>>,

    /// Name substrings preferred for the female persona, in order
    pub female_preferences: Option<Vec<String>>,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    /// Enable microphone input
    pub enabled: Option<bool>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// `OpenAI` API key for Whisper
    pub openai_api_key: Option<String>,
}

/// Encyclopedia lookup configuration
#[derive(Debug, Default, Deserialize)]
pub struct EncyclopediaFileConfig {
    /// Summary endpoint base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Connectivity probe configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConnectivityFileConfig {
    /// `host:port` to probe
    pub probe_addr: Option<String>,

    /// Probe timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `KarenConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> KarenConfigFile {
    let Some(path) = config_file_path() else {
        return KarenConfigFile::default();
    };

    if !path.exists() {
        return KarenConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            KarenConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<KarenConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/karen/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("karen").join("config.toml"))
}
