//! Configuration structures and loading logic.

use crate::config::modes::DeliveryMode;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Telegram refuses bot uploads above 50 MiB.
pub const DEFAULT_UPLOAD_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Default Telegram Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// External tool locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ffmpeg executable.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

/// Telegram bot credentials and destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather.
    #[serde(default)]
    pub bot_token: String,

    /// Numeric chat identifier, kept as text until validated.
    #[serde(default)]
    pub chat_id: String,

    /// Bot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
        }
    }
}

/// Transfer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Directory where local copies are written.
    #[serde(default)]
    pub local_directory: Option<PathBuf>,

    /// Sequential (disk, then upload) or concurrent (tee) delivery.
    #[serde(default)]
    pub delivery_mode: DeliveryMode,

    /// Maximum byte size eligible for upload; larger content stays on disk.
    #[serde(default = "default_upload_threshold")]
    pub upload_threshold: u64,

    /// Audio bitrate passed to the transcoder.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Open the local directory in the file manager when a file is kept.
    #[serde(default = "default_true")]
    pub reveal_directory: bool,

    /// Whether to show the progress bar.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            local_directory: None,
            delivery_mode: DeliveryMode::default(),
            upload_threshold: DEFAULT_UPLOAD_THRESHOLD,
            audio_bitrate: default_audio_bitrate(),
            reveal_directory: true,
            show_progress: true,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_upload_threshold() -> u64 {
    DEFAULT_UPLOAD_THRESHOLD
}

fn default_audio_bitrate() -> String {
    "160k".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.options.upload_threshold, 52_428_800);
        assert_eq!(config.options.audio_bitrate, "160k");
        assert_eq!(config.options.delivery_mode, DeliveryMode::Sequential);
        assert_eq!(config.telegram.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[telegram]
bot_token = "123:abc"
chat_id = "-1001"

[options]
delivery_mode = "concurrent"
upload_threshold = 1024
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "-1001");
        assert_eq!(config.options.delivery_mode, DeliveryMode::Concurrent);
        assert_eq!(config.options.upload_threshold, 1024);
        assert!(config.options.reveal_directory);
        assert!(config.tools.ffmpeg_path.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
