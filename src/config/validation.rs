//! Configuration gate: checks everything a session needs before any stream opens.

use std::path::{Path, PathBuf};

use crate::config::loader::Config;
use crate::config::modes::DeliveryMode;
use crate::error::{Error, Result};

/// Configuration values after the gate has accepted them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub ffmpeg_path: PathBuf,
    pub bot_token: String,
    pub chat_id: i64,
    pub local_directory: Option<PathBuf>,
    pub delivery_mode: DeliveryMode,
    pub upload_threshold: u64,
}

/// Validate the entire configuration, failing on the first bad value.
pub fn validate_config(config: &Config) -> Result<ValidatedConfig> {
    let ffmpeg_path = validate_tool_path(config.tools.ffmpeg_path.as_deref())?;
    validate_token(&config.telegram.bot_token)?;
    let chat_id = validate_chat_id(&config.telegram.chat_id)?;
    let local_directory = validate_local_directory(
        config.options.local_directory.as_deref(),
        config.options.delivery_mode,
    )?;

    if config.options.upload_threshold == 0 {
        return Err(Error::ConfigValidation {
            field: "upload_threshold".to_string(),
            message: "Threshold must be greater than zero".to_string(),
        });
    }

    Ok(ValidatedConfig {
        ffmpeg_path,
        bot_token: config.telegram.bot_token.clone(),
        chat_id,
        local_directory,
        delivery_mode: config.options.delivery_mode,
        upload_threshold: config.options.upload_threshold,
    })
}

/// Validate that the transcoding tool exists on disk.
pub fn validate_tool_path(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.ok_or_else(|| Error::MissingConfig("FFMPEG_PATH".to_string()))?;

    if !path.exists() {
        return Err(Error::ConfigValidation {
            field: "FFMPEG_PATH".to_string(),
            message: format!("No such file: {}", path.display()),
        });
    }

    Ok(path.to_path_buf())
}

/// Validate the bot token.
pub fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(Error::MissingConfig("TELEGRAM_BOT_TOKEN".to_string()));
    }

    Ok(())
}

/// Validate and parse the destination chat identifier.
pub fn validate_chat_id(chat_id: &str) -> Result<i64> {
    let chat_id = chat_id.trim();
    if chat_id.is_empty() {
        return Err(Error::MissingConfig("TELEGRAM_CHAT_ID".to_string()));
    }

    chat_id.parse::<i64>().map_err(|_| Error::ConfigValidation {
        field: "TELEGRAM_CHAT_ID".to_string(),
        message: format!("'{}' is not a numeric chat id", chat_id),
    })
}

/// Validate the local directory.
///
/// Sequential delivery always writes to disk first, so the directory is
/// mandatory there. Concurrent delivery can run upload-only, so the
/// directory is checked only when one is configured.
pub fn validate_local_directory(
    dir: Option<&Path>,
    mode: DeliveryMode,
) -> Result<Option<PathBuf>> {
    match (dir, mode) {
        (None, DeliveryMode::Sequential) => {
            Err(Error::MissingConfig("LOCAL_DIRECTORY".to_string()))
        }
        (None, DeliveryMode::Concurrent) => Ok(None),
        (Some(dir), _) if !dir.is_dir() => Err(Error::ConfigValidation {
            field: "LOCAL_DIRECTORY".to_string(),
            message: format!("No such directory: {}", dir.display()),
        }),
        (Some(dir), _) => Ok(Some(dir.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config(dir: &Path, tool: &Path) -> Config {
        let mut config = Config::default();
        config.tools.ffmpeg_path = Some(tool.to_path_buf());
        config.telegram.bot_token = "123456:ABC-DEF".to_string();
        config.telegram.chat_id = "-100200300".to_string();
        config.options.local_directory = Some(dir.to_path_buf());
        config
    }

    #[test]
    fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let tool = tempfile::NamedTempFile::new().unwrap();
        let validated = validate_config(&valid_config(dir.path(), tool.path())).unwrap();

        assert_eq!(validated.chat_id, -100200300);
        assert_eq!(validated.local_directory.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let config = valid_config(dir.path(), &dir.path().join("ffmpeg-missing"));
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { .. })
        ));
        assert!(matches!(
            validate_tool_path(None),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_empty_token() {
        assert!(validate_token("").is_err());
        assert!(validate_token("   ").is_err());
        assert!(validate_token("123:abc").is_ok());
    }

    #[test]
    fn test_chat_id() {
        assert_eq!(validate_chat_id("42").unwrap(), 42);
        assert_eq!(validate_chat_id(" -1001 ").unwrap(), -1001);
        assert!(validate_chat_id("").is_err());
        assert!(validate_chat_id("NaN").is_err());
        assert!(validate_chat_id("12abc").is_err());
    }

    #[test]
    fn test_directory_depends_on_delivery_mode() {
        assert!(validate_local_directory(None, DeliveryMode::Sequential).is_err());
        assert_eq!(
            validate_local_directory(None, DeliveryMode::Concurrent).unwrap(),
            None
        );

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(validate_local_directory(Some(&missing), DeliveryMode::Concurrent).is_err());
        assert!(validate_local_directory(Some(dir.path()), DeliveryMode::Sequential).is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = tempfile::NamedTempFile::new().unwrap();
        let mut config = valid_config(dir.path(), tool.path());
        config.options.upload_threshold = 0;
        assert!(validate_config(&config).is_err());
    }
}
