//! Error types for the playback-relay application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Input validation errors
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Bad url video format, expected {expected} (got {actual})")]
    FormatMismatch { expected: String, actual: String },

    #[error("Invalid video duration on this url: {0}")]
    InvalidDuration(String),

    #[error("No file on this url: {0}")]
    MissingContentLength(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // Transfer errors
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Transcoding failed: {0}")]
    Transcode(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Content reached the upload limit of {threshold} bytes and no local directory is configured")]
    ThresholdExceeded { threshold: u64 },

    #[error("Transfer cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::ConfigValidation { .. }
            | Error::MissingConfig(_)
            | Error::TomlParse(_) => exit_codes::CONFIG_ERROR,
            Error::InvalidLink(_)
            | Error::FormatMismatch { .. }
            | Error::InvalidDuration(_)
            | Error::MissingContentLength(_)
            | Error::InvalidFilename(_)
            | Error::UrlParse(_) => exit_codes::INPUT_ERROR,
            Error::Download(_)
            | Error::Transcode(_)
            | Error::Upload(_)
            | Error::ThresholdExceeded { .. }
            | Error::Http(_) => exit_codes::TRANSFER_ERROR,
            Error::Cancelled => exit_codes::ABORT,
            Error::Io(_) | Error::Json(_) => exit_codes::UNEXPECTED_ERROR,
        }
    }

    /// Rebuild this error so it can be handed to several stream consumers.
    pub fn duplicate(&self) -> Error {
        match self {
            Error::Transcode(m) => Error::Transcode(m.clone()),
            Error::Upload(m) => Error::Upload(m.clone()),
            Error::ThresholdExceeded { threshold } => Error::ThresholdExceeded {
                threshold: *threshold,
            },
            Error::Cancelled => Error::Cancelled,
            Error::Download(m) => Error::Download(m.clone()),
            other => Error::Download(other.to_string()),
        }
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const INPUT_ERROR: i32 = 3;
    pub const TRANSFER_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(
            Error::MissingConfig("bot_token".into()).exit_code(),
            exit_codes::CONFIG_ERROR
        );
        assert_eq!(
            Error::InvalidLink("nope".into()).exit_code(),
            exit_codes::INPUT_ERROR
        );
        assert_eq!(
            Error::Transcode("exit status 1".into()).exit_code(),
            exit_codes::TRANSFER_ERROR
        );
        assert_eq!(Error::Cancelled.exit_code(), exit_codes::ABORT);
    }

    #[test]
    fn test_format_mismatch_message() {
        let err = Error::FormatMismatch {
            expected: "video/mp4".into(),
            actual: "video/webm".into(),
        };
        assert_eq!(
            err.to_string(),
            "Bad url video format, expected video/mp4 (got video/webm)"
        );
    }
}
