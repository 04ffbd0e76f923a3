//! Session and delivery mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of media a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Extract the audio track and re-encode it to MP3.
    Audio,
    /// Keep the original MP4 stream untouched (default).
    #[default]
    Video,
}

impl MediaMode {
    /// File extension forced onto the output name, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaMode::Audio => ".mp3",
            MediaMode::Video => ".mp4",
        }
    }

    /// Whether the stream goes through the transcoder.
    pub fn needs_transcoding(&self) -> bool {
        matches!(self, MediaMode::Audio)
    }
}

impl fmt::Display for MediaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaMode::Audio => write!(f, "audio"),
            MediaMode::Video => write!(f, "video"),
        }
    }
}

/// What the user asked to happen with the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionIntent {
    /// Always keep the local file.
    Keep,
    /// Delete the local file once it is no longer needed.
    Discard,
    /// Keep the local file only if it was not delivered remotely.
    #[default]
    Auto,
}

impl RetentionIntent {
    /// Map a yes/no answer to "keep file on disk?".
    pub fn from_answer(keep: bool) -> Self {
        if keep {
            RetentionIntent::Keep
        } else {
            RetentionIntent::Discard
        }
    }
}

impl fmt::Display for RetentionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionIntent::Keep => write!(f, "keep"),
            RetentionIntent::Discard => write!(f, "discard"),
            RetentionIntent::Auto => write!(f, "auto"),
        }
    }
}

/// How the delivery stage routes the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Write to disk first, then upload the finished file (default).
    #[default]
    Sequential,
    /// Upload while writing to disk, fed by a tee.
    Concurrent,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Sequential => write!(f, "sequential"),
            DeliveryMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(DeliveryMode::Sequential),
            "concurrent" => Ok(DeliveryMode::Concurrent),
            _ => Err(format!("Unknown delivery mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_per_mode() {
        assert_eq!(MediaMode::Audio.extension(), ".mp3");
        assert_eq!(MediaMode::Video.extension(), ".mp4");
        assert!(MediaMode::Audio.needs_transcoding());
        assert!(!MediaMode::Video.needs_transcoding());
    }

    #[test]
    fn test_delivery_mode_from_str() {
        assert_eq!(
            "Concurrent".parse::<DeliveryMode>().unwrap(),
            DeliveryMode::Concurrent
        );
        assert!("parallel".parse::<DeliveryMode>().is_err());
    }

    #[test]
    fn test_retention_from_answer() {
        assert_eq!(RetentionIntent::from_answer(true), RetentionIntent::Keep);
        assert_eq!(RetentionIntent::from_answer(false), RetentionIntent::Discard);
    }
}
