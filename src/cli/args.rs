//! Command-line argument definitions using clap.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, DeliveryMode, MediaMode, RetentionIntent};

/// Playback stream downloader and Telegram relay.
#[derive(Parser, Debug)]
#[command(
    name = "playback-relay",
    version,
    about = "Download a media playback stream, optionally extract MP3 audio, and relay it to Telegram",
    long_about = "Downloads a video/mp4 playback link, optionally converts it to MP3 with ffmpeg,\n\
                  and sends the result to a Telegram chat through a bot.\n\n\
                  Files at or above the upload limit are kept on disk instead.\n\
                  Any session input not given as a flag is asked interactively."
)]
#[command(group(ArgGroup::new("media").args(["audio", "video"])))]
#[command(group(ArgGroup::new("retention").args(["keep", "discard"])))]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to the ffmpeg executable.
    #[arg(long = "ffmpeg", env = "FFMPEG_PATH")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Telegram bot token.
    #[arg(short, long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Telegram chat id to deliver to.
    #[arg(long = "chat-id", env = "TELEGRAM_CHAT_ID", allow_hyphen_values = true)]
    pub chat_id: Option<String>,

    /// Directory for local copies.
    #[arg(short = 'd', long = "directory", env = "LOCAL_DIRECTORY")]
    pub local_directory: Option<PathBuf>,

    /// How the result is delivered.
    #[arg(long, value_enum)]
    pub delivery: Option<DeliveryModeArg>,

    /// Upload limit in bytes.
    #[arg(long)]
    pub threshold: Option<u64>,

    /// Playback link to download.
    #[arg(short, long)]
    pub link: Option<String>,

    /// Output file name (extension is added automatically).
    #[arg(short, long)]
    pub name: Option<String>,

    /// Extract MP3 audio only.
    #[arg(long)]
    pub audio: bool,

    /// Keep the original video.
    #[arg(long)]
    pub video: bool,

    /// Keep the local file after uploading.
    #[arg(long)]
    pub keep: bool,

    /// Delete the local file after uploading.
    #[arg(long)]
    pub discard: bool,

    /// Don't open the local directory when a file is kept.
    #[arg(long)]
    pub no_reveal: bool,

    /// Hide the progress bar.
    #[arg(long, short)]
    pub quiet: bool,

    /// Exit immediately instead of waiting for a key press.
    #[arg(long)]
    pub no_wait: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI delivery mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeliveryModeArg {
    /// Write to disk, then upload the finished file.
    Sequential,
    /// Upload while writing to disk.
    Concurrent,
}

impl From<DeliveryModeArg> for DeliveryMode {
    fn from(arg: DeliveryModeArg) -> Self {
        match arg {
            DeliveryModeArg::Sequential => DeliveryMode::Sequential,
            DeliveryModeArg::Concurrent => DeliveryMode::Concurrent,
        }
    }
}

/// Session inputs given on the command line; missing ones are prompted for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionArgs {
    pub link: Option<String>,
    pub name: Option<String>,
    pub mode: Option<MediaMode>,
    pub retention: Option<RetentionIntent>,
}

impl Args {
    /// Session inputs carried by these arguments.
    pub fn session_args(&self) -> SessionArgs {
        let mode = match (self.audio, self.video) {
            (true, _) => Some(MediaMode::Audio),
            (_, true) => Some(MediaMode::Video),
            _ => None,
        };
        let retention = match (self.keep, self.discard) {
            (true, _) => Some(RetentionIntent::Keep),
            (_, true) => Some(RetentionIntent::Discard),
            _ => None,
        };

        SessionArgs {
            link: self.link.clone(),
            name: self.name.clone(),
            mode,
            retention,
        }
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(path) = &self.ffmpeg_path {
            config.tools.ffmpeg_path = Some(path.clone());
        }

        if let Some(token) = &self.token {
            config.telegram.bot_token = token.clone();
        }

        if let Some(chat_id) = &self.chat_id {
            config.telegram.chat_id = chat_id.clone();
        }

        if let Some(dir) = &self.local_directory {
            config.options.local_directory = Some(dir.clone());
        }

        if let Some(mode) = self.delivery {
            config.options.delivery_mode = mode.into();
        }

        if let Some(threshold) = self.threshold {
            config.options.upload_threshold = threshold;
        }

        // Boolean flags (only override if set to non-default)
        if self.no_reveal {
            config.options.reveal_directory = false;
        }

        if self.quiet {
            config.options.show_progress = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides() {
        let args = Args::parse_from([
            "playback-relay",
            "--token",
            "123:abc",
            "--chat-id",
            "-100",
            "--delivery",
            "concurrent",
            "--no-reveal",
        ]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "-100");
        assert_eq!(config.options.delivery_mode, DeliveryMode::Concurrent);
        assert!(!config.options.reveal_directory);
    }

    #[test]
    fn test_session_args() {
        let args = Args::parse_from(["playback-relay", "--audio", "--keep", "-n", "song"]);
        let session = args.session_args();
        assert_eq!(session.mode, Some(MediaMode::Audio));
        assert_eq!(session.retention, Some(RetentionIntent::Keep));
        assert_eq!(session.name.as_deref(), Some("song"));
        assert_eq!(session.link, None);
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        assert!(Args::try_parse_from(["playback-relay", "--audio", "--video"]).is_err());
        assert!(Args::try_parse_from(["playback-relay", "--keep", "--discard"]).is_err());
    }
}
