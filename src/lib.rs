//! Playback Relay - download media playback streams and relay them to Telegram.
//!
//! This library provides the streaming transfer pipeline behind the
//! `playback-relay` CLI.
//!
//! # Features
//!
//! - Validated `video/mp4` playback links with declared size
//! - Progress reporting on the raw download
//! - Optional MP3 extraction through an ffmpeg subprocess
//! - Sequential (disk, then upload) or concurrent (tee) delivery
//! - Size-threshold retention of the local copy
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use playback_relay::config::{validate_config, Config, MediaMode, RetentionIntent};
//! use playback_relay::output::NoProgress;
//! use playback_relay::pipeline::{Pipeline, TranscodeCommand, TransferSession};
//! use playback_relay::source::{resolve, SourceLink};
//! use playback_relay::TelegramSink;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let valid = validate_config(&config)?;
//!
//!     let client = reqwest::Client::new();
//!     let link = SourceLink::parse("https://example.com/videoplayback?mime=video%2Fmp4")?;
//!     let source = resolve(&client, &link).await?;
//!
//!     let session = TransferSession::new(
//!         &valid,
//!         &link,
//!         Some(source.total_bytes),
//!         "talk",
//!         MediaMode::Audio,
//!         RetentionIntent::Discard,
//!     )?;
//!     let sink = TelegramSink::new(
//!         client,
//!         &config.telegram.api_base,
//!         valid.bot_token.clone(),
//!         valid.chat_id,
//!     );
//!     let pipeline = Pipeline::new(sink, TranscodeCommand::ffmpeg_mp3(&valid.ffmpeg_path, "160k"));
//!     pipeline.run(&session, source.stream, Box::new(NoProgress)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod output;
pub mod pipeline;
pub mod source;

// Re-exports for convenience
pub use api::{TelegramSink, UploadSink};
pub use config::{Config, DeliveryMode, MediaMode, RetentionIntent};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, SessionReport, TransferSession};
