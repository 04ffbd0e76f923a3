//! Configuration module for playback-relay.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Session, delivery and retention modes
//! - The configuration gate run before every session

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{
    Config, OptionsConfig, TelegramConfig, ToolsConfig, DEFAULT_API_BASE,
    DEFAULT_UPLOAD_THRESHOLD,
};
pub use modes::{DeliveryMode, MediaMode, RetentionIntent};
pub use validation::{validate_config, ValidatedConfig};
