//! Remote delivery module.
//!
//! Provides:
//! - The upload sink contract
//! - Telegram Bot API implementation
//! - Bot API response types

pub mod telegram;
pub mod types;

pub use telegram::{PayloadKind, TelegramSink, UploadReceipt, UploadRequest, UploadSink};
pub use types::{ApiResponse, Message};
