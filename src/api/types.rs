//! Telegram Bot API response types.

use serde::Deserialize;

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,

    pub result: Option<T>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub error_code: Option<i64>,
}

/// The parts of a sent message we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
}
