//! Post-transfer decision about the local copy.

use crate::config::RetentionIntent;

/// What happened on the remote side of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// The sink confirmed the full payload.
    Delivered { message_id: i64 },
    /// The content was at or above the threshold and was never delivered.
    SkippedOverThreshold,
}

/// Fate of the local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionDecision {
    Keep,
    Delete,
}

/// Decide whether the local copy survives the session.
///
/// | size vs threshold | intent  | outcome                         |
/// |-------------------|---------|---------------------------------|
/// | below             | discard | delete                          |
/// | below             | auto    | delete if delivered, else keep  |
/// | below             | keep    | keep                            |
/// | at/above          | any     | keep                            |
pub fn decide(
    final_size: u64,
    threshold: u64,
    upload: UploadStatus,
    intent: RetentionIntent,
) -> RetentionDecision {
    if final_size >= threshold || upload == UploadStatus::SkippedOverThreshold {
        return RetentionDecision::Keep;
    }

    match (intent, upload) {
        (RetentionIntent::Keep, _) => RetentionDecision::Keep,
        (RetentionIntent::Discard, _) => RetentionDecision::Delete,
        (RetentionIntent::Auto, UploadStatus::Delivered { .. }) => RetentionDecision::Delete,
        (RetentionIntent::Auto, UploadStatus::SkippedOverThreshold) => RetentionDecision::Keep,
    }
}
