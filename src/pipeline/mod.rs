//! Streaming transfer pipeline.
//!
//! This module provides:
//! - Byte stream plumbing (tee, threshold guard, file writer)
//! - The transcoding stage
//! - Sequential and concurrent delivery
//! - The retention policy
//! - Transfer sessions and the pipeline runner

pub mod deliver;
pub mod retention;
pub mod session;
pub mod stream;
pub mod transcode;

pub use deliver::{deliver_concurrent, deliver_sequential, DeliveryOutcome};
pub use retention::{decide, RetentionDecision, UploadStatus};
pub use session::{Pipeline, SessionReport, TransferSession};
pub use stream::{tee, ByteStream, Completion, Tee, ThresholdGuard};
pub use transcode::{spawn_transcoder, TranscodeCommand, TranscodeStage};
