//! Transfer-domain events

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted by the blob transfer client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransferEvent {
    /// Download started, possibly resuming from a partial local copy
    DownloadStarted {
        object: String,
        total_size: u64,
        resume_offset: u64,
    },

    /// One ranged chunk was fetched and appended to the local file
    ChunkReceived { object: String, start: u64, len: u64 },

    /// The local copy passed checksum validation; no content was fetched
    CacheHit { object: String, path: PathBuf },

    /// The local copy was longer than the remote object and was discarded
    StaleCopyDiscarded {
        object: String,
        local_len: u64,
        remote_len: u64,
    },

    /// The local copy failed checksum validation
    ChecksumMismatch { path: PathBuf, deleted: bool },

    /// Download completed successfully
    DownloadCompleted { object: String, size: u64 },

    /// Upload started
    UploadStarted { object: String, size: u64 },

    /// Upload completed successfully
    UploadCompleted { object: String },

    /// Remote object deleted
    DeleteCompleted { object: String },

    /// A transfer operation failed with a terminal error
    TransferFailed {
        object: String,
        status: u16,
        message: String,
    },

    /// Debug message
    Debug { message: String },

    /// Warning message
    Warning { message: String },
}

impl TransferEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::ChunkReceived { .. } | Self::Debug { .. } => Level::DEBUG,
            Self::StaleCopyDiscarded { .. }
            | Self::ChecksumMismatch { .. }
            | Self::Warning { .. } => Level::WARN,
            Self::TransferFailed { .. } => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Bridge this event to `tracing` at its severity
    pub fn trace(&self) {
        use tracing::Level;

        match self.log_level() {
            Level::ERROR => tracing::error!(target: "wallsync", event = ?self),
            Level::WARN => tracing::warn!(target: "wallsync", event = ?self),
            Level::INFO => tracing::info!(target: "wallsync", event = ?self),
            _ => tracing::debug!(target: "wallsync", event = ?self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_by_type() {
        let event = TransferEvent::DownloadCompleted {
            object: "wall-assets/images/bg.png".to_string(),
            size: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"DownloadCompleted\""));
    }

    #[test]
    fn failure_logs_as_error() {
        let event = TransferEvent::TransferFailed {
            object: "wall-assets/missing.png".to_string(),
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(event.log_level(), tracing::Level::ERROR);
    }
}
