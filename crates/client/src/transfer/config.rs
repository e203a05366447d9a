//! Request parameters for resumable downloads

use std::path::PathBuf;
use wallsync_types::TransferMode;

/// What to do with a cached file that fails checksum validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Delete the file and download from scratch
    Delete,
    /// Keep the file; a partial resumed copy fails a full-content check
    /// until complete, and the bytes already on disk are worth keeping on
    /// constrained connections
    Keep,
}

/// Parameters of one resumable download request
///
/// Constant for the lifetime of the request.
#[derive(Debug, Clone)]
pub struct GetBlobRequest {
    /// Remote object key
    pub key: String,
    /// Local destination path
    pub destination: PathBuf,
    /// Skip cache validation and fetch even when a valid copy exists
    pub force_download: bool,
    /// Expected content digest of the complete object, usually the entity
    /// tag reported by the backend; `None` or empty disables validation
    pub checksum: Option<String>,
    /// Part size preset
    pub mode: TransferMode,
    /// Override of the mismatch policy; `None` derives it from the mode
    pub mismatch_policy: Option<MismatchPolicy>,
}

impl GetBlobRequest {
    #[must_use]
    pub fn new(key: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            destination: destination.into(),
            force_download: false,
            checksum: None,
            mode: TransferMode::default(),
            mismatch_policy: None,
        }
    }

    /// Fetch even when the cached copy validates
    #[must_use]
    pub fn force_download(mut self) -> Self {
        self.force_download = true;
        self
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = Some(policy);
        self
    }

    /// Mismatch policy in effect: explicit override, else derived from the
    /// transfer mode (slow keeps, normal deletes).
    pub(crate) fn effective_mismatch_policy(&self) -> MismatchPolicy {
        self.mismatch_policy.unwrap_or(match self.mode {
            TransferMode::Slow => MismatchPolicy::Keep,
            TransferMode::Normal => MismatchPolicy::Delete,
        })
    }
}
