//! One resumable download, from metadata fetch to terminal result

use super::config::{GetBlobRequest, MismatchPolicy};
use super::range::{next_range, RangePlan};
use crate::client::{ClientSession, RemoteFailure};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use wallsync_errors::Error;
use wallsync_events::{EventEmitter, EventSender, TransferEvent};
use wallsync_hash::verify_cached;
use wallsync_types::{ObjectRef, TransferResult};

/// Orchestrates one top-level download request
///
/// Invariants: at most one network operation is in flight at a time,
/// fetched ranges are strictly sequential and monotonically increasing,
/// and the on-disk length never exceeds the remote length observed at the
/// session's metadata fetch.
pub(crate) struct DownloadSession<'a> {
    session: &'a ClientSession,
    request: &'a GetBlobRequest,
    key: String,
    object: ObjectRef,
    part_size: u64,
    cancelled: &'a AtomicBool,
    tx: &'a EventSender,
}

impl<'a> DownloadSession<'a> {
    pub(crate) fn new(
        session: &'a ClientSession,
        request: &'a GetBlobRequest,
        key: String,
        part_size: u64,
        cancelled: &'a AtomicBool,
        tx: &'a EventSender,
    ) -> Self {
        let object = session.object(&key);
        Self {
            session,
            request,
            key,
            object,
            part_size,
            cancelled,
            tx,
        }
    }

    /// Run the session to its terminal state
    ///
    /// Returns `Ok(None)` iff the transfer was cancelled at a continuation
    /// boundary; the partial file stays on disk as the resume cursor for a
    /// later request. Remote and transport failures terminate with a
    /// failure result; only local I/O errors propagate as `Err`.
    pub(crate) async fn run(self) -> Result<Option<TransferResult>, Error> {
        let destination = self.request.destination.as_path();

        let metadata = match self.session.fetch_metadata(&self.key).await {
            Ok(metadata) => metadata,
            Err(failure) => return Ok(Some(self.fail(failure))),
        };
        let remote_len = metadata.content_length;

        if !self.request.force_download {
            if let Some(valid) = self.check_cache(destination, remote_len).await? {
                if valid {
                    self.tx.emit(TransferEvent::CacheHit {
                        object: self.object.to_string(),
                        path: destination.to_path_buf(),
                    });
                    return Ok(Some(TransferResult::ok(
                        200,
                        &self.key,
                        format!("serving cached copy {}", destination.display()),
                    )));
                }
            }
        }

        let resume_offset = file_len(destination).await?;
        self.tx.emit(TransferEvent::DownloadStarted {
            object: self.object.to_string(),
            total_size: remote_len,
            resume_offset,
        });

        loop {
            let local_len = file_len(destination).await?;

            let (start, end) = match next_range(remote_len, local_len, self.part_size) {
                RangePlan::Complete => return Ok(Some(self.complete(remote_len))),
                RangePlan::Stale => {
                    self.tx.emit(TransferEvent::StaleCopyDiscarded {
                        object: self.object.to_string(),
                        local_len,
                        remote_len,
                    });
                    fs::remove_file(destination)
                        .await
                        .map_err(|e| Error::io_with_path(&e, destination))?;
                    continue;
                }
                RangePlan::Fetch { start, end } => (start, end),
            };

            let chunk = match self.fetch_range(start, end).await {
                Ok(chunk) => chunk,
                Err(failure) => return Ok(Some(self.fail(failure))),
            };

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io_with_path(&e, parent))?;
            }

            // Lost race with a concurrent writer: the file may have become
            // complete while the fetch was in flight.
            if file_len(destination).await? == remote_len {
                return Ok(Some(self.complete(remote_len)));
            }

            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(destination)
                .await
                .map_err(|e| Error::io_with_path(&e, destination))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io_with_path(&e, destination))?;
            file.flush()
                .await
                .map_err(|e| Error::io_with_path(&e, destination))?;
            drop(file);

            let received = chunk.len() as u64;
            self.tx.emit(TransferEvent::ChunkReceived {
                object: self.object.to_string(),
                start,
                len: received,
            });
            drop(chunk);

            // A window shorter than the part size is the final one.
            if received < self.part_size {
                return Ok(Some(self.complete(remote_len)));
            }

            if self.cancelled.load(Ordering::SeqCst) {
                tracing::debug!(target: "wallsync", object = %self.object, "download stopped");
                return Ok(None);
            }
        }
    }

    /// Validate the cached copy when the caller supplied a checksum.
    ///
    /// `None` means no validation was requested; `Some(valid)` is the
    /// verifier's verdict. A mismatching file is deleted or kept according
    /// to the request's mismatch policy.
    async fn check_cache(&self, destination: &Path, remote_len: u64) -> Result<Option<bool>, Error> {
        let Some(expected) = self
            .request
            .checksum
            .as_deref()
            .filter(|expected| !expected.is_empty())
        else {
            return Ok(None);
        };

        let existed = fs::try_exists(destination).await?;
        let delete = self.request.effective_mismatch_policy() == MismatchPolicy::Delete;
        let valid = verify_cached(destination, expected, delete).await?;

        if !valid && existed {
            // A kept full-length copy is complete yet corrupt, not a
            // legitimate partial; discard it so the range planner does not
            // report it complete.
            let corrupt_complete = !delete && file_len(destination).await? == remote_len;
            if corrupt_complete {
                fs::remove_file(destination)
                    .await
                    .map_err(|e| Error::io_with_path(&e, destination))?;
            }
            self.tx.emit(TransferEvent::ChecksumMismatch {
                path: destination.to_path_buf(),
                deleted: delete || corrupt_complete,
            });
        }

        Ok(Some(valid))
    }

    async fn fetch_range(&self, start: u64, end: u64) -> Result<Vec<u8>, RemoteFailure> {
        let response = self
            .session
            .s3
            .get_object()
            .bucket(&self.session.bucket)
            .key(&self.key)
            .range(format!("bytes={start}-{}", end - 1))
            .send()
            .await
            .map_err(|e| RemoteFailure::from_sdk(&e))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| RemoteFailure::transport(&e))?;

        Ok(data.to_vec())
    }

    fn complete(&self, size: u64) -> TransferResult {
        self.tx.emit(TransferEvent::DownloadCompleted {
            object: self.object.to_string(),
            size,
        });
        TransferResult::ok(200, &self.key, String::new())
    }

    fn fail(&self, failure: RemoteFailure) -> TransferResult {
        self.tx.emit(TransferEvent::TransferFailed {
            object: self.object.to_string(),
            status: failure.status,
            message: failure.message.clone(),
        });
        TransferResult::error(failure.status, &self.key, failure.message)
    }
}

/// Length of a local file, `0` when it does not exist.
async fn file_len(path: &Path) -> Result<u64, Error> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}
