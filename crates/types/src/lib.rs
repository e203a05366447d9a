#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Shared types for the wallsync blob transfer client
//!
//! This crate holds the data model exchanged between the client façade,
//! the transfer session, and event consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a remote blob as a bucket/key pair.
///
/// Immutable for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Metadata of a remote blob as reported by the store.
///
/// Fetched fresh once per transfer attempt and never cached across attempts;
/// the remote object may change between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Total content length in bytes.
    pub content_length: u64,
    /// Entity tag reported by the store, if any.
    pub e_tag: Option<String>,
}

/// Part-size preset for a transfer.
///
/// `Slow` trades request count for small per-request payloads on constrained
/// connections. The concrete part sizes live in the client configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    Slow,
    #[default]
    Normal,
}

/// Terminal outcome of a single top-level transfer operation.
///
/// One result is produced per request and delivered exactly once, for every
/// operation shape (get, put, delete, text fetch). A cancelled download
/// produces no result at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub success: bool,
    /// HTTP-like status code. `0` is the sentinel for transport failures
    /// that carry no remote status.
    pub status: u16,
    /// Key the request was issued for.
    pub key: String,
    /// Content text on success, error message on failure.
    pub body: String,
}

impl TransferResult {
    /// Successful outcome with an optional body text.
    #[must_use]
    pub fn ok(status: u16, key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            success: true,
            status,
            key: key.into(),
            body: body.into(),
        }
    }

    /// Failed outcome carrying the error message in the body.
    #[must_use]
    pub fn error(status: u16, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            key: key.into(),
            body: message.into(),
        }
    }
}
