#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Blob transfer client for S3-compatible object storage
//!
//! This crate provides a stateful client that downloads and uploads large
//! remote objects using range requests, resumable partial downloads, and
//! local checksum validation. A download interrupted by connectivity loss or
//! process exit leaves its partial file on disk; a later request for the
//! same destination continues from the last successfully written byte
//! instead of re-fetching content that is already present and valid.
//!
//! All operations are asynchronous and report their progress as
//! [`wallsync_events::TransferEvent`]s; each top-level request yields
//! exactly one terminal [`wallsync_types::TransferResult`], except a
//! cancelled download, which yields none.

mod client;
mod transfer;

pub use client::{BlobClient, ClientConfig, StoreCredentials};
pub use transfer::{GetBlobRequest, MismatchPolicy};
