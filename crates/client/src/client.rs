//! Stateful blob client façade over an S3-compatible store

use crate::transfer::{DownloadSession, GetBlobRequest};
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use wallsync_errors::{ClientError, Error, NetworkError};
use wallsync_events::{EventEmitter, EventSender, TransferEvent};
use wallsync_types::{ObjectMetadata, ObjectRef, TransferMode, TransferResult};

/// Status code reported for failures that never reached the remote store.
const STATUS_INTERNAL: u16 = 500;

/// Blob client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Custom endpoint for S3-compatible stores; `None` uses the region
    /// default.
    pub endpoint: Option<String>,
    /// Connection establishment timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Per-read timeout on response bodies (default: 30s)
    pub read_timeout: Duration,
    /// Part size for constrained connections (default: 100KB)
    pub slow_part_size: u64,
    /// Part size for normal connections (default: 5MB)
    pub normal_part_size: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            slow_part_size: 102_400,
            normal_part_size: 5_242_880,
        }
    }
}

/// Static access key pair for the object store
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StoreCredentials {
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

/// Connection state established by [`BlobClient::initialize`]
pub(crate) struct ClientSession {
    pub(crate) s3: Client,
    pub(crate) bucket: String,
    region: String,
    update_location: String,
}

impl ClientSession {
    pub(crate) fn object(&self, key: &str) -> ObjectRef {
        ObjectRef::new(self.bucket.clone(), key)
    }

    /// Fetch length and entity tag of a remote object.
    pub(crate) async fn fetch_metadata(&self, key: &str) -> Result<ObjectMetadata, RemoteFailure> {
        let head = self
            .s3
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| RemoteFailure::from_sdk(&e))?;

        Ok(ObjectMetadata {
            content_length: u64::try_from(head.content_length.unwrap_or(0)).unwrap_or(0),
            e_tag: head.e_tag,
        })
    }
}

/// A remote operation that did not produce a usable response.
///
/// `status` is the HTTP status of a classified remote error, or `0` when
/// the failure happened below the protocol (timeout, connection reset, DNS).
pub(crate) struct RemoteFailure {
    pub(crate) status: u16,
    pub(crate) message: String,
}

impl RemoteFailure {
    pub(crate) fn from_sdk<E>(err: &SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let status = err.raw_response().map_or(0, |r| r.status().as_u16());
        let message = err
            .meta()
            .message()
            .map_or_else(|| err.to_string(), ToString::to_string);
        Self { status, message }
    }

    pub(crate) fn transport(err: &impl std::error::Error) -> Self {
        Self {
            status: 0,
            message: err.to_string(),
        }
    }

    fn into_error(self) -> Error {
        if self.status == 0 {
            NetworkError::Transport(self.message).into()
        } else {
            NetworkError::Http {
                status: self.status,
                message: self.message,
            }
            .into()
        }
    }

    fn into_result(self, key: &str) -> TransferResult {
        TransferResult::error(self.status, key, self.message)
    }
}

/// Stateful client for one object-store container
///
/// Owns the connection/auth session, the cancellation flag, and the part
/// size presets. Operations on distinct destinations may run concurrently
/// (share the client behind an `Arc`); `initialize` and `clear` require
/// exclusive access and must not race with in-flight requests.
pub struct BlobClient {
    config: ClientConfig,
    session: Option<ClientSession>,
    cancelled: AtomicBool,
}

impl BlobClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Establish the store session
    ///
    /// Must be called before any other operation; may be called again to
    /// rotate credentials or switch buckets.
    pub async fn initialize(
        &mut self,
        credentials: StoreCredentials,
        bucket: impl Into<String>,
        region: impl Into<String>,
        update_location: impl Into<String>,
    ) {
        let region = region.into();

        let provider = Credentials::new(
            credentials.access_key_id,
            credentials.secret_access_key,
            None,
            None,
            "wallsync",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .credentials_provider(provider)
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(self.config.connect_timeout)
                    .read_timeout(self.config.read_timeout)
                    .build(),
            );

        if let Some(endpoint) = &self.config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        let s3 = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&shared)
                .force_path_style(true)
                .build(),
        );

        self.session = Some(ClientSession {
            s3,
            bucket: bucket.into(),
            region,
            update_location: update_location.into(),
        });
    }

    /// Drop the session and credentials
    pub fn clear(&mut self) {
        self.session = None;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.bucket.as_str())
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.region.as_str())
    }

    /// Key of the update package configured at `initialize` time
    ///
    /// Pure accessor for the external updater component.
    #[must_use]
    pub fn update_location(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.update_location.as_str())
    }

    /// Request cancellation of the in-flight resumable download
    ///
    /// Cooperative: takes effect at the next continuation boundary, after
    /// the current chunk has been appended. The partial file stays on disk
    /// and a later [`Self::get_blob`] for the same destination resumes
    /// from it.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Fetch metadata of a remote object
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotInitialized`] when called before
    /// [`Self::initialize`], a [`NetworkError`] for remote or transport
    /// failures.
    pub async fn get_metadata(&self, key: &str) -> Result<ObjectMetadata, Error> {
        let session = self.session.as_ref().ok_or(ClientError::NotInitialized)?;
        let key = normalize_key(key);

        session
            .fetch_metadata(&key)
            .await
            .map_err(RemoteFailure::into_error)
    }

    /// Fetch a whole small object as text
    ///
    /// No resumption; intended for config-sized objects.
    pub async fn get_text_blob(&self, key: &str, tx: &EventSender) -> TransferResult {
        let key = normalize_key(key);
        let Some(session) = &self.session else {
            return not_initialized(&key, tx);
        };
        let object = session.object(&key);
        tx.emit_debug(format!("get_text_blob {object}"));

        if let Err(failure) = session.fetch_metadata(&key).await {
            return fail(failure, &object, tx);
        }

        let response = match session
            .s3
            .get_object()
            .bucket(&session.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return fail(RemoteFailure::from_sdk(&e), &object, tx),
        };

        match response.body.collect().await {
            Ok(data) => {
                let text = String::from_utf8_lossy(&data.to_vec()).into_owned();
                TransferResult::ok(200, &key, text)
            }
            Err(e) => fail(RemoteFailure::transport(&e), &object, tx),
        }
    }

    /// Download a remote object to a local file, resuming partial copies
    ///
    /// The resumable path: remote metadata is fetched once, a supplied
    /// checksum may validate the cached copy without any content fetch,
    /// and otherwise ranged fetches append to the destination until the
    /// object is fully present. Returns `Ok(None)` iff the transfer was
    /// cancelled mid-flight via [`Self::stop`]; every other outcome yields
    /// exactly one [`TransferResult`].
    ///
    /// # Errors
    ///
    /// Returns an error only for unrecoverable local I/O failures (for
    /// example, permission denied on the destination). Remote and
    /// transport failures are reported through the result instead.
    pub async fn get_blob(
        &self,
        request: &GetBlobRequest,
        tx: &EventSender,
    ) -> Result<Option<TransferResult>, Error> {
        // A fresh top-level request clears any leftover stop signal.
        self.cancelled.store(false, Ordering::SeqCst);

        let key = normalize_key(&request.key);
        let Some(session) = &self.session else {
            return Ok(Some(not_initialized(&key, tx)));
        };

        let part_size = match request.mode {
            TransferMode::Slow => self.config.slow_part_size,
            TransferMode::Normal => self.config.normal_part_size,
        };

        DownloadSession::new(session, request, key, part_size, &self.cancelled, tx)
            .run()
            .await
    }

    /// Upload a byte buffer as a remote object, private ACL
    pub async fn put_blob(&self, content: Vec<u8>, key: &str, tx: &EventSender) -> TransferResult {
        let key = normalize_key(key);
        let Some(session) = &self.session else {
            return not_initialized(&key, tx);
        };
        let object = session.object(&key);
        tx.emit(TransferEvent::UploadStarted {
            object: object.to_string(),
            size: content.len() as u64,
        });

        match session
            .s3
            .put_object()
            .bucket(&session.bucket)
            .key(&key)
            .body(ByteStream::from(content))
            .acl(ObjectCannedAcl::Private)
            .send()
            .await
        {
            Ok(_) => {
                tx.emit(TransferEvent::UploadCompleted {
                    object: object.to_string(),
                });
                TransferResult::ok(200, &key, String::new())
            }
            Err(e) => fail(RemoteFailure::from_sdk(&e), &object, tx),
        }
    }

    /// Upload a text string as a remote object, private ACL
    pub async fn put_text_blob(&self, content: &str, key: &str, tx: &EventSender) -> TransferResult {
        self.put_blob(content.as_bytes().to_vec(), key, tx).await
    }

    /// Delete a remote object
    ///
    /// Confirms the object exists first, so a failure result carrying the
    /// metadata status (e.g. 404) means "object never existed" as opposed
    /// to a failed deletion.
    pub async fn delete_blob(&self, key: &str, tx: &EventSender) -> TransferResult {
        let key = normalize_key(key);
        let Some(session) = &self.session else {
            return not_initialized(&key, tx);
        };
        let object = session.object(&key);
        tx.emit_debug(format!("delete_blob {object}"));

        if let Err(failure) = session.fetch_metadata(&key).await {
            return fail(failure, &object, tx);
        }

        match session
            .s3
            .delete_object()
            .bucket(&session.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => {
                tx.emit(TransferEvent::DeleteCompleted {
                    object: object.to_string(),
                });
                TransferResult::ok(204, &key, String::new())
            }
            Err(e) => fail(RemoteFailure::from_sdk(&e), &object, tx),
        }
    }
}

/// Collapse accidental double slashes in object keys.
fn normalize_key(key: &str) -> String {
    key.replace("//", "/")
}

fn not_initialized(key: &str, tx: &EventSender) -> TransferResult {
    tx.emit_warning(format!("operation on {key} before initialize"));
    TransferResult::error(
        STATUS_INTERNAL,
        key,
        ClientError::NotInitialized.to_string(),
    )
}

fn fail(failure: RemoteFailure, object: &ObjectRef, tx: &EventSender) -> TransferResult {
    tx.emit(TransferEvent::TransferFailed {
        object: object.to_string(),
        status: failure.status,
        message: failure.message.clone(),
    });
    failure.into_result(&object.key)
}
