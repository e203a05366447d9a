//! Client lifecycle error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("client is not initialized")]
    NotInitialized,
}
