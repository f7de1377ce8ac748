use thiserror::Error;

use saldo_domain::UserId;

/// Failures reported by the remote persistence or auth collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("subscription closed by remote")]
    Closed,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no authenticated user")]
    Unauthenticated,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("ledger view belongs to {view}, not to signed-in user {signed_in}")]
    OwnerMismatch { view: UserId, signed_in: UserId },
    #[error("ledger subscription failed: {0}")]
    Sync(#[source] RemoteError),
    #[error("transaction write failed: {0}")]
    Write(#[source] RemoteError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
