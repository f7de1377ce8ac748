//! Collaborator contracts for the remote document store and authentication.
//!
//! The ledger only needs create, keyed read, query-by-field, live
//! query subscription and merge-write, plus a source of user identity. Any
//! document or key-value service offering query-by-owner and change
//! notification can implement these traits.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use saldo_domain::UserId;

use crate::RemoteError;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

/// One item delivered by a live query: a full snapshot of the matching
/// documents, or the error that ended the subscription.
pub type SnapshotEvent = Result<Vec<Document>, RemoteError>;

/// Collection names used by the ledger services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub transactions: String,
    pub users: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            transactions: "transactions".into(),
            users: "users".into(),
        }
    }
}

/// A document together with its store-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Receiving end of a live query.
///
/// Dropping the stream releases the subscription; stores are expected to
/// stop delivering to closed streams.
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl SnapshotStream {
    /// Creates a connected sender/stream pair for store implementations.
    pub fn channel() -> (mpsc::UnboundedSender<SnapshotEvent>, SnapshotStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, SnapshotStream { receiver })
    }

    /// Waits for the next snapshot. `None` means the store closed the stream.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.receiver.recv().await
    }
}

/// Remote document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document and returns its store-assigned identifier.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, RemoteError>;

    /// Reads a document by identifier.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError>;

    /// Returns every document whose `field` equals `value`.
    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, RemoteError>;

    /// Opens a live query. The current snapshot is delivered first, then a
    /// new full snapshot after every change to the matching set. Snapshots
    /// list documents in write order, oldest first.
    async fn listen(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<SnapshotStream, RemoteError>;

    /// Writes `fields` into the document `id`, creating it when missing and
    /// leaving other fields untouched.
    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), RemoteError>;
}

/// Source of the signed-in user's identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;

    /// Signs in an existing account. Unknown emails and wrong passwords both
    /// report [`RemoteError::InvalidCredentials`].
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<UserId, RemoteError>;

    /// Creates an account and signs it in.
    async fn create_user_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserId, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;
}
