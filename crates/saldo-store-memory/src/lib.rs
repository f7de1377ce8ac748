//! saldo-store-memory
//!
//! In-process implementation of the remote collaborators used by saldo-core:
//! a document store with live queries and an authentication provider.
//! Snapshots can be persisted to JSON files. Fault injection hooks let tests
//! exercise write failures and dropped subscriptions.

pub mod auth;
pub mod document_store;
pub mod error;
pub mod snapshot;

pub use auth::MemoryAuth;
pub use document_store::{CreateGate, MemoryDocumentStore};
pub use error::StoreError;
pub use snapshot::{load_snapshot_from_path, save_snapshot_to_path, StoreSnapshot};
