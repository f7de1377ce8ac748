use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tracing::debug;
use uuid::Uuid;

use saldo_core::{Document, DocumentStore, Fields, RemoteError, SnapshotEvent, SnapshotStream};

use crate::snapshot::StoreSnapshot;

/// Document store held entirely in memory.
///
/// Clones share the same data, so one clone can be handed to the services
/// while a test keeps another to inspect documents or inject faults.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, Vec<Document>>,
    listeners: Vec<Listener>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    create: Option<RemoteError>,
    merge: Option<RemoteError>,
    listen: Option<RemoteError>,
    create_gate: Option<Arc<Semaphore>>,
}

struct Listener {
    collection: String,
    field: String,
    value: Value,
    sender: mpsc::UnboundedSender<SnapshotEvent>,
}

impl Listener {
    fn matches(&self, document: &Document) -> bool {
        document.fields.get(&self.field) == Some(&self.value)
    }
}

/// Holds back `create` calls until released, so callers can observe state
/// while a write is in flight.
#[derive(Clone)]
pub struct CreateGate {
    permits: Arc<Semaphore>,
}

impl CreateGate {
    /// Lets one pending (or future) `create` call proceed.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        store.lock().collections = snapshot.into_collections();
        store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::from_collections(&self.lock().collections)
    }

    /// Documents currently stored in `collection`, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live queries still attached.
    pub fn listener_count(&self) -> usize {
        let mut inner = self.lock();
        inner.listeners.retain(|listener| !listener.sender.is_closed());
        inner.listeners.len()
    }

    pub fn fail_next_create(&self, err: RemoteError) {
        self.lock().faults.create = Some(err);
    }

    pub fn fail_next_merge(&self, err: RemoteError) {
        self.lock().faults.merge = Some(err);
    }

    pub fn fail_next_listen(&self, err: RemoteError) {
        self.lock().faults.listen = Some(err);
    }

    /// Makes every following `create` wait for [`CreateGate::release`].
    pub fn pause_creates(&self) -> CreateGate {
        let permits = Arc::new(Semaphore::new(0));
        self.lock().faults.create_gate = Some(permits.clone());
        CreateGate { permits }
    }

    pub fn resume_creates(&self) {
        if let Some(gate) = self.lock().faults.create_gate.take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    /// Sends `err` to every live query and detaches them.
    pub fn disconnect_listeners(&self, err: RemoteError) {
        let listeners = std::mem::take(&mut self.lock().listeners);
        for listener in listeners {
            let _ = listener.sender.send(Err(err.clone()));
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Pushes a fresh snapshot to every listener on `collection`, dropping
    /// listeners whose stream was closed.
    fn publish(&mut self, collection: &str) {
        let Inner {
            collections,
            listeners,
            ..
        } = self;
        let documents = collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);
        listeners.retain(|listener| {
            if listener.collection != collection {
                return !listener.sender.is_closed();
            }
            let snapshot = documents
                .iter()
                .filter(|document| listener.matches(document))
                .cloned()
                .collect();
            listener.sender.send(Ok(snapshot)).is_ok()
        });
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, RemoteError> {
        let gate = self.lock().faults.create_gate.clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|_| RemoteError::Network("write cancelled".into()))?
                .forget();
        }

        let mut inner = self.lock();
        if let Some(err) = inner.faults.create.take() {
            return Err(err);
        }
        let id = Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        inner.publish(collection);
        debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
        Ok(self
            .lock()
            .collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| document.id == id))
            .cloned())
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, RemoteError> {
        Ok(self
            .lock()
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| document.fields.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn listen(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<SnapshotStream, RemoteError> {
        let mut inner = self.lock();
        if let Some(err) = inner.faults.listen.take() {
            return Err(err);
        }
        let (sender, stream) = SnapshotStream::channel();
        let listener = Listener {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.clone(),
            sender,
        };
        let initial = inner
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| listener.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let _ = listener.sender.send(Ok(initial));
        inner.listeners.push(listener);
        debug!(collection, field, "live query attached");
        Ok(stream)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        if let Some(err) = inner.faults.merge.take() {
            return Err(err);
        }
        let documents = inner.collections.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|document| document.id == id) {
            Some(existing) => existing.fields.extend(fields),
            None => documents.push(Document::new(id, fields)),
        }
        inner.publish(collection);
        Ok(())
    }
}
