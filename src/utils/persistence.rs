use std::path::{Path, PathBuf};

use saldo_config::Config;
use saldo_store_memory::{
    load_snapshot_from_path, save_snapshot_to_path, MemoryDocumentStore, StoreError,
};

const STORE_FILE: &str = "store.json";

/// Location of the local document store snapshot for `config`.
pub fn store_snapshot_path(config: &Config) -> PathBuf {
    config.resolve_data_dir().join(STORE_FILE)
}

/// Opens the local document store at `path`, starting empty when no
/// snapshot was written yet.
pub fn open_local_store(path: &Path) -> Result<MemoryDocumentStore, StoreError> {
    if path.exists() {
        let store = load_snapshot_from_path(path)?;
        tracing::debug!(path = %path.display(), "local store loaded");
        Ok(store)
    } else {
        Ok(MemoryDocumentStore::new())
    }
}

/// Writes the local document store to disk atomically.
pub fn persist_local_store(store: &MemoryDocumentStore, path: &Path) -> Result<(), StoreError> {
    save_snapshot_to_path(store, path)?;
    tracing::debug!(path = %path.display(), "local store saved");
    Ok(())
}
