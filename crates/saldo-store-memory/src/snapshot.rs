//! JSON persistence for the in-memory document store.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use saldo_core::{Document, Fields};

use crate::{MemoryDocumentStore, StoreError};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<StoredDocument>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

impl StoreSnapshot {
    pub(crate) fn from_collections(collections: &BTreeMap<String, Vec<Document>>) -> Self {
        let collections = collections
            .iter()
            .map(|(name, documents)| {
                let stored = documents
                    .iter()
                    .map(|document| StoredDocument {
                        id: document.id.clone(),
                        fields: document.fields.clone(),
                    })
                    .collect();
                (name.clone(), stored)
            })
            .collect();
        Self { collections }
    }

    pub(crate) fn into_collections(self) -> BTreeMap<String, Vec<Document>> {
        self.collections
            .into_iter()
            .map(|(name, documents)| {
                let documents = documents
                    .into_iter()
                    .map(|stored| Document::new(stored.id, stored.fields))
                    .collect();
                (name, documents)
            })
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

/// Writes the store contents to `path`, replacing any previous file.
pub fn save_snapshot_to_path(store: &MemoryDocumentStore, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(&store.snapshot())?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Builds a store from a file written by [`save_snapshot_to_path`].
pub fn load_snapshot_from_path(path: &Path) -> Result<MemoryDocumentStore, StoreError> {
    let data = fs::read_to_string(path)?;
    let snapshot: StoreSnapshot = serde_json::from_str(&data)?;
    Ok(MemoryDocumentStore::from_snapshot(snapshot))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), StoreError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}
