//! Table registry: every heap file known to the process, addressable by
//! name or by the table id stamped into page identifiers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use thiserror::Error;

use crate::common::types::TableId;
use crate::storage::disk::{HeapFile, HeapFileError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("table {0:?} is already registered")]
    DuplicateTable(String),
    #[error("heap file error: {0}")]
    HeapFile(#[from] HeapFileError),
}

pub struct Catalog {
    files: RwLock<HashMap<TableId, Arc<HeapFile>>>,
    names: RwLock<HashMap<String, TableId>>,
    /// Counter for assigning unique table IDs
    next_table_id: AtomicU32,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            next_table_id: AtomicU32::new(1),
        }
    }

    /// Open (or create) a table's backing file and assign it the next free
    /// id. Ids stay stable for the process lifetime and are distinct per
    /// backing file; duplicate names are rejected.
    pub fn register_table(
        &self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<TableId, CatalogError> {
        let mut names = self.names.write();
        if names.contains_key(name) {
            return Err(CatalogError::DuplicateTable(name.to_string()));
        }

        let table_id = self.next_table_id.fetch_add(1, Ordering::SeqCst);
        let file = Arc::new(HeapFile::open(path, table_id)?);
        self.files.write().insert(table_id, file);
        names.insert(name.to_string(), table_id);
        Ok(table_id)
    }

    pub fn file(&self, table_id: TableId) -> Option<Arc<HeapFile>> {
        self.files.read().get(&table_id).cloned()
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.names.read().get(name).copied()
    }

    pub fn tables(&self) -> Vec<(String, TableId)> {
        self.names
            .read()
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect()
    }
}
