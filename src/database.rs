use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::info;

use crate::catalog::{Catalog, CatalogError};
use crate::common::types::{TableId, TransactionId};
use crate::query::executor::operators::scan::SeqScan;
use crate::storage::buffer::{BufferPool, BufferPoolError, DEFAULT_LOCK_TIMEOUT};

/// Everything a caller needs to work with stored tables: the catalog, the
/// buffer pool, and transaction ids. Constructed once and handed around
/// by reference instead of living in process-global state.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    /// Next transaction ID to assign
    next_txn_id: AtomicU64,
}

impl Database {
    pub fn new(pool_capacity: usize) -> Self {
        Self::with_lock_timeout(pool_capacity, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(pool_capacity: usize, lock_timeout: Duration) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::with_lock_timeout(
            pool_capacity,
            catalog.clone(),
            lock_timeout,
        ));
        info!(
            "database started: buffer pool capacity {} pages",
            pool_capacity
        );
        Self {
            catalog,
            buffer_pool,
            next_txn_id: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn register_table(
        &self,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<TableId, CatalogError> {
        self.catalog.register_table(name, path)
    }

    /// Hand out a fresh transaction id.
    pub fn begin_transaction(&self) -> TransactionId {
        TransactionId::new(self.next_txn_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Commit: persist every page the transaction dirtied, then release
    /// its locks.
    pub fn commit(&self, tid: TransactionId) -> Result<(), BufferPoolError> {
        self.buffer_pool.transaction_complete(tid, true)
    }

    /// Abort: discard every page the transaction dirtied, then release its
    /// locks. Safe to call for a transaction that touched nothing.
    pub fn abort(&self, tid: TransactionId) -> Result<(), BufferPoolError> {
        self.buffer_pool.transaction_complete(tid, false)
    }

    /// Sequential scan over a table, fetching pages through the buffer
    /// pool under the transaction's shared locks.
    pub fn scan(&self, tid: TransactionId, table_id: TableId) -> Result<SeqScan, BufferPoolError> {
        let file = self
            .catalog
            .file(table_id)
            .ok_or(BufferPoolError::UnknownTable(table_id))?;
        Ok(SeqScan::new(file, self.buffer_pool.clone(), tid))
    }
}
