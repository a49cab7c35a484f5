use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::common::types::{PAGE_SIZE, PageId, Permission, TableId, TransactionId};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::lru::LruCache;
use crate::storage::page::{HeapPage, PageError, PagePtr};
use crate::storage::tuple::{RecordId, Tuple};
use crate::transaction::concurrency::LockTable;

/// Default bound on how long a page fetch waits for a contended lock
/// before the transaction is told to abort.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Bounded page cache mediating every access to the heap files. A fetch
/// first acquires the matching page lock, then serves the page from the
/// cache or loads it from disk, evicting the oldest clean page when full.
/// Dirty pages belong to their uncommitted transaction and are never
/// written back early (no-steal): commit flushes them, abort drops them.
pub struct BufferPool {
    capacity: usize,
    cache: Mutex<LruCache<PageId, PagePtr>>,
    lock_table: LockTable,
    catalog: Arc<Catalog>,
    lock_timeout: Duration,
}

impl BufferPool {
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self::with_lock_timeout(capacity, catalog, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(
        capacity: usize,
        catalog: Arc<Catalog>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            capacity,
            cache: Mutex::new(LruCache::new(capacity)),
            lock_table: LockTable::new(),
            catalog,
            lock_timeout,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch a page on behalf of a transaction. Blocks up to the
    /// configured timeout while the lock is contended; a timeout surfaces
    /// as `LockTimeout` and the caller must abort the transaction.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> Result<PagePtr, BufferPoolError> {
        if !self
            .lock_table
            .acquire_timeout(tid, pid, perm, self.lock_timeout)
        {
            warn!(
                "transaction {} timed out waiting for {:?} on {}",
                tid, perm, pid
            );
            return Err(BufferPoolError::LockTimeout { tid, pid, perm });
        }

        // Lookup, eviction and load happen under one cache lock so two
        // transactions cannot load the same page twice.
        let mut cache = self.cache.lock();
        if let Some(page) = cache.get(&pid) {
            return Ok(page.clone());
        }

        if cache.len() >= self.capacity {
            self.evict_clean(&mut cache)?;
        }

        let file = self
            .catalog
            .file(pid.table_id)
            .ok_or(BufferPoolError::UnknownTable(pid.table_id))?;
        let mut buf = [0u8; PAGE_SIZE];
        file.read_page(pid.page_no, &mut buf)?;

        let page: PagePtr = Arc::new(RwLock::new(HeapPage::from_bytes(pid, buf)));
        cache.put(pid, page.clone());
        Ok(page)
    }

    /// True when the transaction holds any lock on the page.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_table.holds_lock(tid, pid)
    }

    /// Insert a tuple into the first page of the table with room,
    /// extending the file with a fresh page when every page is full. The
    /// affected page is fetched exclusively and marked dirty.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &Tuple,
    ) -> Result<RecordId, BufferPoolError> {
        let file = self
            .catalog
            .file(table_id)
            .ok_or(BufferPoolError::UnknownTable(table_id))?;

        for page_no in 0..file.num_pages()? {
            let pid = PageId::new(table_id, page_no);
            if let Some(rid) = self.try_insert_on(tid, pid, tuple)? {
                return Ok(rid);
            }
        }

        // Every existing page is full; extend the file
        let page_no = file.allocate_page()?;
        let pid = PageId::new(table_id, page_no);
        match self.try_insert_on(tid, pid, tuple)? {
            Some(rid) => Ok(rid),
            // Too large for even an empty page
            None => Err(BufferPoolError::Page(PageError::InsufficientSpace)),
        }
    }

    fn try_insert_on(
        &self,
        tid: TransactionId,
        pid: PageId,
        tuple: &Tuple,
    ) -> Result<Option<RecordId>, BufferPoolError> {
        let page = self.get_page(tid, pid, Permission::Exclusive)?;
        let mut guard = page.write();
        match guard.insert_tuple(tuple) {
            Ok(slot) => {
                guard.mark_dirty(tid);
                Ok(Some(RecordId { page: pid, slot }))
            }
            Err(PageError::InsufficientSpace) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the tuple at a record id. The page is fetched exclusively
    /// and marked dirty.
    pub fn delete_tuple(&self, tid: TransactionId, rid: RecordId) -> Result<(), BufferPoolError> {
        let page = self.get_page(tid, rid.page, Permission::Exclusive)?;
        let mut guard = page.write();
        guard.delete_slot(rid.slot)?;
        guard.mark_dirty(tid);
        Ok(())
    }

    /// Write a cached dirty page back to its heap file and mark it clean.
    /// A page that is absent or already clean is left alone.
    pub fn flush_page(&self, pid: PageId) -> Result<(), BufferPoolError> {
        let cache = self.cache.lock();
        if let Some(page) = cache.peek(&pid) {
            self.write_back(pid, page)?;
        }
        Ok(())
    }

    /// Flush every dirty page in the cache.
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let cache = self.cache.lock();
        for (pid, page) in cache.iter_lru() {
            self.write_back(*pid, page)?;
        }
        Ok(())
    }

    /// Finish a transaction: flush the pages it dirtied on commit, discard
    /// them on abort so the next fetch rereads the persisted version. Its
    /// locks are released afterward in both cases, even when a flush
    /// failed, and completing a transaction that holds nothing is safe.
    pub fn transaction_complete(
        &self,
        tid: TransactionId,
        commit: bool,
    ) -> Result<(), BufferPoolError> {
        let result = if commit {
            self.flush_dirty(tid)
        } else {
            self.discard_dirty(tid);
            Ok(())
        };
        self.lock_table.release_all(tid);
        result
    }

    /// Remove the least recently used clean page. Dirty pages stay cached
    /// until their transaction resolves (no-steal), so a cache full of
    /// dirty pages cannot make room.
    fn evict_clean(&self, cache: &mut LruCache<PageId, PagePtr>) -> Result<(), BufferPoolError> {
        let victim = cache
            .iter_lru()
            .find(|(_, page)| !page.read().is_dirty())
            .map(|(pid, _)| *pid);

        match victim {
            Some(pid) => {
                cache.remove(&pid);
                debug!("evicted clean page {}", pid);
                Ok(())
            }
            None => {
                warn!("buffer pool exhausted: all {} pages dirty", cache.len());
                Err(BufferPoolError::PoolExhausted)
            }
        }
    }

    fn write_back(&self, pid: PageId, page: &PagePtr) -> Result<(), BufferPoolError> {
        let mut guard = page.write();
        if !guard.is_dirty() {
            return Ok(());
        }
        let file = self
            .catalog
            .file(pid.table_id)
            .ok_or(BufferPoolError::UnknownTable(pid.table_id))?;
        file.write_page(pid.page_no, guard.data())?;
        guard.clear_dirty();
        Ok(())
    }

    fn flush_dirty(&self, tid: TransactionId) -> Result<(), BufferPoolError> {
        let cache = self.cache.lock();
        let mut first_err = None;
        for (pid, page) in cache.iter_lru() {
            if page.read().dirtied_by() == Some(tid) {
                if let Err(e) = self.write_back(*pid, page) {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn discard_dirty(&self, tid: TransactionId) {
        let mut cache = self.cache.lock();
        let doomed: Vec<PageId> = cache
            .iter_lru()
            .filter(|(_, page)| page.read().dirtied_by() == Some(tid))
            .map(|(pid, _)| *pid)
            .collect();
        for pid in doomed {
            cache.remove(&pid);
            debug!("discarded page {} dirtied by aborted transaction {}", pid, tid);
        }
    }
}
