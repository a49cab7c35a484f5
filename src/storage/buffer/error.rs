use thiserror::Error;

use crate::common::types::{PageId, Permission, TableId, TransactionId};
use crate::storage::disk::HeapFileError;
use crate::storage::page::PageError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("transaction {tid} timed out waiting for a {perm:?} lock on {pid}")]
    LockTimeout {
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    },
    #[error("every cached page is dirty; nothing can be evicted under no-steal")]
    PoolExhausted,
    #[error("unknown table {0}")]
    UnknownTable(TableId),
    #[error("heap file error: {0}")]
    HeapFile(#[from] HeapFileError),
    #[error("page error: {0}")]
    Page(#[from] PageError),
}

impl BufferPoolError {
    /// True for the error kinds that require the caller to abort the
    /// transaction (and then call `transaction_complete` with commit =
    /// false) rather than retry or surface a fault.
    pub fn is_transaction_abort(&self) -> bool {
        matches!(self, BufferPoolError::LockTimeout { .. })
    }
}
