// Burrow Database Engine
//
// Storage and concurrency core: heap files of slotted pages behind a
// bounded LRU page cache, guarded by strict two-phase page locking with a
// no-steal dirty-page policy.

pub mod catalog;
pub mod common;
pub mod database;
pub mod query;
pub mod storage;
pub mod transaction;

// Re-export key items for convenient access
pub use catalog::{Catalog, CatalogError};
pub use common::types::{PAGE_SIZE, PageId, Permission, TableId, TransactionId};
pub use database::Database;
pub use query::executor::operators::Operator;
pub use query::executor::operators::agg::{AggregateOp, Aggregator, GroupBy};
pub use query::executor::operators::scan::SeqScan;
pub use query::executor::result::{QueryError, QueryResult};
pub use storage::buffer::{BufferPool, BufferPoolError, LruCache};
pub use storage::disk::{HeapFile, HeapFileError};
pub use storage::page::{HeapPage, PageError, PagePtr};
pub use storage::tuple::{Field, FieldType, RecordId, Tuple};
pub use transaction::concurrency::LockTable;
