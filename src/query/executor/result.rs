// Query-layer result and error types.

use thiserror::Error;

use crate::storage::buffer::BufferPoolError;
use crate::storage::disk::HeapFileError;
use crate::storage::page::PageError;
use crate::storage::tuple::FieldType;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("buffer pool error: {0}")]
    Buffer(#[from] BufferPoolError),
    #[error("heap file error: {0}")]
    HeapFile(#[from] HeapFileError),
    #[error("page error: {0}")]
    Page(#[from] PageError),
    #[error("tuple has no field {0}")]
    FieldOutOfRange(usize),
    #[error("group-by field is {found:?} but was declared {declared:?}")]
    GroupTypeMismatch {
        declared: FieldType,
        found: FieldType,
    },
    #[error("aggregate requires an integer input field")]
    IntegerAggregateRequired,
    #[error("iterator is not open")]
    IteratorNotOpen,
}

impl QueryError {
    /// True when the underlying condition requires aborting the
    /// transaction rather than surfacing a plain fault.
    pub fn is_transaction_abort(&self) -> bool {
        matches!(self, QueryError::Buffer(e) if e.is_transaction_abort())
    }
}

/// Result type for query operations
pub type QueryResult<T> = std::result::Result<T, QueryError>;
