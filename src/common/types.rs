use std::fmt;

/// Page size in bytes (8KB)
pub const PAGE_SIZE: usize = 8192;

/// Table identifier, assigned by the catalog at registration
pub type TableId = u32;

/// Identifies one fixed-size page: the owning table plus the zero-based
/// page number within that table's heap file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        Self { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {} page {}", self.table_id, self.page_no)
    }
}

/// Identifier of one unit of work, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lock intent passed with every page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read-only access, compatible with other shared holders
    Shared,
    /// Read-write access, incompatible with every other lock
    Exclusive,
}
