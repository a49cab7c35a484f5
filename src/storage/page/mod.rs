pub mod error;
pub mod header;
pub mod heap_page;
pub mod layout;

pub use error::PageError;
pub use header::PageHeader;
pub use heap_page::HeapPage;

use std::sync::Arc;

use parking_lot::RwLock;

/// Shared handle to a cached page
pub type PagePtr = Arc<RwLock<HeapPage>>;
