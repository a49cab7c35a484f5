pub mod error;
pub mod lru;
pub mod pool;

pub use error::BufferPoolError;
pub use lru::LruCache;
pub use pool::{BufferPool, DEFAULT_LOCK_TIMEOUT};
