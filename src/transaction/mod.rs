// Transaction management: strict two-phase page locking. Locks are only
// acquired until a transaction completes; commit and abort release them
// all at once through the buffer pool.

pub mod concurrency;

// Public exports
pub use concurrency::{Lock, LockTable};
