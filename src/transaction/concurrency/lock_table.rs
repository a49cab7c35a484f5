use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::{Condvar, Mutex};

use crate::common::types::{PageId, Permission, TransactionId};

/// One granted page lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub tid: TransactionId,
    pub perm: Permission,
}

/// Tracks which transactions hold which page locks. A page holds either
/// any number of shared locks from distinct transactions or exactly one
/// exclusive lock; a transaction never holds more than one entry per page
/// (an upgrade replaces the entry in place).
///
/// Every grant decision runs under one mutex covering the whole table, so
/// two acquirers can never both observe an unlocked page and proceed.
pub struct LockTable {
    locks: Mutex<HashMap<PageId, Vec<Lock>>>,
    released: Condvar,
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }

    /// Non-blocking acquire. Returns true when the lock is granted: newly
    /// recorded, upgraded in place, or already held with sufficient
    /// permission.
    pub fn try_acquire(&self, tid: TransactionId, pid: PageId, perm: Permission) -> bool {
        let mut locks = self.locks.lock();
        Self::grant(&mut locks, tid, pid, perm)
    }

    /// Blocking acquire: wait for conflicting locks to be released, up to
    /// `timeout`. Waiters wake in no particular order — there is no FIFO
    /// fairness, so a starved waiter eventually times out and its
    /// transaction must abort.
    pub fn acquire_timeout(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let mut locks = self.locks.lock();
        loop {
            if Self::grant(&mut locks, tid, pid, perm) {
                return true;
            }
            if self.released.wait_until(&mut locks, deadline).timed_out() {
                // A release can land right at the deadline; decide on the
                // table state, not on the wakeup reason.
                return Self::grant(&mut locks, tid, pid, perm);
            }
        }
    }

    fn grant(
        locks: &mut HashMap<PageId, Vec<Lock>>,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> bool {
        let Some(holders) = locks.get_mut(&pid) else {
            locks.insert(pid, vec![Lock { tid, perm }]);
            return true;
        };

        if holders.len() == 1 {
            if holders[0].tid == tid {
                if holders[0].perm == Permission::Shared && perm == Permission::Exclusive {
                    // Shared held, exclusive requested: upgrade in place
                    holders[0].perm = Permission::Exclusive;
                }
                return true;
            }
            if holders[0].perm == Permission::Shared && perm == Permission::Shared {
                holders.push(Lock { tid, perm });
                return true;
            }
            return false;
        }

        // Several holders: all shared, all distinct transactions
        if perm == Permission::Exclusive {
            return false;
        }
        if holders.iter().any(|lock| lock.tid == tid) {
            return true;
        }
        holders.push(Lock {
            tid,
            perm: Permission::Shared,
        });
        true
    }

    /// True when any lock recorded for the page belongs to the transaction.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.locks
            .lock()
            .get(&pid)
            .is_some_and(|holders| holders.iter().any(|lock| lock.tid == tid))
    }

    /// Release the transaction's lock on one page. A page with no holders
    /// left is dropped from the table immediately; releasing a lock that
    /// is not held is a no-op.
    pub fn release(&self, tid: TransactionId, pid: PageId) {
        let mut locks = self.locks.lock();
        if Self::remove_holder(&mut locks, tid, pid) {
            self.released.notify_all();
        }
    }

    /// Release every lock the transaction holds.
    pub fn release_all(&self, tid: TransactionId) {
        let mut locks = self.locks.lock();
        let mut any_released = false;
        locks.retain(|_, holders| {
            let before = holders.len();
            holders.retain(|lock| lock.tid != tid);
            any_released |= holders.len() != before;
            !holders.is_empty()
        });
        if any_released {
            debug!("released all locks held by transaction {}", tid);
            self.released.notify_all();
        }
    }

    fn remove_holder(
        locks: &mut HashMap<PageId, Vec<Lock>>,
        tid: TransactionId,
        pid: PageId,
    ) -> bool {
        let Some(holders) = locks.get_mut(&pid) else {
            return false;
        };
        let before = holders.len();
        holders.retain(|lock| lock.tid != tid);
        let removed = holders.len() != before;
        if holders.is_empty() {
            locks.remove(&pid);
        }
        removed
    }
}
