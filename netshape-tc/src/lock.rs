//! Per-interface mutual exclusion.
//!
//! The qdisc table is shared and unsynchronized: two command sequences targeting the same
//! interface can interleave and leave it in a mixed state. [`InterfaceLocks`] serializes them,
//! while sequences on different interfaces proceed independently.
//!
//! Entries only live while an interface is locked or awaited, so the registry doesn't grow with
//! every interface name it has ever seen.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// A registry of one mutex per interface name.
#[derive(Debug, Default)]
pub struct InterfaceLocks {
    locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl InterfaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock of `interface`.
    pub fn with<T>(&self, interface: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.get(interface);
        let result = {
            let _guard = lock.lock();
            f()
        };
        self.release(interface, lock);
        result
    }

    /// Number of interfaces currently locked or waited on.
    pub fn active(&self) -> usize {
        self.locks.lock().len()
    }

    fn get(&self, interface: &str) -> Arc<Mutex<()>> {
        // The registry lock is released before the interface lock is taken.
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(interface.to_owned()).or_default())
    }

    /// Drops the entry of `interface` once the registry holds its only reference. Clones are
    /// only handed out under the registry lock, so the count can't grow while it is checked.
    fn release(&self, interface: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        drop(lock);

        if locks.get(interface).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(interface);
        }
    }
}
