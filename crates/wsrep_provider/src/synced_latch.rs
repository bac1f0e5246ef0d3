use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// The three states a node's sync status can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Has not yet caught up with the cluster; must not originate writes.
    NotSynced,
    /// Caught up; safe to originate local transactions.
    Synced,
    /// Lost contact with the provider; master workers must stop.
    Disconnected,
}

/// A tri-state latch master workers block on before originating
/// transactions, and which the provider adapter's `synced`/disconnect
/// handling flips.
///
/// Mirrors the shape of a cancellation flag with a condvar, generalized
/// from two states to three so "not yet synced" and "disconnected" are
/// distinguishable (a worker that wakes on disconnect must not loop back
/// into waiting, unlike one that simply hasn't synced yet).
pub struct SyncedLatch {
    state: Mutex<SyncState>,
    condvar: Condvar,
}

impl Default for SyncedLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncedLatch {
    /// A latch starting in `NotSynced`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SyncState::NotSynced),
            condvar: Condvar::new(),
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Flips the latch to `Synced` and wakes every waiter.
    pub fn signal_synced(&self) {
        let mut guard = self.state.lock();
        *guard = SyncState::Synced;
        self.condvar.notify_all();
    }

    /// Flips the latch to `Disconnected` and wakes every waiter. This is
    /// what releases master workers from a blocking wait when the provider
    /// disconnects.
    pub fn signal_disconnected(&self) {
        let mut guard = self.state.lock();
        *guard = SyncState::Disconnected;
        self.condvar.notify_all();
    }

    /// Resets the latch to `NotSynced`, e.g. after a reconnect begins.
    pub fn reset(&self) {
        let mut guard = self.state.lock();
        *guard = SyncState::NotSynced;
    }

    /// Blocks until the latch is `Synced` or `Disconnected`, returning the
    /// state observed.
    pub fn wait_synced(&self) -> SyncState {
        let mut guard = self.state.lock();
        while *guard == SyncState::NotSynced {
            self.condvar.wait(&mut guard);
        }
        *guard
    }

    /// Like [`SyncedLatch::wait_synced`] but gives up after `timeout`,
    /// returning `None` if still `NotSynced`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<SyncState> {
        let mut guard = self.state.lock();
        while *guard == SyncState::NotSynced {
            let result = self.condvar.wait_for(&mut guard, timeout);
            if result.timed_out() {
                return if *guard == SyncState::NotSynced {
                    None
                } else {
                    Some(*guard)
                };
            }
        }
        Some(*guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_not_synced() {
        let latch = SyncedLatch::new();
        assert_eq!(latch.state(), SyncState::NotSynced);
    }

    #[test]
    fn signal_synced_wakes_waiter() {
        let latch = Arc::new(SyncedLatch::new());
        let waiter = {
            let latch = latch.clone();
            thread::spawn(move || latch.wait_synced())
        };
        thread::sleep(Duration::from_millis(20));
        latch.signal_synced();
        assert_eq!(waiter.join().unwrap(), SyncState::Synced);
    }

    #[test]
    fn signal_disconnected_wakes_waiter() {
        let latch = Arc::new(SyncedLatch::new());
        let waiter = {
            let latch = latch.clone();
            thread::spawn(move || latch.wait_synced())
        };
        thread::sleep(Duration::from_millis(20));
        latch.signal_disconnected();
        assert_eq!(waiter.join().unwrap(), SyncState::Disconnected);
    }

    #[test]
    fn wait_timeout_returns_none_when_unsignaled() {
        let latch = SyncedLatch::new();
        assert_eq!(latch.wait_timeout(Duration::from_millis(10)), None);
    }
}
