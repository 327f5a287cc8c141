//! Failed-authentication throttling.
//!
//! Tracks failed auth attempts per client host. A host that reaches the
//! allowed-attempts threshold within one window is blocked until the window
//! lapses. Windows expire lazily — the next check or failure after expiry
//! sees a fresh window — and a periodic [`sweep`](ThrottleTracker::sweep)
//! evicts lapsed entries so the map stays bounded.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-host failure record.
#[derive(Debug, Clone, Copy)]
struct ThrottleEntry {
    /// Failures recorded in the current window.
    failures: u32,
    /// Start of the current window (first failure after a reset).
    window_start: Instant,
}

impl ThrottleEntry {
    /// A window that has lasted exactly its full length counts as lapsed.
    fn lapsed(&self, window: Duration) -> bool {
        self.window_start.elapsed() >= window
    }
}

/// Tracks failed authentication attempts per client host.
///
/// Shared by every connection handler; all access goes through one
/// tracker-wide lock. Operations are constant-time map lookups and never
/// block beyond lock acquisition.
pub struct ThrottleTracker {
    entries: RwLock<HashMap<String, ThrottleEntry>>,
    max_attempts: u32,
    window: Duration,
}

impl ThrottleTracker {
    /// Creates a tracker allowing `max_attempts` failures per `window`.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_attempts,
            window,
        }
    }

    /// Returns true if the client has exhausted its allowed attempts within
    /// the active window.
    ///
    /// Pure check: never mutates tracker state. An absent or lapsed entry
    /// reads as zero failures.
    pub fn is_throttled(&self, client: &str) -> bool {
        let entries = self.entries.read();
        match entries.get(client) {
            Some(entry) if !entry.lapsed(self.window) => entry.failures >= self.max_attempts,
            _ => false,
        }
    }

    /// Records one failed attempt for the client.
    ///
    /// Starts a fresh window if no entry exists or the existing window has
    /// lapsed; otherwise increments the count in place.
    pub fn failed_attempt(&self, client: &str) {
        let mut entries = self.entries.write();
        match entries.get_mut(client) {
            Some(entry) if !entry.lapsed(self.window) => entry.failures += 1,
            _ => {
                entries.insert(
                    client.to_string(),
                    ThrottleEntry {
                        failures: 1,
                        window_start: Instant::now(),
                    },
                );
            }
        }
    }

    /// Evicts entries whose window has lapsed.
    ///
    /// Keeps memory bounded on long-running servers; the contracts of
    /// [`is_throttled`](Self::is_throttled) and
    /// [`failed_attempt`](Self::failed_attempt) are unchanged by eviction
    /// since a lapsed entry already reads as absent.
    pub fn sweep(&self) {
        let mut entries = self.entries.write();
        entries.retain(|_, entry| !entry.lapsed(self.window));
    }

    /// Number of hosts currently tracked.
    pub fn tracked(&self) -> usize {
        self.entries.read().len()
    }

    #[cfg(test)]
    fn failures(&self, client: &str) -> u32 {
        self.entries
            .read()
            .get(client)
            .map(|e| e.failures)
            .unwrap_or(0)
    }
}
