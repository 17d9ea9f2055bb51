//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by session workers.
#[derive(Debug, Default)]
pub struct DispatchStats {
    packets_dispatched: AtomicU64,
    packets_unhandled: AtomicU64,
    packets_discarded: AtomicU64,
    decode_failures: AtomicU64,
    batch_failures: AtomicU64,
    sessions_skipped: AtomicU64,
}

/// A point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Packets that reached a handler chain.
    pub packets_dispatched: u64,
    /// Packets no handler claimed.
    pub packets_unhandled: u64,
    pub packets_discarded: u64,
    /// Packets dropped because their header or body failed to decode.
    pub decode_failures: u64,
    /// Transport payloads that could not be split into packets.
    pub batch_failures: u64,
    /// Sessions passed over because their previous work was still running.
    pub sessions_skipped: u64,
}

impl DispatchStats {
    pub fn packet_dispatched(&self) {
        self.packets_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_unhandled(&self) {
        self.packets_unhandled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_discarded(&self) {
        self.packets_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_failed(&self) {
        self.batch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_skipped(&self) {
        self.sessions_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_dispatched: self.packets_dispatched.load(Ordering::Relaxed),
            packets_unhandled: self.packets_unhandled.load(Ordering::Relaxed),
            packets_discarded: self.packets_discarded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            sessions_skipped: self.sessions_skipped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = DispatchStats::default();
        stats.packet_dispatched();
        stats.packet_dispatched();
        stats.packet_unhandled();
        stats.batch_failed();
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                packets_dispatched: 2,
                packets_unhandled: 1,
                batch_failures: 1,
                ..Default::default()
            }
        );
    }
}
