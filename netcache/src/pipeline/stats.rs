//! Per-pipeline traffic counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    static_hits: AtomicU64,
    learned_hits: AtomicU64,
    forwarded: AtomicU64,
    relayed: AtomicU64,
    learned: AtomicU64,
    not_found: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// requests answered from a static rule
    pub static_hits: u64,
    /// requests answered from a learned slot
    pub learned_hits: u64,
    /// requests sent on to the server
    pub forwarded: u64,
    /// server responses passed back to clients
    pub relayed: u64,
    /// found responses written into the learned cache
    pub learned: u64,
    /// not-found responses
    pub not_found: u64,
    /// datagrams dropped for any reason
    pub dropped: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_static_hit(&self) {
        self.static_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_learned_hit(&self) {
        self.learned_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forward(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relay(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_learned(&self) {
        self.learned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            static_hits: self.static_hits.load(Ordering::Relaxed),
            learned_hits: self.learned_hits.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            relayed: self.relayed.load(Ordering::Relaxed),
            learned: self.learned.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    pub fn hits(&self) -> u64 {
        self.static_hits + self.learned_hits
    }

    /// Share of requests answered without the server, 0.0 when idle.
    pub fn hit_ratio(&self) -> f64 {
        let requests = self.hits() + self.forwarded;
        if requests == 0 {
            0.0
        } else {
            self.hits() as f64 / requests as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "static hits: {}, learned hits: {}, forwarded: {}, relayed: {}, learned: {}, not found: {}, dropped: {}, hit ratio: {:.1}%",
            self.static_hits,
            self.learned_hits,
            self.forwarded,
            self.relayed,
            self.learned,
            self.not_found,
            self.dropped,
            self.hit_ratio() * 100.0
        )
    }
}
