//! Pool and transmission metrics
//!
//! Atomic counters describing how the packet pool is used. A factory owns one
//! `PoolMetrics` behind an `Arc`; hand the `Arc` to a reporting task to read
//! it from another thread.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for one packet factory
#[derive(Debug)]
pub struct PoolMetrics {
    /// Packets allocated because the pool was empty (or prewarmed)
    pub allocated: AtomicU64,
    /// Packets handed out by `acquire`
    pub acquired: AtomicU64,
    /// Packets returned by `retire`
    pub retired: AtomicU64,
    /// Successful merges
    pub merged: AtomicU64,
    /// Packets produced by `clone_packet`
    pub cloned: AtomicU64,
    /// Packets written to a transport
    pub sent: AtomicU64,
    /// Bytes written to a transport
    pub bytes_sent: AtomicU64,
    /// Failed decrypt attempts
    pub decrypt_failures: AtomicU64,
    start_time: Instant,
}

/// Point-in-time copy of [`PoolMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub allocated: u64,
    pub acquired: u64,
    pub retired: u64,
    pub merged: u64,
    pub cloned: u64,
    pub sent: u64,
    pub bytes_sent: u64,
    pub decrypt_failures: u64,
    pub uptime_secs: u64,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self {
            allocated: AtomicU64::new(0),
            acquired: AtomicU64::new(0),
            retired: AtomicU64::new(0),
            merged: AtomicU64::new(0),
            cloned: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            decrypt_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn packet_allocated(&self) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_retired(&self) {
        self.retired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_merged(&self) {
        self.merged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_cloned(&self) {
        self.cloned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet handed to a transport
    pub fn packet_sent(&self, byte_count: u64) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn decrypt_failed(&self) {
        self.decrypt_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Packets currently held by callers (acquired and not yet retired)
    pub fn in_use(&self) -> u64 {
        let acquired = self.acquired.load(Ordering::Relaxed);
        acquired.saturating_sub(self.retired.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            allocated: self.allocated.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            retired: self.retired.load(Ordering::Relaxed),
            merged: self.merged.load(Ordering::Relaxed),
            cloned: self.cloned.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            decrypt_failures: self.decrypt_failures.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Emit the current counters as one structured log event
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            allocated = s.allocated,
            acquired = s.acquired,
            retired = s.retired,
            in_use = self.in_use(),
            merged = s.merged,
            cloned = s.cloned,
            sent = s.sent,
            bytes_sent = s.bytes_sent,
            decrypt_failures = s.decrypt_failures,
            uptime_secs = s.uptime_secs,
            "Packet pool metrics"
        );
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}
