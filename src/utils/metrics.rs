//! Observability and Metrics
//!
//! Atomic counters for monitoring the ingestion pipeline. Because every
//! rejection is silent on the wire, these counters (plus tracing) are
//! the only place drops are visible at all; each [`DropReason`] gets its
//! own counter so a spike in, say, `bad_signature` stands out from a
//! spike in `timeout`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::error::DropReason;

/// Metrics collector shared by the accept loop and all sessions.
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted
    pub connections_total: AtomicU64,
    /// Currently active sessions
    pub connections_active: AtomicU64,
    /// Packets that passed verification
    pub packets_accepted: AtomicU64,
    /// Replies written
    pub replies_sent: AtomicU64,
    /// Total bytes read off sockets
    pub bytes_received: AtomicU64,
    /// Total bytes written to sockets
    pub bytes_sent: AtomicU64,

    drops_truncated: AtomicU64,
    drops_malformed: AtomicU64,
    drops_trailing_bytes: AtomicU64,
    drops_unsigned: AtomicU64,
    drops_malformed_key: AtomicU64,
    drops_malformed_signature: AtomicU64,
    drops_bad_signature: AtomicU64,
    drops_untrusted: AtomicU64,
    drops_oversize: AtomicU64,
    drops_timeout: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            packets_accepted: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            drops_truncated: AtomicU64::new(0),
            drops_malformed: AtomicU64::new(0),
            drops_trailing_bytes: AtomicU64::new(0),
            drops_unsigned: AtomicU64::new(0),
            drops_malformed_key: AtomicU64::new(0),
            drops_malformed_signature: AtomicU64::new(0),
            drops_bad_signature: AtomicU64::new(0),
            drops_untrusted: AtomicU64::new(0),
            drops_oversize: AtomicU64::new(0),
            drops_timeout: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn connection_established(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn connections_active(&self) -> u64 {
        self.connections_active.load(Ordering::Relaxed)
    }

    pub fn packet_accepted(&self) {
        self.packets_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_sent(&self, bytes: u64) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_drop(&self, reason: DropReason) {
        self.drop_counter(reason).fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for one drop reason.
    pub fn drops(&self, reason: DropReason) -> u64 {
        self.drop_counter(reason).load(Ordering::Relaxed)
    }

    /// Total drops across all reasons.
    pub fn drops_total(&self) -> u64 {
        ALL_REASONS.iter().map(|&r| self.drops(r)).sum()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Emit a one-line summary, used at shutdown.
    pub fn log_summary(&self) {
        info!(
            uptime_secs = self.uptime_secs(),
            connections = self.connections_total.load(Ordering::Relaxed),
            accepted = self.packets_accepted.load(Ordering::Relaxed),
            replies = self.replies_sent.load(Ordering::Relaxed),
            dropped = self.drops_total(),
            bytes_in = self.bytes_received.load(Ordering::Relaxed),
            bytes_out = self.bytes_sent.load(Ordering::Relaxed),
            "metrics summary"
        );
        for &reason in ALL_REASONS {
            let count = self.drops(reason);
            if count > 0 {
                info!(reason = reason.as_str(), count, "drops by reason");
            }
        }
    }

    fn drop_counter(&self, reason: DropReason) -> &AtomicU64 {
        match reason {
            DropReason::Truncated => &self.drops_truncated,
            DropReason::Malformed => &self.drops_malformed,
            DropReason::TrailingBytes => &self.drops_trailing_bytes,
            DropReason::Unsigned => &self.drops_unsigned,
            DropReason::MalformedKey => &self.drops_malformed_key,
            DropReason::MalformedSignature => &self.drops_malformed_signature,
            DropReason::BadSignature => &self.drops_bad_signature,
            DropReason::Untrusted => &self.drops_untrusted,
            DropReason::Oversize => &self.drops_oversize,
            DropReason::Timeout => &self.drops_timeout,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

const ALL_REASONS: &[DropReason] = &[
    DropReason::Truncated,
    DropReason::Malformed,
    DropReason::TrailingBytes,
    DropReason::Unsigned,
    DropReason::MalformedKey,
    DropReason::MalformedSignature,
    DropReason::BadSignature,
    DropReason::Untrusted,
    DropReason::Oversize,
    DropReason::Timeout,
];
