//! Decode outcome counters
//!
//! Written by the receiver thread, read by anyone holding the session.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::Decoded;

/// Lock-free counters of decode outcomes
#[derive(Debug, Default)]
pub struct DecodeStats {
    accepted: AtomicU64,
    malformed: AtomicU64,
    unrecognized: AtomicU64,
}

/// Point-in-time copy of [`DecodeStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStatsSnapshot {
    /// Datagrams that yielded at least one record
    pub accepted: u64,
    /// Datagrams of a known format that failed to parse
    pub malformed: u64,
    /// Datagrams matching no format
    pub unrecognized: u64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one decode outcome
    pub fn record(&self, decoded: &Decoded) {
        let counter = match decoded {
            Decoded::Malformed(_) => &self.malformed,
            Decoded::Unrecognized => &self.unrecognized,
            _ => &self.accepted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DecodeStatsSnapshot {
        DecodeStatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.accepted.store(0, Ordering::Relaxed);
        self.malformed.store(0, Ordering::Relaxed);
        self.unrecognized.store(0, Ordering::Relaxed);
    }
}

impl DecodeStatsSnapshot {
    /// Total datagrams seen
    pub fn total(&self) -> u64 {
        self.accepted + self.malformed + self.unrecognized
    }
}
