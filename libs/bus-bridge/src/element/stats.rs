// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of an element's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Buffers handed to the render hook and published.
    pub rendered: u64,
    /// Buffers dropped as degraded (no endpoint, hook unset, bad stamp).
    pub dropped: u64,
    /// Buffers produced into the pipeline (source role).
    pub produced: u64,
    /// Successful offset samples.
    pub offset_samples: u64,
    /// Activations that fell back to a zero offset.
    pub degraded_samples: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    rendered: AtomicU64,
    dropped: AtomicU64,
    produced: AtomicU64,
    offset_samples: AtomicU64,
    degraded_samples: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_rendered(&self) {
        self.rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_offset_sample(&self) {
        self.offset_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_degraded_sample(&self) {
        self.degraded_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            rendered: self.rendered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            produced: self.produced.load(Ordering::Relaxed),
            offset_samples: self.offset_samples.load(Ordering::Relaxed),
            degraded_samples: self.degraded_samples.load(Ordering::Relaxed),
        }
    }
}
