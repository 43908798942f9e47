// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::{BusClock, Clock, ClockType};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Explicitly driven clock.
///
/// Time only moves when `set_ns` / `advance_ns` are called, which makes
/// offsets and translated stamps exact. Usable on either side of the bridge;
/// on the bus side it declares `clock_type`.
pub struct ManualClock {
    now_ns: AtomicI64,
    available: AtomicBool,
    reads: AtomicU64,
    clock_type: ClockType,
    description: String,
}

impl ManualClock {
    pub fn new(start_ns: i64) -> Self {
        Self::with_clock_type(start_ns, ClockType::RosTime)
    }

    pub fn with_clock_type(start_ns: i64, clock_type: ClockType) -> Self {
        Self {
            now_ns: AtomicI64::new(start_ns),
            available: AtomicBool::new(true),
            reads: AtomicU64::new(0),
            clock_type,
            description: "Manual Clock".to_string(),
        }
    }

    pub fn set_ns(&self, now_ns: i64) {
        self.now_ns.store(now_ns, Ordering::SeqCst);
    }

    pub fn advance_ns(&self, delta_ns: i64) {
        self.now_ns.fetch_add(delta_ns, Ordering::SeqCst);
    }

    /// While unavailable, `now_ns()` returns `None`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `now_ns()` calls so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> Option<i64> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.now_ns.load(Ordering::SeqCst))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl BusClock for ManualClock {
    fn clock_type(&self) -> ClockType {
        self.clock_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_when_driven() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_ns(), Some(1_000));
        assert_eq!(clock.now_ns(), Some(1_000));

        clock.advance_ns(500);
        assert_eq!(clock.now_ns(), Some(1_500));

        clock.set_ns(42);
        assert_eq!(clock.now_ns(), Some(42));
        assert_eq!(clock.read_count(), 4);
    }

    #[test]
    fn test_unavailable_clock_reads_none() {
        let clock = ManualClock::new(7);
        clock.set_available(false);
        assert_eq!(clock.now_ns(), None);
        clock.set_available(true);
        assert_eq!(clock.now_ns(), Some(7));
    }
}
