// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Buffer timestamp translation between the pipeline and bus time domains.
//!
//! `bus_time = pts + base_time + offset`, computed per buffer on the
//! streaming thread. No smoothing is applied: jitter in the sampled offset
//! shows up unchanged in every stamp of that activation.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::clocks::{ClockOffset, ClockType};
use crate::error::{BridgeError, Result};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Absolute time in the bus domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusTime {
    pub nanos: i64,
    pub clock_type: ClockType,
}

impl BusTime {
    pub fn new(nanos: i64, clock_type: ClockType) -> Self {
        Self { nanos, clock_type }
    }

    /// Whole seconds, floored (header `sec` field).
    pub fn sec(&self) -> i64 {
        self.nanos.div_euclid(NANOS_PER_SEC)
    }

    /// Sub-second remainder, always in `0..1e9` (header `nanosec` field).
    pub fn nanosec(&self) -> u32 {
        self.nanos.rem_euclid(NANOS_PER_SEC) as u32
    }
}

/// Pipeline-relative PTS to bus time. Exact integer arithmetic; overflow
/// is reported as `RenderDegraded` rather than wrapped.
pub fn translate(
    pts: u64,
    base_time: u64,
    offset: ClockOffset,
    clock_type: ClockType,
) -> Result<BusTime> {
    let nanos = i64::try_from(pts)
        .ok()
        .zip(i64::try_from(base_time).ok())
        .and_then(|(pts, base_time)| pts.checked_add(base_time))
        .and_then(|pipeline_time| pipeline_time.checked_add(offset.as_nanos()))
        .ok_or_else(|| {
            BridgeError::RenderDegraded(format!(
                "timestamp overflow translating pts {} (base {}, offset {})",
                pts, base_time, offset
            ))
        })?;
    Ok(BusTime::new(nanos, clock_type))
}

/// Bus time back to a pipeline-relative PTS. Stamps older than the
/// pipeline's base time clamp to zero.
pub fn to_pipeline_pts(stamp: BusTime, base_time: u64, offset: ClockOffset) -> u64 {
    let pts = i128::from(stamp.nanos) - i128::from(base_time) - i128::from(offset.as_nanos());
    u64::try_from(pts.max(0)).unwrap_or(u64::MAX)
}

/// Per-element timing state read on the streaming thread.
///
/// The base time and offset are written on the state-change thread and
/// read lock-free per buffer.
#[derive(Debug, Default)]
pub struct TimestampTranslator {
    base_time_ns: AtomicU64,
    offset_ns: AtomicI64,
}

impl TimestampTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_base_time(&self, base_time_ns: u64) {
        self.base_time_ns.store(base_time_ns, Ordering::Release);
    }

    pub fn base_time(&self) -> u64 {
        self.base_time_ns.load(Ordering::Acquire)
    }

    pub fn set_offset(&self, offset: ClockOffset) {
        self.offset_ns.store(offset.as_nanos(), Ordering::Release);
    }

    pub fn offset(&self) -> ClockOffset {
        ClockOffset::from_nanos(self.offset_ns.load(Ordering::Acquire))
    }

    pub fn to_bus(&self, pts: u64, clock_type: ClockType) -> Result<BusTime> {
        translate(pts, self.base_time(), self.offset(), clock_type)
    }

    pub fn to_pipeline(&self, stamp: BusTime) -> u64 {
        to_pipeline_pts(stamp, self.base_time(), self.offset())
    }
}
